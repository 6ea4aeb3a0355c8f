//! File read tool.

use async_trait::async_trait;

use mendbot_core::error::ToolError;
use mendbot_core::tool::{Tool, ToolName, ToolResult};

pub struct FileReadTool;

#[async_trait]
impl Tool for FileReadTool {
    fn name(&self) -> ToolName {
        ToolName::ReadFile
    }

    fn description(&self) -> &str {
        "Read the full content of a file. Arg: path."
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let path = arguments["path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'path' argument".into()))?;

        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(ToolResult::ok(content)),
            Err(e) => Ok(ToolResult::failed(format!(
                "Error reading file '{path}': {e}"
            ))),
        }
    }
}
