//! File write tool — full overwrite, creating parent directories.

use async_trait::async_trait;

use mendbot_core::error::ToolError;
use mendbot_core::tool::{Tool, ToolName, ToolResult};

pub struct FileWriteTool;

#[async_trait]
impl Tool for FileWriteTool {
    fn name(&self) -> ToolName {
        ToolName::WriteFile
    }

    fn description(&self) -> &str {
        "Write content to a file, replacing it entirely. Args: path, content."
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let path = arguments["path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'path' argument".into()))?;

        let content = arguments["content"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'content' argument".into()))?;

        // Ensure parent directory exists
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = tokio::fs::create_dir_all(parent).await
        {
            return Ok(ToolResult::failed(format!(
                "Failed to create directory: {e}"
            )));
        }

        match tokio::fs::write(path, content).await {
            Ok(()) => Ok(ToolResult::ok(format!(
                "Successfully wrote {} bytes to {path}",
                content.len()
            ))),
            Err(e) => Ok(ToolResult::failed(format!("Failed to write file: {e}"))),
        }
    }
}
