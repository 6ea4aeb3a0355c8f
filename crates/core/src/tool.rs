//! Tool trait — the abstraction over agent capabilities.
//!
//! Tools are what give the agent the ability to act in the world: list and
//! edit files, run commands, open pull requests. The tool vocabulary is a
//! closed enum; free-text names from the engine are parsed at the dispatch
//! boundary and rejected with a diagnostic the engine can read and correct.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::error::ToolError;

/// Every tool the agent can invoke.
///
/// The engine addresses tools by these wire names; anything else is an
/// unknown tool, reported back as a failed observation rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    ListFiles,
    ReadFile,
    WriteFile,
    RunCommand,
    OpenPullRequest,
}

impl ToolName {
    /// All tools, in the order they are presented to the engine.
    pub const ALL: [ToolName; 5] = [
        ToolName::ListFiles,
        ToolName::ReadFile,
        ToolName::WriteFile,
        ToolName::RunCommand,
        ToolName::OpenPullRequest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::ListFiles => "list_files",
            ToolName::ReadFile => "read_file",
            ToolName::WriteFile => "write_file",
            ToolName::RunCommand => "run_command",
            ToolName::OpenPullRequest => "open_pull_request",
        }
    }

    /// Parse a wire name. `None` means the engine invented a tool.
    pub fn parse(name: &str) -> Option<ToolName> {
        Self::ALL.iter().copied().find(|t| t.as_str() == name)
    }

    /// Comma-separated list of every valid wire name, for diagnostics.
    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of a tool execution.
///
/// Dispatch always produces one of these; failures are carried in `output`
/// as text the engine can observe on the next iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool achieved its effect
    pub success: bool,

    /// The observation text fed back to the engine
    pub output: String,

    /// Optional structured data (e.g. the opened PR's URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            data: None,
        }
    }

    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// The core Tool trait.
///
/// Each tool deserializes its own typed argument struct from the raw JSON
/// the engine produced; shape errors surface as
/// [`ToolError::InvalidArguments`] and are rendered at the dispatch boundary.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The name this tool is registered and dispatched under.
    fn name(&self) -> ToolName;

    /// One-line description of what this tool does (shown to the engine).
    fn description(&self) -> &str;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: serde_json::Value) -> std::result::Result<ToolResult, ToolError>;
}

/// A registry of available tools, assembled once per run.
pub struct ToolRegistry {
    tools: HashMap<ToolName, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name(), tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: ToolName) -> Option<&dyn Tool> {
        self.tools.get(&name).map(|t| t.as_ref())
    }

    /// Registered tool names, in presentation order.
    pub fn names(&self) -> Vec<&'static str> {
        ToolName::ALL
            .iter()
            .filter(|t| self.tools.contains_key(t))
            .map(|t| t.as_str())
            .collect()
    }

    /// One `- name: description` line per registered tool, in presentation
    /// order, for embedding in the system prompt.
    pub fn describe(&self) -> String {
        ToolName::ALL
            .iter()
            .filter_map(|t| self.tools.get(t))
            .map(|tool| format!("- {}: {}", tool.name(), tool.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Dispatch one action.
    ///
    /// Never panics and never returns an error: unknown names, invalid
    /// arguments, and execution failures all come back as a failed
    /// [`ToolResult`] whose output tells the engine what went wrong.
    pub async fn dispatch(&self, name: &str, arguments: serde_json::Value) -> ToolResult {
        let Some(tool_name) = ToolName::parse(name) else {
            return ToolResult::failed(format!(
                "Unknown tool '{name}'. Valid tools: {}",
                ToolName::valid_names()
            ));
        };

        let Some(tool) = self.get(tool_name) else {
            return ToolResult::failed(format!(
                "Tool '{tool_name}' is not available in this run. Available tools: {}",
                self.names().join(", ")
            ));
        };

        match tool.execute(arguments).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = %tool_name, error = %e, "tool execution failed");
                ToolResult::failed(format!("Tool error: {e}"))
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A trivial tool for registry tests, registered under `read_file`.
    struct StubRead;

    #[async_trait]
    impl Tool for StubRead {
        fn name(&self) -> ToolName {
            ToolName::ReadFile
        }
        fn description(&self) -> &str {
            "Read a file"
        }
        async fn execute(&self, arguments: serde_json::Value) -> std::result::Result<ToolResult, ToolError> {
            let path = arguments["path"]
                .as_str()
                .ok_or_else(|| ToolError::InvalidArguments("missing 'path'".into()))?;
            Ok(ToolResult::ok(format!("read {path}")))
        }
    }

    #[test]
    fn tool_name_roundtrip() {
        for name in ToolName::ALL {
            assert_eq!(ToolName::parse(name.as_str()), Some(name));
        }
        assert_eq!(ToolName::parse("delete_everything"), None);
    }

    #[tokio::test]
    async fn dispatch_unknown_name_lists_valid_tools() {
        let registry = ToolRegistry::new();
        let result = registry.dispatch("make_coffee", serde_json::json!({})).await;
        assert!(!result.success);
        assert!(result.output.contains("make_coffee"));
        for name in ToolName::ALL {
            assert!(result.output.contains(name.as_str()));
        }
    }

    #[tokio::test]
    async fn dispatch_executes_registered_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(StubRead));

        let result = registry
            .dispatch("read_file", serde_json::json!({"path": "src/lib.rs"}))
            .await;
        assert!(result.success);
        assert_eq!(result.output, "read src/lib.rs");
    }

    #[tokio::test]
    async fn dispatch_renders_invalid_arguments_as_failed_result() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(StubRead));

        let result = registry.dispatch("read_file", serde_json::json!({})).await;
        assert!(!result.success);
        assert!(result.output.contains("path"));
    }

    #[test]
    fn describe_follows_presentation_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(StubRead));
        let listing = registry.describe();
        assert_eq!(listing, "- read_file: Read a file");
    }
}
