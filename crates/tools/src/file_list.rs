//! Directory listing tool — the agent's view of the working tree.
//!
//! Recursive, with hidden and artifact directories filtered out, a hard cap
//! on entries, and deterministic ordering. The output is a JSON array of
//! relative paths so the engine can quote entries back verbatim.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use mendbot_core::error::ToolError;
use mendbot_core::tool::{Tool, ToolName, ToolResult};
use mendbot_security::is_excluded;

/// Appended as the final list entry when the cap cut entries off.
pub const LISTING_TRUNCATED_NOTE: &str = "... (list truncated, narrow the directory)";

pub struct ListFilesTool {
    excluded_dirs: Vec<String>,
    max_entries: usize,
}

impl ListFilesTool {
    pub fn new(excluded_dirs: Vec<String>, max_entries: usize) -> Self {
        Self {
            excluded_dirs,
            max_entries,
        }
    }

    /// Enumerate files under `directory` as sorted relative paths.
    ///
    /// Exposed outside the tool because the first conversation message
    /// carries the same listing.
    pub async fn listing(&self, directory: &str) -> String {
        let root = Path::new(directory);
        if !root.is_dir() {
            return format!("Error: Directory '{directory}' not found");
        }

        let mut files: Vec<String> = Vec::new();
        let mut stack: Vec<PathBuf> = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            let Ok(mut entries) = tokio::fs::read_dir(&dir).await else {
                // unreadable subdirectory, skip it
                continue;
            };
            while let Ok(Some(entry)) = entries.next_entry().await {
                let Ok(file_type) = entry.file_type().await else {
                    continue;
                };
                let path = entry.path();
                let relative = path.strip_prefix(root).unwrap_or(&path);
                if is_excluded(relative, &self.excluded_dirs) {
                    continue;
                }
                if file_type.is_dir() {
                    stack.push(path.clone());
                } else if file_type.is_file() {
                    files.push(relative.to_string_lossy().into_owned());
                }
            }
        }

        files.sort();
        if files.len() > self.max_entries {
            files.truncate(self.max_entries);
            files.push(LISTING_TRUNCATED_NOTE.to_string());
        }

        serde_json::to_string(&files).unwrap_or_else(|_| "[]".to_string())
    }
}

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> ToolName {
        ToolName::ListFiles
    }

    fn description(&self) -> &str {
        "List project files recursively as a JSON array of relative paths. Optional arg: directory."
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let directory = arguments["directory"].as_str().unwrap_or(".");
        let listing = self.listing(directory).await;
        if listing.starts_with("Error:") {
            Ok(ToolResult::failed(listing))
        } else {
            Ok(ToolResult::ok(listing))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_tool() -> ListFilesTool {
        ListFilesTool::new(
            ["target", "node_modules", "dist"].map(String::from).to_vec(),
            50,
        )
    }

    fn seed(dir: &Path, path: &str) {
        let full = dir.join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full, "x").unwrap();
    }

    #[tokio::test]
    async fn lists_files_sorted_and_relative() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), "src/main.rs");
        seed(dir.path(), "Cargo.toml");
        seed(dir.path(), "src/lib.rs");

        let tool = make_tool();
        let listing = tool.listing(dir.path().to_str().unwrap()).await;
        let files: Vec<String> = serde_json::from_str(&listing).unwrap();
        assert_eq!(files, vec!["Cargo.toml", "src/lib.rs", "src/main.rs"]);
    }

    #[tokio::test]
    async fn hidden_and_artifact_dirs_never_appear() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), "src/main.rs");
        seed(dir.path(), ".git/config");
        seed(dir.path(), ".hidden.txt");
        seed(dir.path(), "target/debug/app");
        seed(dir.path(), "web/node_modules/react/index.js");

        let tool = make_tool();
        let listing = tool.listing(dir.path().to_str().unwrap()).await;
        let files: Vec<String> = serde_json::from_str(&listing).unwrap();
        assert_eq!(files, vec!["src/main.rs"]);
    }

    #[tokio::test]
    async fn cap_appends_truncation_note() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..10 {
            seed(dir.path(), &format!("file_{i:02}.rs"));
        }

        let tool = ListFilesTool::new(vec![], 4);
        let listing = tool.listing(dir.path().to_str().unwrap()).await;
        let files: Vec<String> = serde_json::from_str(&listing).unwrap();
        assert_eq!(files.len(), 5);
        assert_eq!(files.last().unwrap(), LISTING_TRUNCATED_NOTE);
        assert_eq!(files[0], "file_00.rs");
    }

    #[tokio::test]
    async fn missing_directory_is_a_diagnostic() {
        let tool = make_tool();
        let result = tool
            .execute(serde_json::json!({"directory": "/no/such/dir"}))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.contains("/no/such/dir"));
    }

    #[tokio::test]
    async fn directory_defaults_to_current() {
        let tool = make_tool();
        // "." always exists; the call must not error even without the arg
        let result = tool.execute(serde_json::json!({})).await.unwrap();
        assert!(result.success);
    }
}
