//! Prompt assembly for the developer agent.
//!
//! The system prompt pins the JSON answer shape and the tool vocabulary.
//! The first user message carries the ticket, an initial file listing, and
//! the literal content of every file the ticket references with `@path`
//! syntax, so the engine starts with the context a human would open first.

use regex_lite::Regex;
use std::path::Path;
use tracing::debug;

/// Marker above the inlined `@file` contents in the first user message.
pub const CONTEXT_FILES_MARKER: &str = "--- Context Files ---";

/// Builds the fixed system instruction, embedding the registered tool list.
pub fn system_prompt(tool_listing: &str) -> String {
    format!(
        "You are mendbot, an autonomous software developer. You are given one \
         issue from a project's tracker and you fix it end to end: inspect the \
         project, edit files, run the tests, and open a pull request.\n\n\
         Answer every message with a single JSON object and nothing else:\n\
         {{\"thought\": \"<your reasoning>\", \"tool\": \"<tool name>\", \"args\": {{<named arguments>}}}}\n\n\
         Available tools:\n{tool_listing}\n\n\
         Rules:\n\
         - Inspect before you edit. Read the files involved before writing changes.\n\
         - write_file replaces the whole file. Always send the complete new content.\n\
         - Run the test suite after editing and fix what breaks.\n\
         - When the fix is verified, call open_pull_request with a clear commit \
         message, title, and body. That ends the run."
    )
}

/// Extracts `@path` file references from a ticket body.
///
/// A reference is an `@` followed by a relative path with an extension, e.g.
/// `@src/payments.rs` or `@config.yaml`. Order is preserved, duplicates
/// dropped.
pub fn find_file_references(text: &str) -> Vec<String> {
    let pattern = Regex::new(r"@([\w./-]+\.\w+)").expect("reference pattern is valid");
    let mut seen = Vec::new();
    for capture in pattern.captures_iter(text) {
        let path = capture[1].to_string();
        if !seen.contains(&path) {
            seen.push(path);
        }
    }
    seen
}

/// Reads every `@file` reference in `body`, returning one formatted block.
///
/// Missing or unreadable files are skipped; the engine can still ask for
/// them with `read_file` if it wants an error message to reason about.
pub async fn load_context_files(workspace: &Path, body: &str) -> String {
    let mut blocks = String::new();
    for reference in find_file_references(body) {
        match tokio::fs::read_to_string(workspace.join(&reference)).await {
            Ok(content) => {
                blocks.push_str(&format!("\nFile: {reference}\n{content}\n"));
            }
            Err(e) => {
                debug!(path = %reference, error = %e, "Skipping unreadable context file");
            }
        }
    }

    if blocks.is_empty() {
        String::new()
    } else {
        format!("\n\n{CONTEXT_FILES_MARKER}\n{blocks}")
    }
}

/// Builds the first user message: ticket, project files, context files.
pub fn initial_message(title: &str, body: &str, listing: &str, context_blocks: &str) -> String {
    format!(
        "TASK: {title}\n\nDESCRIPTION:\n{body}\n\nPROJECT FILES:\n{listing}{context_blocks}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_embeds_tool_listing() {
        let prompt = system_prompt("- read_file: Read a file");
        assert!(prompt.contains("- read_file: Read a file"));
        assert!(prompt.contains("\"thought\""));
        assert!(prompt.contains("\"tool\""));
    }

    #[test]
    fn finds_file_references_in_ticket_body() {
        let body = "The bug is in @src/payments.rs, config in @config.yaml. See @src/payments.rs again.";
        assert_eq!(
            find_file_references(body),
            vec!["src/payments.rs".to_string(), "config.yaml".to_string()]
        );
    }

    #[test]
    fn plain_mentions_are_not_references() {
        assert!(find_file_references("ping @alice about the README").is_empty());
    }

    #[tokio::test]
    async fn context_block_embeds_file_content() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("config.yaml"), "retries: 3\n")
            .await
            .unwrap();

        let blocks = load_context_files(dir.path(), "broken per @config.yaml").await;

        assert!(blocks.contains(CONTEXT_FILES_MARKER));
        assert!(blocks.contains("File: config.yaml"));
        assert!(blocks.contains("retries: 3"));
    }

    #[tokio::test]
    async fn missing_context_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let blocks = load_context_files(dir.path(), "see @nope.txt").await;
        assert!(blocks.is_empty());
    }

    #[test]
    fn initial_message_carries_all_sections() {
        let msg = initial_message("Fix refund", "refunds are wrong", "[\"src/lib.rs\"]", "");
        assert!(msg.starts_with("TASK: Fix refund"));
        assert!(msg.contains("DESCRIPTION:\nrefunds are wrong"));
        assert!(msg.contains("PROJECT FILES:\n[\"src/lib.rs\"]"));
    }
}
