//! The terminal pull-request tool: commit, push, then open or update.
//!
//! The branch name is derived from the ticket number, so repeat runs for
//! one ticket land on one branch. If an open pull request already exists
//! for that branch, the tool comments on it instead of opening a duplicate;
//! both paths count as success and end the run.
//!
//! Git plumbing goes through [`CommandExecutor::capture`]: the commands are
//! constructed here, with the only engine-controlled part (the commit
//! message) shell-quoted. The push URL embeds the host token and is
//! redacted before any log line or diagnostic.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use mendbot_core::error::ToolError;
use mendbot_core::host::{IssueHost, NewPullRequest};
use mendbot_core::tool::{Tool, ToolName, ToolResult};
use mendbot_security::redact;

use crate::shell::{CommandExecutor, CommandOutcome};

/// Deterministic branch for a ticket.
pub fn branch_for_issue(issue_number: u64) -> String {
    format!("feature/issue-{issue_number}")
}

/// Commit-and-push seam, so loop tests need no git repository.
#[async_trait]
pub trait WorkTree: Send + Sync {
    /// Commit the whole working tree and push it as `branch`. Errors carry
    /// an already-redacted diagnostic.
    async fn commit_and_push(&self, branch: &str, message: &str) -> Result<(), ToolError>;
}

/// The real git-backed work tree.
pub struct GitWorkTree {
    executor: Arc<CommandExecutor>,
    /// Repository identity as `owner/name`.
    repo: String,
    token: String,
}

impl GitWorkTree {
    pub fn new(executor: Arc<CommandExecutor>, repo: String, token: String) -> Self {
        Self {
            executor,
            repo,
            token,
        }
    }

    fn git_failed(&self, command: &str, detail: String) -> ToolError {
        ToolError::ExecutionFailed {
            tool_name: ToolName::OpenPullRequest.to_string(),
            reason: redact(&format!("'{command}' failed: {detail}"), &self.token),
        }
    }
}

#[async_trait]
impl WorkTree for GitWorkTree {
    async fn commit_and_push(&self, branch: &str, message: &str) -> Result<(), ToolError> {
        let steps = [
            "git config user.name mendbot".to_string(),
            "git config user.email mendbot@users.noreply.github.com".to_string(),
            "git fetch origin".to_string(),
            format!("git checkout -B {branch}"),
            "git add .".to_string(),
            format!("git commit -m {}", shell_quote(message)),
        ];

        for command in &steps {
            let outcome = self
                .executor
                .capture(command)
                .await
                .map_err(|f| self.git_failed(command, f.to_string()))?;
            if !outcome.success() {
                let combined = outcome.combined();
                // a clean tree is not a failure, the branch may already
                // hold the changes from an earlier iteration
                if combined.contains("nothing to commit") {
                    info!(branch, "nothing to commit, continuing");
                    continue;
                }
                return Err(self.git_failed(command, combined));
            }
        }

        let push = format!(
            "git push https://x-access-token:{}@github.com/{}.git {branch}",
            self.token, self.repo
        );
        info!(command = %redact(&push, &self.token), "pushing branch");
        let outcome = self
            .executor
            .capture(&push)
            .await
            .map_err(|f| self.git_failed("git push", f.to_string()))?;
        if !push_succeeded(&outcome) {
            return Err(self.git_failed("git push", outcome.combined()));
        }
        Ok(())
    }
}

/// Git writes progress to stderr and exits nonzero on some benign races;
/// a push that reports the remote ref or an up-to-date branch counts.
fn push_succeeded(outcome: &CommandOutcome) -> bool {
    if outcome.success() {
        return true;
    }
    let combined = outcome.combined();
    combined.contains("Everything up-to-date") || combined.contains("To https")
}

/// POSIX single-quote wrapping for engine-provided text embedded in a
/// command line.
fn shell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}

#[derive(Debug, Deserialize)]
struct OpenPullRequestArgs {
    issue_number: u64,
    commit_message: String,
    pr_title: String,
    #[serde(default)]
    pr_body: String,
}

/// The composite terminal tool.
pub struct OpenPullRequestTool {
    worktree: Arc<dyn WorkTree>,
    host: Arc<dyn IssueHost>,
    /// The `owner` half of the repository identity, for head filters.
    head_owner: String,
    base_branch: String,
}

impl OpenPullRequestTool {
    pub fn new(
        worktree: Arc<dyn WorkTree>,
        host: Arc<dyn IssueHost>,
        head_owner: String,
        base_branch: String,
    ) -> Self {
        Self {
            worktree,
            host,
            head_owner,
            base_branch,
        }
    }
}

#[async_trait]
impl Tool for OpenPullRequestTool {
    fn name(&self) -> ToolName {
        ToolName::OpenPullRequest
    }

    fn description(&self) -> &str {
        "Commit all changes, push a branch, and open the pull request for the issue. \
         Args: commit_message, pr_title, pr_body. Call once, when the fix is verified."
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: OpenPullRequestArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let branch = branch_for_issue(args.issue_number);
        if let Err(e) = self
            .worktree
            .commit_and_push(&branch, &args.commit_message)
            .await
        {
            return Ok(ToolResult::failed(format!("Error: {e}")));
        }

        let head = format!("{}:{}", self.head_owner, branch);
        let existing = match self.host.list_open_pulls(&head).await {
            Ok(pulls) => pulls.into_iter().next(),
            Err(e) => {
                return Ok(ToolResult::failed(format!(
                    "Error: could not check for an existing pull request: {e}"
                )));
            }
        };

        if let Some(pr) = existing {
            let note = format!(
                "Pushed a new update for issue #{} to `{branch}`.",
                args.issue_number
            );
            if let Err(e) = self.host.add_comment(pr.number, &note).await {
                return Ok(ToolResult::failed(format!(
                    "Error: failed to comment on existing pull request #{}: {e}",
                    pr.number
                )));
            }
            info!(pr = pr.number, branch, "updated existing pull request");
            return Ok(ToolResult::ok(format!(
                "SUCCESS: Updated existing pull request: {}",
                pr.html_url
            ))
            .with_data(serde_json::json!({"url": pr.html_url, "updated": true})));
        }

        let new = NewPullRequest {
            title: args.pr_title,
            body: format!("{}\n\nCloses #{}", args.pr_body, args.issue_number),
            head: branch.clone(),
            base: self.base_branch.clone(),
        };
        match self.host.create_pull(new).await {
            Ok(pr) => {
                info!(pr = pr.number, branch, "created pull request");
                Ok(ToolResult::ok(format!(
                    "SUCCESS: Created pull request: {}",
                    pr.html_url
                ))
                .with_data(serde_json::json!({"url": pr.html_url, "updated": false})))
            }
            Err(e) => Ok(ToolResult::failed(format!(
                "Error: failed to create pull request: {e}"
            ))),
        }
    }
}
