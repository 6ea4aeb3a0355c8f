//! The reviewer agent: one engine call, one verdict, posted back to the PR.

use mendbot_core::error::Error;
use mendbot_core::host::IssueHost;
use mendbot_core::message::{Conversation, Message};
use mendbot_engine::StructuredClient;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

const APPROVED_LABEL: &str = "approved";
const CHANGES_LABEL: &str = "changes-needed";
const CI_RESULTS_FILE: &str = "ci_results.txt";
const MAX_DIFF_CHARS: usize = 20_000;
const DIFF_TRUNCATED_NOTE: &str = "... (diff truncated)";

/// The engine's review decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReviewStatus {
    Approved,
    ChangesRequested,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Approved => "APPROVED",
            ReviewStatus::ChangesRequested => "CHANGES_REQUESTED",
        }
    }
}

/// One file-level finding inside a review.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewFinding {
    pub file_path: String,
    pub line_number: Option<u64>,
    pub comment: String,
}

/// A complete review of one pull request.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewVerdict {
    pub status: ReviewStatus,
    pub summary: String,
    pub findings: Vec<ReviewFinding>,
}

impl ReviewVerdict {
    /// Decodes the engine's answer. Anything other than an explicit
    /// `"APPROVED"` status requests changes; missing fields get defaults.
    fn decode(raw: &serde_json::Value) -> Self {
        let status = if raw["status"].as_str() == Some("APPROVED") {
            ReviewStatus::Approved
        } else {
            ReviewStatus::ChangesRequested
        };
        let summary = raw["summary"]
            .as_str()
            .unwrap_or("No summary provided.")
            .to_string();
        let findings = raw["review_details"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .map(|item| ReviewFinding {
                        file_path: item["file_path"].as_str().unwrap_or("unknown").to_string(),
                        line_number: item["line_number"].as_u64(),
                        comment: item["comment"].as_str().unwrap_or("").to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            status,
            summary,
            findings,
        }
    }

    /// Renders the verdict as the comment posted on the pull request.
    fn to_comment(&self) -> String {
        let mut body = format!(
            "## AI Review\n\n**Verdict:** {}\n\n{}",
            self.status.as_str(),
            self.summary
        );
        if !self.findings.is_empty() {
            body.push_str("\n\n**Findings:**\n");
            for finding in &self.findings {
                match finding.line_number {
                    Some(line) => {
                        body.push_str(&format!(
                            "- `{}:{line}`: {}\n",
                            finding.file_path, finding.comment
                        ));
                    }
                    None => {
                        body.push_str(&format!("- `{}`: {}\n", finding.file_path, finding.comment));
                    }
                }
            }
        }
        body
    }
}

fn reviewer_prompt() -> String {
    "You are mendbot's code reviewer. You are given a pull request with its \
     description, CI results, and diff. Judge whether the change is correct, \
     tested, and safe to merge.\n\n\
     Answer with a single JSON object and nothing else:\n\
     {\"status\": \"APPROVED\" or \"CHANGES_REQUESTED\", \"summary\": \"<overall assessment>\", \
     \"review_details\": [{\"file_path\": \"...\", \"line_number\": <number or null>, \"comment\": \"...\"}]}"
        .to_string()
}

fn cap_chars(text: &str, max: usize, note: &str) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max).collect();
    format!("{head}\n{note}")
}

/// Reviews one pull request and posts the verdict back to the host.
pub struct ReviewerAgent {
    client: StructuredClient,
    host: Arc<dyn IssueHost>,
    /// Where `ci_results.txt` is looked for.
    workspace: PathBuf,
}

impl ReviewerAgent {
    pub fn new(
        client: StructuredClient,
        host: Arc<dyn IssueHost>,
        workspace: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            host,
            workspace: workspace.into(),
        }
    }

    async fn ci_results(&self) -> String {
        match tokio::fs::read_to_string(self.workspace.join(CI_RESULTS_FILE)).await {
            Ok(content) => content,
            Err(_) => "No CI results found.".to_string(),
        }
    }

    /// Reviews `pr_number`: builds context, asks the engine for a verdict,
    /// posts the `## AI Review` comment, and swaps the status labels.
    pub async fn review(&self, pr_number: u64) -> Result<ReviewVerdict, Error> {
        let pull = self.host.get_pull(pr_number).await?;
        let files = self.host.list_pull_files(pr_number).await?;

        let mut diff = String::new();
        for file in &files {
            diff.push_str(&format!("File: {}\n", file.filename));
            if let Some(patch) = &file.patch {
                diff.push_str(&format!("```diff\n{patch}\n```\n"));
            }
            diff.push('\n');
        }
        let diff = cap_chars(&diff, MAX_DIFF_CHARS, DIFF_TRUNCATED_NOTE);

        let ci = self.ci_results().await;

        let mut conversation = Conversation::new();
        conversation.push(Message::system(reviewer_prompt()));
        conversation.push(Message::user(format!(
            "PULL REQUEST #{pr_number}: {}\n\nDESCRIPTION:\n{}\n\nCI RESULTS:\n{ci}\n\nDIFF:\n{diff}",
            pull.title, pull.body
        )));

        let raw = match self.client.ask(&conversation).await {
            Ok(value) => value,
            Err(e) => {
                error!(pr = pr_number, error = %e, "Reviewer engine failed, no review posted");
                return Err(e.into());
            }
        };

        let verdict = ReviewVerdict::decode(&raw);
        info!(
            pr = pr_number,
            status = verdict.status.as_str(),
            findings = verdict.findings.len(),
            "Review complete"
        );

        self.host.add_comment(pr_number, &verdict.to_comment()).await?;

        match verdict.status {
            ReviewStatus::Approved => {
                self.host.remove_label(pr_number, CHANGES_LABEL).await?;
                self.host.add_labels(pr_number, &[APPROVED_LABEL]).await?;
            }
            ReviewStatus::ChangesRequested => {
                self.host.remove_label(pr_number, APPROVED_LABEL).await?;
                self.host.add_labels(pr_number, &[CHANGES_LABEL]).await?;
            }
        }

        Ok(verdict)
    }
}
