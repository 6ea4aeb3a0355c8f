//! IssueHost trait — the abstraction over the code-hosting service.
//!
//! The host is where tickets live and where pull requests are opened. Only
//! the handful of operations the agents need are modeled; everything else
//! the REST API offers stays out of the domain.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::HostError;

/// Hosts deliver `null` bodies for empty tickets; treat those as "".
fn null_to_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A ticket the developer agent works on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    #[serde(default, deserialize_with = "null_to_empty")]
    pub body: String,
}

/// An open or merged pull request as the host reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    #[serde(default, deserialize_with = "null_to_empty")]
    pub body: String,
    pub html_url: String,
    /// The source branch name, without the `owner:` qualifier.
    pub head_ref: String,
}

/// A request to open a pull request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPullRequest {
    pub title: String,
    pub body: String,
    /// Source branch name.
    pub head: String,
    /// Target branch name.
    pub base: String,
}

/// One changed file in a pull request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullFile {
    pub filename: String,
    /// Unified diff hunk; absent for binary or oversized files.
    #[serde(default)]
    pub patch: Option<String>,
}

/// The code-hosting service seam.
///
/// One implementation talks to GitHub's REST API; tests swap in scripted
/// fakes. Label operations take issue numbers because the host treats pull
/// requests as issues for comments and labels.
#[async_trait]
pub trait IssueHost: Send + Sync {
    async fn get_issue(&self, number: u64) -> std::result::Result<Issue, HostError>;

    /// Open pull requests whose head is `owner:branch`. Used to keep
    /// repeat runs from opening duplicate PRs.
    async fn list_open_pulls(&self, head: &str) -> std::result::Result<Vec<PullRequest>, HostError>;

    async fn create_pull(&self, new: NewPullRequest) -> std::result::Result<PullRequest, HostError>;

    async fn add_comment(&self, issue_number: u64, body: &str) -> std::result::Result<(), HostError>;

    async fn get_pull(&self, number: u64) -> std::result::Result<PullRequest, HostError>;

    async fn list_pull_files(&self, number: u64) -> std::result::Result<Vec<PullFile>, HostError>;

    async fn add_labels(&self, issue_number: u64, labels: &[&str]) -> std::result::Result<(), HostError>;

    async fn remove_label(&self, issue_number: u64, label: &str) -> std::result::Result<(), HostError>;
}
