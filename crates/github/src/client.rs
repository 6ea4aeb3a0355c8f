//! GitHub REST API v3 client.
//!
//! Implements [`IssueHost`] against `api.github.com` (or a GitHub Enterprise
//! base URL). Every call authenticates with a bearer token and speaks the
//! `application/vnd.github+json` media type.

use async_trait::async_trait;
use mendbot_core::error::HostError;
use mendbot_core::host::{Issue, IssueHost, NewPullRequest, PullFile, PullRequest};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const API_VERSION: &str = "2022-11-28";

/// Client for one repository on a GitHub-compatible host.
pub struct GithubClient {
    api_url: String,
    /// `owner/name` slug.
    repo: String,
    token: String,
    client: reqwest::Client,
}

impl GithubClient {
    /// Creates a client for `repo` (an `owner/name` slug) on `api_url`,
    /// typically `https://api.github.com`.
    pub fn new(api_url: impl Into<String>, repo: impl Into<String>, token: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            repo: repo.into(),
            token: token.into(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}", self.api_url, self.repo, path)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", "mendbot")
    }

    /// Sends a request and maps non-success statuses to [`HostError`].
    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<reqwest::Response, HostError> {
        let response = builder
            .send()
            .await
            .map_err(|e| HostError::Network(e.to_string()))?;

        let status = response.status();

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(HostError::AuthenticationFailed(
                "Invalid token or insufficient permissions".to_string(),
            ));
        }

        if status.as_u16() == 404 {
            return Err(HostError::NotFound(context.to_string()));
        }

        if status.as_u16() == 429 {
            return Err(HostError::RateLimited { retry_after_secs: 60 });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, context, "GitHub returned error");
            return Err(HostError::ApiError {
                status_code: status.as_u16(),
                message: body,
            });
        }

        Ok(response)
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, HostError> {
        let status = response.status().as_u16();
        response.json::<T>().await.map_err(|e| HostError::ApiError {
            status_code: status,
            message: format!("Failed to parse response: {e}"),
        })
    }
}

#[async_trait]
impl IssueHost for GithubClient {
    async fn get_issue(&self, number: u64) -> Result<Issue, HostError> {
        let url = self.url(&format!("issues/{number}"));
        debug!(%url, "Fetching issue");
        let response = self
            .send(self.request(reqwest::Method::GET, &url), &format!("issue #{number}"))
            .await?;
        Self::parse(response).await
    }

    async fn list_open_pulls(&self, head: &str) -> Result<Vec<PullRequest>, HostError> {
        let url = format!("{}?state=open&head={}", self.url("pulls"), head);
        debug!(%url, "Listing open pull requests");
        let response = self
            .send(self.request(reqwest::Method::GET, &url), "open pull requests")
            .await?;
        let pulls: Vec<ApiPull> = Self::parse(response).await?;
        Ok(pulls.into_iter().map(ApiPull::into_pull_request).collect())
    }

    async fn create_pull(&self, new: NewPullRequest) -> Result<PullRequest, HostError> {
        let url = self.url("pulls");
        debug!(%url, title = %new.title, head = %new.head, "Creating pull request");
        let body = serde_json::json!({
            "title": new.title,
            "body": new.body,
            "head": new.head,
            "base": new.base,
        });
        let response = self
            .send(
                self.request(reqwest::Method::POST, &url).json(&body),
                "pull request creation",
            )
            .await?;
        let pull: ApiPull = Self::parse(response).await?;
        Ok(pull.into_pull_request())
    }

    async fn add_comment(&self, issue_number: u64, body: &str) -> Result<(), HostError> {
        let url = self.url(&format!("issues/{issue_number}/comments"));
        debug!(%url, "Adding comment");
        let payload = serde_json::json!({ "body": body });
        self.send(
            self.request(reqwest::Method::POST, &url).json(&payload),
            &format!("comment on #{issue_number}"),
        )
        .await?;
        Ok(())
    }

    async fn get_pull(&self, number: u64) -> Result<PullRequest, HostError> {
        let url = self.url(&format!("pulls/{number}"));
        debug!(%url, "Fetching pull request");
        let response = self
            .send(self.request(reqwest::Method::GET, &url), &format!("pull #{number}"))
            .await?;
        let pull: ApiPull = Self::parse(response).await?;
        Ok(pull.into_pull_request())
    }

    async fn list_pull_files(&self, number: u64) -> Result<Vec<PullFile>, HostError> {
        let url = self.url(&format!("pulls/{number}/files"));
        debug!(%url, "Listing pull request files");
        let response = self
            .send(
                self.request(reqwest::Method::GET, &url),
                &format!("files of pull #{number}"),
            )
            .await?;
        Self::parse(response).await
    }

    async fn add_labels(&self, issue_number: u64, labels: &[&str]) -> Result<(), HostError> {
        let url = self.url(&format!("issues/{issue_number}/labels"));
        debug!(%url, ?labels, "Adding labels");
        let payload = serde_json::json!({ "labels": labels });
        self.send(
            self.request(reqwest::Method::POST, &url).json(&payload),
            &format!("labels on #{issue_number}"),
        )
        .await?;
        Ok(())
    }

    async fn remove_label(&self, issue_number: u64, label: &str) -> Result<(), HostError> {
        let url = self.url(&format!("issues/{issue_number}/labels/{label}"));
        debug!(%url, "Removing label");
        match self
            .send(
                self.request(reqwest::Method::DELETE, &url),
                &format!("label '{label}' on #{issue_number}"),
            )
            .await
        {
            Ok(_) => Ok(()),
            // Removing a label that is not set is not an error.
            Err(HostError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Pull request as GitHub's wire format delivers it.
#[derive(Debug, Deserialize)]
struct ApiPull {
    number: u64,
    title: String,
    body: Option<String>,
    html_url: String,
    head: ApiPullHead,
}

#[derive(Debug, Deserialize)]
struct ApiPullHead {
    #[serde(rename = "ref")]
    head_ref: String,
}

impl ApiPull {
    fn into_pull_request(self) -> PullRequest {
        PullRequest {
            number: self.number,
            title: self.title,
            body: self.body.unwrap_or_default(),
            html_url: self.html_url,
            head_ref: self.head.head_ref,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GithubClient {
        GithubClient::new("https://api.github.com/", "octo/fixture", "ghp_test")
    }

    #[test]
    fn url_builds_repo_scoped_paths() {
        let c = client();
        assert_eq!(
            c.url("issues/42"),
            "https://api.github.com/repos/octo/fixture/issues/42"
        );
        assert_eq!(c.url("pulls"), "https://api.github.com/repos/octo/fixture/pulls");
    }

    #[test]
    fn pull_wire_format_maps_head_ref() {
        let raw = r#"{
            "number": 7,
            "title": "Fix checkout total",
            "body": null,
            "html_url": "https://github.com/octo/fixture/pull/7",
            "head": { "ref": "feature/issue-42", "sha": "abc123" },
            "state": "open"
        }"#;

        let pull: ApiPull = serde_json::from_str(raw).unwrap();
        let pr = pull.into_pull_request();

        assert_eq!(pr.number, 7);
        assert_eq!(pr.body, "");
        assert_eq!(pr.head_ref, "feature/issue-42");
    }

    #[test]
    fn pull_file_parses_with_and_without_patch() {
        let raw = r#"[
            { "filename": "src/lib.rs", "patch": "@@ -1 +1 @@", "status": "modified" },
            { "filename": "logo.png", "status": "added" }
        ]"#;

        let files: Vec<PullFile> = serde_json::from_str(raw).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].patch.is_some());
        assert!(files[1].patch.is_none());
    }
}
