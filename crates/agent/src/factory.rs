//! Builds ready-to-run agents from a validated [`AppConfig`].
//!
//! The CLI and the gateway both wire their agents through these functions so
//! the executor policy, engine, and host client are assembled exactly one
//! way.

use mendbot_config::{AppConfig, ConfigError};
use mendbot_core::host::IssueHost;
use mendbot_core::tool::ToolRegistry;
use mendbot_engine::{OpenAiCompatEngine, StructuredClient};
use mendbot_github::GithubClient;
use mendbot_security::CommandPolicy;
use mendbot_tools::{
    CommandExecutor, FileReadTool, FileWriteTool, GitWorkTree, ListFilesTool, OpenPullRequestTool,
    ShellTool,
};
use std::sync::Arc;
use std::time::Duration;

use crate::developer::DeveloperAgent;
use crate::reviewer::ReviewerAgent;

/// The branch pull requests target.
const BASE_BRANCH: &str = "main";

fn structured_client(config: &AppConfig) -> StructuredClient {
    let engine = Arc::new(OpenAiCompatEngine::new(
        &config.engine.base_url,
        config.engine.api_key.clone().unwrap_or_default(),
        &config.engine.model,
    ));
    StructuredClient::new(engine, config.agent.ask_attempts)
}

fn host_client(config: &AppConfig) -> Arc<GithubClient> {
    Arc::new(GithubClient::new(
        &config.github.api_url,
        config.github.repo.clone().unwrap_or_default(),
        config.github.token.clone().unwrap_or_default(),
    ))
}

/// Builds a developer agent working in `workspace`.
///
/// Validates the config first; missing credentials abort here, before any
/// run starts.
pub fn build_developer(
    config: &AppConfig,
    workspace: impl Into<std::path::PathBuf>,
) -> Result<DeveloperAgent, ConfigError> {
    config.validate()?;

    let policy = CommandPolicy::new(
        config.policy.allowed_commands.clone(),
        config.policy.forbidden_patterns.clone(),
    );
    let executor = Arc::new(CommandExecutor::new(
        policy,
        Duration::from_secs(config.policy.timeout_secs),
        config.policy.max_output_chars,
    ));

    let host: Arc<dyn IssueHost> = host_client(config);
    let repo = config.github.repo.clone().unwrap_or_default();
    let token = config.github.token.clone().unwrap_or_default();
    let worktree = Arc::new(GitWorkTree::new(executor.clone(), repo, token));
    let head_owner = config
        .github
        .repo_owner()
        .unwrap_or_default()
        .to_string();

    let mut tools = ToolRegistry::new();
    tools.register(Box::new(ListFilesTool::new(
        config.policy.excluded_dirs.clone(),
        config.policy.max_listing_entries,
    )));
    tools.register(Box::new(FileReadTool));
    tools.register(Box::new(FileWriteTool));
    tools.register(Box::new(ShellTool::new(executor)));
    tools.register(Box::new(OpenPullRequestTool::new(
        worktree,
        host,
        head_owner,
        BASE_BRANCH.to_string(),
    )));

    Ok(DeveloperAgent::new(
        structured_client(config),
        Arc::new(tools),
        ListFilesTool::new(
            config.policy.excluded_dirs.clone(),
            config.policy.max_listing_entries,
        ),
        workspace,
        config.agent.max_iterations,
    ))
}

/// Builds a reviewer agent reading CI results from `workspace`.
pub fn build_reviewer(
    config: &AppConfig,
    workspace: impl Into<std::path::PathBuf>,
) -> Result<ReviewerAgent, ConfigError> {
    config.validate()?;
    Ok(ReviewerAgent::new(
        structured_client(config),
        host_client(config),
        workspace,
    ))
}

/// Builds the host client alone, for callers that talk to the host outside
/// an agent run (e.g. fetching the ticket before starting one).
pub fn build_host(config: &AppConfig) -> Result<Arc<GithubClient>, ConfigError> {
    config.validate()?;
    Ok(host_client(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.github.token = Some("ghp_test".to_string());
        config.github.repo = Some("octo/fixture".to_string());
        config.engine.api_key = Some("sk-test".to_string());
        config
    }

    #[test]
    fn builds_from_complete_config() {
        assert!(build_developer(&full_config(), ".").is_ok());
        assert!(build_reviewer(&full_config(), ".").is_ok());
    }

    #[test]
    fn missing_credential_aborts_assembly() {
        let mut config = full_config();
        config.engine.api_key = None;
        assert!(build_developer(&config, ".").is_err());
        assert!(build_reviewer(&config, ".").is_err());
    }
}
