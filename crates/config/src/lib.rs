//! Configuration loading, validation, and management for mendbot.
//!
//! Loads configuration from a project-local `mendbot.toml` with environment
//! variable overrides. Required credentials are validated before any run
//! starts; a missing one aborts startup with a message naming the key and
//! the environment variable that would provide it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `mendbot.toml`. Every field has a default except the
/// credentials and the repository identity, which `validate()` enforces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Issue host (GitHub) access
    #[serde(default)]
    pub github: GithubConfig,

    /// Reasoning engine endpoint
    #[serde(default)]
    pub engine: EngineConfig,

    /// Agent loop limits
    #[serde(default)]
    pub agent: AgentConfig,

    /// Command and file-surface policy
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Webhook gateway settings
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Personal access token or installation token. Required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Repository identity as `owner/name`. Required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    #[serde(default = "default_github_api_url")]
    pub api_url: String,
}

fn default_github_api_url() -> String {
    "https://api.github.com".into()
}

impl GithubConfig {
    /// The `owner` half of `owner/name`, once validated.
    pub fn repo_owner(&self) -> Option<&str> {
        self.repo.as_deref().and_then(|r| r.split_once('/')).map(|(owner, _)| owner)
    }
}

impl std::fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConfig")
            .field("token", &redact(&self.token))
            .field("repo", &self.repo)
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine API key. Required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
        }
    }
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Iteration cap before a run is declared exhausted.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Attempts per structured ask before giving up on the engine.
    #[serde(default = "default_ask_attempts")]
    pub ask_attempts: u32,
}

fn default_max_iterations() -> u32 {
    12
}
fn default_ask_attempts() -> u32 {
    3
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            ask_attempts: default_ask_attempts(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Programs the command tool may run (matched on the leading token).
    #[serde(default = "default_allowed_commands")]
    pub allowed_commands: Vec<String>,

    /// Substrings that reject a command outright, checked case-insensitively.
    #[serde(default = "default_forbidden_patterns")]
    pub forbidden_patterns: Vec<String>,

    /// Wall-clock limit for one command.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Per-stream cap on captured command output.
    #[serde(default = "default_max_output_chars")]
    pub max_output_chars: usize,

    /// Cap on entries returned by a directory listing.
    #[serde(default = "default_max_listing_entries")]
    pub max_listing_entries: usize,

    /// Directory names excluded from listings (hidden names always are).
    #[serde(default = "default_excluded_dirs")]
    pub excluded_dirs: Vec<String>,
}

fn default_allowed_commands() -> Vec<String> {
    ["cargo", "ls", "dir", "rustc", "echo", "git"]
        .map(String::from)
        .to_vec()
}
fn default_forbidden_patterns() -> Vec<String> {
    ["rm -rf", "sudo", "env", ">", "/etc/", ".env", "|"]
        .map(String::from)
        .to_vec()
}
fn default_timeout_secs() -> u64 {
    45
}
fn default_max_output_chars() -> usize {
    8000
}
fn default_max_listing_entries() -> usize {
    50
}
fn default_excluded_dirs() -> Vec<String> {
    ["target", "node_modules", "dist", "venv", "__pycache__"]
        .map(String::from)
        .to_vec()
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            allowed_commands: default_allowed_commands(),
            forbidden_patterns: default_forbidden_patterns(),
            timeout_secs: default_timeout_secs(),
            max_output_chars: default_max_output_chars(),
            max_listing_entries: default_max_listing_entries(),
            excluded_dirs: default_excluded_dirs(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared secret for webhook signature verification. Unset skips the
    /// check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_secret: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            webhook_secret: None,
        }
    }
}

impl GatewayConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("webhook_secret", &redact(&self.webhook_secret))
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (`./mendbot.toml`, or the
    /// file named by `MENDBOT_CONFIG`).
    ///
    /// Environment variables override file values:
    /// - `MENDBOT_GITHUB_TOKEN` / `GITHUB_TOKEN`
    /// - `MENDBOT_REPO` / `GITHUB_REPOSITORY`
    /// - `MENDBOT_API_KEY` / `OPENAI_API_KEY`
    /// - `MENDBOT_BASE_URL`, `MENDBOT_MODEL`, `MENDBOT_MAX_ITERATIONS`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var("MENDBOT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("mendbot.toml"));
        let mut config = Self::load_from(&config_path)?;

        if config.github.token.is_none() {
            config.github.token = std::env::var("MENDBOT_GITHUB_TOKEN")
                .ok()
                .or_else(|| std::env::var("GITHUB_TOKEN").ok());
        }
        if config.github.repo.is_none() {
            config.github.repo = std::env::var("MENDBOT_REPO")
                .ok()
                .or_else(|| std::env::var("GITHUB_REPOSITORY").ok());
        }
        if config.engine.api_key.is_none() {
            config.engine.api_key = std::env::var("MENDBOT_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }
        if let Ok(base_url) = std::env::var("MENDBOT_BASE_URL") {
            config.engine.base_url = base_url;
        }
        if let Ok(model) = std::env::var("MENDBOT_MODEL") {
            config.engine.model = model;
        }
        if let Ok(max) = std::env::var("MENDBOT_MAX_ITERATIONS")
            && let Ok(max) = max.parse()
        {
            config.agent.max_iterations = max;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.check_limits()?;
        Ok(config)
    }

    /// Verify every required value is present. Call after `load()`, before
    /// constructing any client; a miss here is fatal for the process.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.github.token.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::missing("github.token", "MENDBOT_GITHUB_TOKEN"));
        }
        match self.github.repo.as_deref() {
            None | Some("") => {
                return Err(ConfigError::missing("github.repo", "MENDBOT_REPO"));
            }
            Some(repo) if !repo.contains('/') => {
                return Err(ConfigError::ValidationError(format!(
                    "github.repo must be owner/name, got '{repo}'"
                )));
            }
            Some(_) => {}
        }
        if self.engine.api_key.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::missing("engine.api_key", "MENDBOT_API_KEY"));
        }
        self.check_limits()
    }

    fn check_limits(&self) -> Result<(), ConfigError> {
        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }
        if self.agent.ask_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "agent.ask_attempts must be at least 1".into(),
            ));
        }
        if self.policy.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "policy.timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Missing required configuration: {key} (set it in mendbot.toml or export {env})")]
    MissingRequired { key: String, env: String },
}

impl ConfigError {
    fn missing(key: &str, env: &str) -> Self {
        Self::MissingRequired {
            key: key.into(),
            env: env.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.github.token = Some("ghp_test".into());
        config.github.repo = Some("acme/widgets".into());
        config.engine.api_key = Some("sk-test".into());
        config
    }

    #[test]
    fn defaults_land_exactly() {
        let config = AppConfig::default();
        assert_eq!(config.engine.base_url, "https://api.openai.com/v1");
        assert_eq!(config.engine.model, "gpt-4o-mini");
        assert_eq!(config.agent.max_iterations, 12);
        assert_eq!(config.agent.ask_attempts, 3);
        assert_eq!(config.policy.timeout_secs, 45);
        assert_eq!(config.policy.max_output_chars, 8000);
        assert_eq!(config.gateway.port, 8000);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = complete_config();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.github.repo, config.github.repo);
        assert_eq!(parsed.engine.model, config.engine.model);
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/mendbot.toml")).unwrap();
        assert_eq!(config.agent.max_iterations, 12);
    }

    #[test]
    fn load_from_reads_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mendbot.toml");
        std::fs::write(
            &path,
            r#"
[github]
repo = "acme/widgets"

[engine]
model = "gpt-4o"

[agent]
max_iterations = 5
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.github.repo.as_deref(), Some("acme/widgets"));
        assert_eq!(config.engine.model, "gpt-4o");
        assert_eq!(config.agent.max_iterations, 5);
        // Untouched sections keep their defaults
        assert_eq!(config.engine.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn validate_names_each_missing_credential() {
        let err = AppConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("github.token"));

        let mut config = AppConfig::default();
        config.github.token = Some("ghp_test".into());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("github.repo"));

        config.github.repo = Some("acme/widgets".into());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("engine.api_key"));

        config.engine.api_key = Some("sk-test".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn repo_without_owner_rejected() {
        let mut config = complete_config();
        config.github.repo = Some("widgets".into());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("owner/name"));
    }

    #[test]
    fn zero_iterations_rejected() {
        let mut config = complete_config();
        config.agent.max_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = complete_config();
        let debug = format!("{config:?}");
        assert!(!debug.contains("ghp_test"));
        assert!(!debug.contains("sk-test"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn repo_owner_splits_identity() {
        let config = complete_config();
        assert_eq!(config.github.repo_owner(), Some("acme"));
    }
}
