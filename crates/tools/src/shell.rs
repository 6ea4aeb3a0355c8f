//! Shell command execution with policy gating, a hard timeout, and output
//! truncation.
//!
//! [`CommandExecutor`] is the single spawn point for every subprocess the
//! agent causes. `run` is the engine-facing entry: both policy gates, then
//! spawn, then a composed observation text that always names the exit
//! status. `capture` is the plumbing entry used by internally constructed
//! commands; it shares the timeout and truncation but not the gates.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tracing::debug;

use mendbot_core::error::ToolError;
use mendbot_core::tool::{Tool, ToolName, ToolResult};
use mendbot_security::CommandPolicy;

/// Prefix kept in front of a tail-truncated stream.
pub const TRUNCATION_MARKER: &str = "[output truncated, tail shown]";

/// Raw result of a completed subprocess.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Both streams joined, for substring checks on git output.
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// A command that never produced an outcome.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RunFailure {
    #[error("Command timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Failed to start command: {reason}")]
    Spawn { reason: String },
}

/// Runs shell commands under the capability policy.
pub struct CommandExecutor {
    policy: CommandPolicy,
    timeout: Duration,
    max_output_chars: usize,
}

impl CommandExecutor {
    pub fn new(policy: CommandPolicy, timeout: Duration, max_output_chars: usize) -> Self {
        Self {
            policy,
            timeout,
            max_output_chars,
        }
    }

    /// Run one engine-chosen command. Never returns an error: policy
    /// rejections, timeouts, and spawn failures all come back as `Error:`
    /// diagnostic text the engine can observe.
    pub async fn run(&self, command: &str) -> String {
        if let Err(violation) = self.policy.check(command) {
            debug!(command, %violation, "command rejected by policy");
            return format!("Error: {violation}");
        }

        debug!(command, "running command");
        match self.capture(command).await {
            Ok(outcome) => compose_output(&outcome),
            Err(failure) => format!("Error: {failure}"),
        }
    }

    /// Spawn a command and capture its streams, skipping the policy gates.
    ///
    /// For internally constructed plumbing only; engine-chosen text must go
    /// through [`run`](Self::run). The command line is not logged here
    /// because callers may embed credentials in it.
    pub async fn capture(&self, command: &str) -> Result<CommandOutcome, RunFailure> {
        let mut cmd = shell_command(command);
        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(RunFailure::Spawn {
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                return Err(RunFailure::Timeout {
                    secs: self.timeout.as_secs(),
                });
            }
        };

        Ok(CommandOutcome {
            exit_code: output.status.code(),
            stdout: truncate_tail(&String::from_utf8_lossy(&output.stdout), self.max_output_chars),
            stderr: truncate_tail(&String::from_utf8_lossy(&output.stderr), self.max_output_chars),
        })
    }
}

fn shell_command(command: &str) -> tokio::process::Command {
    #[cfg(target_os = "windows")]
    {
        let mut cmd = tokio::process::Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    }
    #[cfg(not(target_os = "windows"))]
    {
        let mut cmd = tokio::process::Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}

/// Keep the tail when a stream exceeds the cap; tests usually fail at the
/// end of the output, and the tail is what the engine needs to see.
fn truncate_tail(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    let tail: String = text.chars().skip(count - max_chars).collect();
    format!("{TRUNCATION_MARKER}\n{tail}")
}

/// The observation text for a completed command. The exit status is always
/// present, even when both streams are empty.
fn compose_output(outcome: &CommandOutcome) -> String {
    let code = outcome
        .exit_code
        .map(|c| c.to_string())
        .unwrap_or_else(|| "killed".into());

    let mut sections = String::new();
    if !outcome.stdout.is_empty() {
        sections.push_str(&format!("STDOUT:\n{}\n", outcome.stdout));
    }
    if !outcome.stderr.is_empty() {
        sections.push_str(&format!("STDERR:\n{}\n", outcome.stderr));
    }

    if sections.is_empty() {
        format!("Command completed (exit code: {code}), empty output")
    } else {
        format!("Exit code: {code}\n{sections}")
    }
}

/// The engine-facing adapter over [`CommandExecutor`].
pub struct ShellTool {
    executor: std::sync::Arc<CommandExecutor>,
}

impl ShellTool {
    pub fn new(executor: std::sync::Arc<CommandExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> ToolName {
        ToolName::RunCommand
    }

    fn description(&self) -> &str {
        "Run a shell command (e.g. 'cargo test'). Only allowed programs run; output is truncated."
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let command = arguments["command"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'command' argument".into()))?;

        let output = self.executor.run(command).await;
        // success means a subprocess ran to completion; the exit status is
        // part of the observation text
        if output.starts_with("Error:") {
            Ok(ToolResult::failed(output))
        } else {
            Ok(ToolResult::ok(output))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn executor_with(allowed: &[&str]) -> CommandExecutor {
        let policy = CommandPolicy::new(
            allowed.iter().map(|s| s.to_string()).collect(),
            ["rm -rf", "sudo", "env", ">", "/etc/", ".env", "|"]
                .map(String::from)
                .to_vec(),
        );
        CommandExecutor::new(policy, Duration::from_secs(10), 8000)
    }

    #[tokio::test]
    async fn disallowed_program_is_rejected_with_diagnostic() {
        let executor = executor_with(&["echo"]);
        let output = executor.run("curl https://example.com").await;
        assert!(output.starts_with("Error:"));
        assert!(output.contains("curl"));
    }

    #[tokio::test]
    async fn forbidden_pattern_is_rejected_even_for_allowed_program() {
        let executor = executor_with(&["echo"]);
        let output = executor.run("echo hi > out.txt").await;
        assert!(output.starts_with("Error:"));
        assert!(output.contains('>'));
    }

    #[tokio::test]
    async fn successful_command_reports_exit_status_and_stdout() {
        let executor = executor_with(&["echo"]);
        let output = executor.run("echo hello").await;
        assert!(output.contains("Exit code: 0"));
        assert!(output.contains("STDOUT:"));
        assert!(output.contains("hello"));
    }

    #[tokio::test]
    async fn empty_output_still_reports_exit_status() {
        let executor = executor_with(&["true"]);
        let output = executor.run("true").await;
        assert_eq!(output, "Command completed (exit code: 0), empty output");
    }

    #[tokio::test]
    async fn failing_command_reports_nonzero_exit() {
        let executor = executor_with(&["false"]);
        let output = executor.run("false").await;
        assert!(output.contains("exit code: 1"));
    }

    #[tokio::test]
    async fn stderr_is_captured_separately() {
        let executor = executor_with(&["ls"]);
        let output = executor.run("ls /definitely/not/a/real/path").await;
        assert!(output.contains("STDERR:"));
        assert!(!output.contains("STDOUT:"));
    }

    #[tokio::test]
    async fn timeout_produces_diagnostic_not_hang() {
        let policy = CommandPolicy::new(vec!["sleep".into()], vec![]);
        let executor = CommandExecutor::new(policy, Duration::from_millis(200), 8000);
        let output = executor.run("sleep 30").await;
        assert!(output.starts_with("Error:"));
        assert!(output.contains("timed out"));
    }

    #[tokio::test]
    async fn long_output_keeps_the_tail() {
        let policy = CommandPolicy::new(vec!["echo".into()], vec![]);
        let executor = CommandExecutor::new(policy, Duration::from_secs(10), 40);
        let long = "a".repeat(60) + "THE-END";
        let output = executor.run(&format!("echo {long}")).await;
        assert!(output.contains(TRUNCATION_MARKER));
        assert!(output.contains("THE-END"));
        assert!(!output.contains(&"a".repeat(60)));
    }

    #[test]
    fn truncate_keeps_short_text_verbatim() {
        assert_eq!(truncate_tail("short", 100), "short");
    }

    #[test]
    fn compose_includes_both_streams() {
        let outcome = CommandOutcome {
            exit_code: Some(2),
            stdout: "out".into(),
            stderr: "err".into(),
        };
        let text = compose_output(&outcome);
        assert!(text.starts_with("Exit code: 2\n"));
        assert!(text.contains("STDOUT:\nout\n"));
        assert!(text.contains("STDERR:\nerr\n"));
    }

    #[tokio::test]
    async fn shell_tool_requires_command_argument() {
        let tool = ShellTool::new(Arc::new(executor_with(&["echo"])));
        let err = tool.execute(serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn shell_tool_marks_policy_rejection_as_failed() {
        let tool = ShellTool::new(Arc::new(executor_with(&["echo"])));
        let result = tool
            .execute(serde_json::json!({"command": "sudo reboot"}))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.starts_with("Error:"));
    }

    #[tokio::test]
    async fn shell_tool_marks_completed_command_ok() {
        let tool = ShellTool::new(Arc::new(executor_with(&["echo"])));
        let result = tool
            .execute(serde_json::json!({"command": "echo ok"}))
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.output.contains("ok"));
    }
}
