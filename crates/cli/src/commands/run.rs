//! `mendbot run` — one developer run against one issue.

use mendbot_agent::{RunOutcome, build_developer, build_host};
use mendbot_config::AppConfig;
use mendbot_core::host::IssueHost;
use tracing::info;

pub async fn run(issue_number: u64) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let host = build_host(&config)?;
    let agent = build_developer(&config, ".")?;

    let issue = host
        .get_issue(issue_number)
        .await
        .map_err(|e| format!("Failed to fetch issue #{issue_number}: {e}"))?;

    info!(issue = issue.number, title = %issue.title, "Fetched issue");

    let report = agent.run(&issue).await;
    match report.outcome {
        RunOutcome::Succeeded { pull_request_url } => {
            println!("Run succeeded after {} iteration(s).", report.iterations);
            println!("Pull request: {pull_request_url}");
            Ok(())
        }
        RunOutcome::Exhausted { reason } => {
            eprintln!(
                "Run gave up after {} iteration(s): {reason}",
                report.iterations
            );
            Err(format!("run exhausted: {reason}").into())
        }
    }
}
