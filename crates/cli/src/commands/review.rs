//! `mendbot review` — one-shot review of a pull request.

use mendbot_agent::build_reviewer;
use mendbot_config::AppConfig;

pub async fn run(pr_number: u64) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let reviewer = build_reviewer(&config, ".")?;
    let verdict = reviewer
        .review(pr_number)
        .await
        .map_err(|e| format!("Review of pull request #{pr_number} failed: {e}"))?;

    println!("Verdict: {}", verdict.status.as_str());
    println!("{}", verdict.summary);
    for finding in &verdict.findings {
        match finding.line_number {
            Some(line) => println!("- {}:{line}: {}", finding.file_path, finding.comment),
            None => println!("- {}: {}", finding.file_path, finding.comment),
        }
    }
    Ok(())
}
