//! mendbot CLI — the main entry point.
//!
//! Commands:
//! - `run`    — Fix one issue end to end
//! - `review` — Review one pull request
//! - `serve`  — Start the webhook gateway

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "mendbot",
    about = "mendbot — an autonomous issue-fixing developer agent",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the developer agent against one issue
    Run {
        /// Issue number to fix
        #[arg(short, long)]
        issue: u64,
    },

    /// Review a pull request and post the verdict
    Review {
        /// Pull request number to review
        #[arg(short, long)]
        pr: u64,
    },

    /// Start the webhook gateway server
    Serve {
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run { issue } => commands::run::run(issue).await?,
        Commands::Review { pr } => commands::review::run(pr).await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
    }

    Ok(())
}
