//! The developer agent: a bounded observe-act loop around one ticket.

use chrono::{DateTime, Utc};
use mendbot_core::action::AgentAction;
use mendbot_core::host::Issue;
use mendbot_core::message::{Conversation, Message};
use mendbot_core::tool::{ToolName, ToolRegistry};
use mendbot_engine::StructuredClient;
use mendbot_tools::ListFilesTool;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::prompt;

/// Why a run ended without a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ExhaustionReason {
    /// The reasoning engine failed in a way retries could not recover.
    EngineFailed(String),
    /// The iteration budget ran out before `open_pull_request` succeeded.
    IterationLimit,
}

impl std::fmt::Display for ExhaustionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExhaustionReason::EngineFailed(msg) => write!(f, "engine failed: {msg}"),
            ExhaustionReason::IterationLimit => write!(f, "iteration limit reached"),
        }
    }
}

/// Terminal outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RunOutcome {
    /// `open_pull_request` succeeded; the run is done.
    Succeeded { pull_request_url: String },
    /// The run gave up.
    Exhausted { reason: ExhaustionReason },
}

/// What one developer run did.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Iterations consumed, including the terminal one.
    pub iterations: u32,
    pub outcome: RunOutcome,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, RunOutcome::Succeeded { .. })
    }
}

/// Drives the observe-act cycle for one ticket.
///
/// Per iteration: ask the engine for the next action, dispatch it through
/// the registry, append the action and its observation to the conversation,
/// check for termination. The conversation is append-only and owned by the
/// run; it is dropped when the run ends.
pub struct DeveloperAgent {
    client: StructuredClient,
    tools: Arc<ToolRegistry>,
    /// Produces the initial project listing for the first user message.
    files: ListFilesTool,
    /// Root of the checkout the run works in.
    workspace: PathBuf,
    max_iterations: u32,
}

impl DeveloperAgent {
    pub fn new(
        client: StructuredClient,
        tools: Arc<ToolRegistry>,
        files: ListFilesTool,
        workspace: impl Into<PathBuf>,
        max_iterations: u32,
    ) -> Self {
        Self {
            client,
            tools,
            files,
            workspace: workspace.into(),
            max_iterations: max_iterations.max(1),
        }
    }

    async fn initial_conversation(&self, issue: &Issue) -> Conversation {
        let listing = self.files.listing(&self.workspace.to_string_lossy()).await;
        let context = prompt::load_context_files(&self.workspace, &issue.body).await;

        let mut conversation = Conversation::new();
        conversation.push(Message::system(prompt::system_prompt(
            &self.tools.describe(),
        )));
        conversation.push(Message::user(prompt::initial_message(
            &issue.title,
            &issue.body,
            &listing,
            &context,
        )));
        conversation
    }

    /// Runs the loop to a terminal outcome. Engine failures become an
    /// `Exhausted` report rather than an error.
    pub async fn run(&self, issue: &Issue) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        info!(
            %run_id,
            issue = issue.number,
            title = %issue.title,
            max_iterations = self.max_iterations,
            "Starting developer run"
        );

        let mut conversation = self.initial_conversation(issue).await;
        let mut iteration = 0;

        while iteration < self.max_iterations {
            iteration += 1;
            debug!(%run_id, iteration, "Agent loop iteration");

            let raw = match self.client.ask(&conversation).await {
                Ok(value) => value,
                Err(e) => {
                    warn!(%run_id, iteration, error = %e, "Engine failed, abandoning run");
                    return RunReport {
                        run_id,
                        started_at,
                        iterations: iteration,
                        outcome: RunOutcome::Exhausted {
                            reason: ExhaustionReason::EngineFailed(e.to_string()),
                        },
                    };
                }
            };

            let action = AgentAction::decode(&raw, issue.number);
            info!(
                %run_id,
                iteration,
                tool = %action.tool,
                thought = %action.thought,
                "Engine chose an action"
            );

            let result = self.tools.dispatch(&action.tool, action.args.clone()).await;

            if action.tool == ToolName::OpenPullRequest.as_str() && result.success {
                let pull_request_url = result
                    .data
                    .as_ref()
                    .and_then(|d| d.get("url"))
                    .and_then(|u| u.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| result.output.clone());

                info!(%run_id, iterations = iteration, url = %pull_request_url, "Run succeeded");
                return RunReport {
                    run_id,
                    started_at,
                    iterations: iteration,
                    outcome: RunOutcome::Succeeded { pull_request_url },
                };
            }

            conversation.push(Message::assistant(action.to_json()));
            conversation.push(Message::user(format!("Observation: {}", result.output)));
        }

        warn!(%run_id, iterations = iteration, "Iteration budget exhausted without a pull request");
        RunReport {
            run_id,
            started_at,
            iterations: iteration,
            outcome: RunOutcome::Exhausted {
                reason: ExhaustionReason::IterationLimit,
            },
        }
    }
}
