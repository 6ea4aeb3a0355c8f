//! Built-in tool implementations for mendbot.
//!
//! Five tools make up the agent's whole vocabulary: list, read, and write
//! files, run a policy-gated shell command, and the terminal
//! open-pull-request composite. Every tool reports failure as observation
//! text the engine can react to on its next turn; none of them aborts a
//! run.

pub mod file_list;
pub mod file_read;
pub mod file_write;
pub mod open_pr;
pub mod shell;

pub use file_list::{LISTING_TRUNCATED_NOTE, ListFilesTool};
pub use file_read::FileReadTool;
pub use file_write::FileWriteTool;
pub use open_pr::{GitWorkTree, OpenPullRequestTool, WorkTree, branch_for_issue};
pub use shell::{CommandExecutor, CommandOutcome, RunFailure, ShellTool, TRUNCATION_MARKER};
