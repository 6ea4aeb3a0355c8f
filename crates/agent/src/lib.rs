//! The mendbot agents.
//!
//! The developer agent follows an **observe → decide → act** cycle:
//!
//! 1. **Build context** from the ticket (title, body, file listing, `@file`
//!    references)
//! 2. **Ask the engine** for the next action as strict JSON
//! 3. **Dispatch** the action through the tool registry
//! 4. **Append** the action and its observation, loop back to step 2
//!
//! The loop ends when `open_pull_request` succeeds or the iteration budget
//! runs out. [`ReviewerAgent`] is the one-shot counterpart that reads a
//! pull request and posts a structured verdict. [`factory`] assembles both
//! from configuration.

pub mod developer;
pub mod factory;
pub mod prompt;
pub mod reviewer;

#[cfg(test)]
pub(crate) mod test_support;

pub use developer::{DeveloperAgent, ExhaustionReason, RunOutcome, RunReport};
pub use factory::{build_developer, build_host, build_reviewer};
pub use reviewer::{ReviewStatus, ReviewVerdict, ReviewerAgent};
