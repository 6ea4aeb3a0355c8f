//! # mendbot Core
//!
//! Domain types, traits, and error definitions for the mendbot developer
//! agent. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is defined as a trait here: the reasoning
//! engine, the issue host, and each agent capability (tool). Implementations
//! live in their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod action;
pub mod engine;
pub mod error;
pub mod host;
pub mod message;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use action::AgentAction;
pub use engine::ReasoningEngine;
pub use error::{EngineError, Error, HostError, Result, ToolError};
pub use host::{Issue, IssueHost, NewPullRequest, PullFile, PullRequest};
pub use message::{Conversation, Message, Role};
pub use tool::{Tool, ToolName, ToolRegistry, ToolResult};
