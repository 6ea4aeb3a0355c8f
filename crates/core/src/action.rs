//! The action value decoded from the engine's structured output.
//!
//! The engine answers every turn with a JSON object of the shape
//! `{"thought": ..., "tool": ..., "args": {...}}`. Decoding is total:
//! missing fields get defaults, and the run's ticket number is injected
//! where the engine forgot it. Once constructed, an action is never
//! mutated.

use serde::{Deserialize, Serialize};

use crate::tool::ToolName;

/// One decoded engine decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentAction {
    /// Free-text rationale. Logged, never parsed.
    pub thought: String,

    /// Requested tool wire name. May be anything the engine invented;
    /// validation happens at dispatch.
    pub tool: String,

    /// Named arguments for the tool, always a JSON object.
    pub args: serde_json::Value,
}

impl AgentAction {
    /// Decode a raw engine answer for the given ticket.
    ///
    /// `thought` defaults to `"..."`, `tool` to the empty string, `args` to
    /// `{}`. A pull-request action missing its `issue_number` argument gets
    /// the ticket number filled in here, before the value becomes read-only;
    /// the engine is not required to track that bookkeeping.
    pub fn decode(raw: &serde_json::Value, ticket: u64) -> Self {
        let thought = raw["thought"].as_str().unwrap_or("...").to_string();
        let tool = raw["tool"].as_str().unwrap_or("").to_string();
        let mut args = match raw.get("args") {
            Some(serde_json::Value::Object(map)) => serde_json::Value::Object(map.clone()),
            _ => serde_json::json!({}),
        };

        if tool == ToolName::OpenPullRequest.as_str()
            && let Some(map) = args.as_object_mut()
            && !map.contains_key("issue_number")
        {
            map.insert("issue_number".into(), serde_json::json!(ticket));
        }

        Self { thought, tool, args }
    }

    /// The action as conversation text, appended verbatim as the assistant
    /// message for this turn.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
