//! ReasoningEngine trait — the abstraction over the LLM backend.
//!
//! An engine knows how to send a conversation to a model endpoint and return
//! the raw completion text. This system runs every request in JSON mode; the
//! strict-parse/retry policy lives one layer up, so implementations stay
//! thin transport shims.

use async_trait::async_trait;

use crate::error::EngineError;
use crate::message::Message;

/// The core reasoning backend trait.
///
/// The agent loop never talks to an engine directly; it goes through the
/// structured client, which owns retries and corrective messages.
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// A human-readable name for this engine (e.g. "openai-compat").
    fn name(&self) -> &str;

    /// Send the messages and return the completion text, requested in
    /// JSON mode. The text is not guaranteed to parse; callers decide
    /// what malformed output means.
    async fn complete_json(&self, messages: &[Message]) -> std::result::Result<String, EngineError>;
}
