//! Reasoning engine clients.
//!
//! [`OpenAiCompatEngine`] speaks the chat completions wire protocol used by
//! OpenAI-compatible endpoints. [`StructuredClient`] layers strict-JSON
//! extraction with bounded corrective retries on top of any
//! [`mendbot_core::engine::ReasoningEngine`].

pub mod openai_compat;
pub mod structured;

pub use openai_compat::OpenAiCompatEngine;
pub use structured::StructuredClient;
