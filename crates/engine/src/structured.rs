//! Strict-JSON answer extraction with bounded retries.
//!
//! Engines are asked for JSON but do not always deliver it. The
//! [`StructuredClient`] wraps a [`ReasoningEngine`] and keeps asking until
//! the answer parses as a JSON object, nudging the model with a corrective
//! message after each malformed reply. The caller's conversation is never
//! mutated; corrections only exist in a local working copy.

use mendbot_core::engine::ReasoningEngine;
use mendbot_core::error::EngineError;
use mendbot_core::message::{Conversation, Message};
use std::sync::Arc;
use tracing::warn;

const CORRECTIVE_MESSAGE: &str =
    "Your previous answer was not valid JSON. Answer again, strictly as a single JSON object \
     with no surrounding text.";

/// Asks an engine for answers that must parse as JSON objects.
pub struct StructuredClient {
    engine: Arc<dyn ReasoningEngine>,
    max_attempts: u32,
}

impl StructuredClient {
    pub fn new(engine: Arc<dyn ReasoningEngine>, max_attempts: u32) -> Self {
        Self {
            engine,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Requests a completion and parses it as a JSON object.
    ///
    /// A reply that fails to parse, or parses to something other than an
    /// object, counts as malformed: a corrective user message is appended to
    /// a local copy of the conversation and the request is retried. Engine
    /// timeouts are retried without appending anything. Any other engine
    /// error aborts immediately. After `max_attempts` malformed replies or
    /// timeouts the call fails with [`EngineError::RetriesExhausted`].
    pub async fn ask(&self, conversation: &Conversation) -> Result<serde_json::Value, EngineError> {
        let mut local = conversation.clone();

        for attempt in 1..=self.max_attempts {
            match self.engine.complete_json(&local.messages).await {
                Ok(text) => match serde_json::from_str::<serde_json::Value>(&text) {
                    Ok(value) if value.is_object() => return Ok(value),
                    _ => {
                        warn!(
                            attempt,
                            max_attempts = self.max_attempts,
                            "Engine reply was not a JSON object, retrying with correction"
                        );
                        local.push(Message::user(CORRECTIVE_MESSAGE));
                    }
                },
                Err(EngineError::Timeout(reason)) => {
                    warn!(attempt, max_attempts = self.max_attempts, %reason, "Engine timed out, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(EngineError::RetriesExhausted {
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Engine that plays back scripted results and records the length of
    /// the message list it saw on each call.
    struct ScriptedEngine {
        responses: Mutex<Vec<Result<String, EngineError>>>,
        seen_lengths: Mutex<Vec<usize>>,
    }

    impl ScriptedEngine {
        fn new(responses: Vec<Result<String, EngineError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                seen_lengths: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.seen_lengths.lock().unwrap().len()
        }

        fn lengths(&self) -> Vec<usize> {
            self.seen_lengths.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReasoningEngine for ScriptedEngine {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete_json(&self, messages: &[Message]) -> Result<String, EngineError> {
            self.seen_lengths.lock().unwrap().push(messages.len());
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(EngineError::EmptyResponse("script exhausted".to_string()));
            }
            responses.remove(0)
        }
    }

    fn conversation() -> Conversation {
        let mut c = Conversation::new();
        c.push(Message::system("be a bot"));
        c.push(Message::user("do a thing"));
        c
    }

    #[tokio::test]
    async fn well_formed_answer_returned_first_try() {
        let engine = Arc::new(ScriptedEngine::new(vec![Ok(
            r#"{"thought": "done"}"#.to_string()
        )]));
        let client = StructuredClient::new(engine.clone(), 3);

        let value = client.ask(&conversation()).await.unwrap();

        assert_eq!(value["thought"], "done");
        assert_eq!(engine.call_count(), 1);
    }

    #[tokio::test]
    async fn malformed_then_well_formed_takes_exactly_two_requests() {
        let engine = Arc::new(ScriptedEngine::new(vec![
            Ok("sure, here you go: {".to_string()),
            Ok(r#"{"tool": "read_file"}"#.to_string()),
        ]));
        let client = StructuredClient::new(engine.clone(), 3);

        let value = client.ask(&conversation()).await.unwrap();

        assert_eq!(value["tool"], "read_file");
        assert_eq!(engine.call_count(), 2);
        // Second call carries the corrective message.
        assert_eq!(engine.lengths(), vec![2, 3]);
    }

    #[tokio::test]
    async fn json_array_counts_as_malformed() {
        let engine = Arc::new(ScriptedEngine::new(vec![
            Ok("[1, 2, 3]".to_string()),
            Ok(r#"{"ok": true}"#.to_string()),
        ]));
        let client = StructuredClient::new(engine.clone(), 3);

        let value = client.ask(&conversation()).await.unwrap();

        assert_eq!(value["ok"], true);
        assert_eq!(engine.call_count(), 2);
    }

    #[tokio::test]
    async fn persistently_malformed_answers_exhaust_retries() {
        let engine = Arc::new(ScriptedEngine::new(vec![
            Ok("nope".to_string()),
            Ok("still nope".to_string()),
            Ok("not json either".to_string()),
        ]));
        let client = StructuredClient::new(engine.clone(), 3);

        let err = client.ask(&conversation()).await.unwrap_err();

        assert!(matches!(err, EngineError::RetriesExhausted { attempts: 3 }));
        assert_eq!(engine.call_count(), 3);
    }

    #[tokio::test]
    async fn timeout_retries_without_corrective_message() {
        let engine = Arc::new(ScriptedEngine::new(vec![
            Err(EngineError::Timeout("deadline exceeded".to_string())),
            Ok(r#"{"thought": "slow but fine"}"#.to_string()),
        ]));
        let client = StructuredClient::new(engine.clone(), 3);

        let value = client.ask(&conversation()).await.unwrap();

        assert_eq!(value["thought"], "slow but fine");
        // Both calls saw the same conversation: nothing was appended.
        assert_eq!(engine.lengths(), vec![2, 2]);
    }

    #[tokio::test]
    async fn non_timeout_error_aborts_immediately() {
        let engine = Arc::new(ScriptedEngine::new(vec![
            Err(EngineError::AuthenticationFailed("bad key".to_string())),
            Ok(r#"{"never": "reached"}"#.to_string()),
        ]));
        let client = StructuredClient::new(engine.clone(), 3);

        let err = client.ask(&conversation()).await.unwrap_err();

        assert!(matches!(err, EngineError::AuthenticationFailed(_)));
        assert_eq!(engine.call_count(), 1);
    }

    #[tokio::test]
    async fn caller_conversation_is_never_mutated() {
        let engine = Arc::new(ScriptedEngine::new(vec![
            Ok("garbage".to_string()),
            Ok(r#"{"fine": "now"}"#.to_string()),
        ]));
        let client = StructuredClient::new(engine, 3);
        let original = conversation();

        client.ask(&original).await.unwrap();

        assert_eq!(original.len(), 2);
    }
}
