//! Scripted fakes shared by the agent test modules.

use async_trait::async_trait;
use mendbot_core::engine::ReasoningEngine;
use mendbot_core::error::EngineError;
use mendbot_core::message::Message;
use std::sync::Mutex;

/// Plays back scripted engine answers and records every prompt it saw.
pub struct ScriptedEngine {
    answers: Mutex<Vec<Result<String, EngineError>>>,
    pub prompts: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedEngine {
    pub fn new(answers: Vec<Result<String, EngineError>>) -> Self {
        Self {
            answers: Mutex::new(answers),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// The user-role content of the first prompt, for context assertions.
    pub fn first_prompt(&self) -> Vec<Message> {
        self.prompts.lock().unwrap().first().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl ReasoningEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete_json(&self, messages: &[Message]) -> Result<String, EngineError> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        let mut answers = self.answers.lock().unwrap();
        if answers.is_empty() {
            return Err(EngineError::EmptyResponse("script exhausted".to_string()));
        }
        answers.remove(0)
    }
}
