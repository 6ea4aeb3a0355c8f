//! Client for OpenAI-compatible chat completion APIs.
//!
//! Works with any endpoint that speaks the `/chat/completions` wire shape:
//! OpenAI itself, Azure OpenAI, Together, Groq, vLLM, LM Studio, Ollama's
//! compatibility layer, and the rest. The endpoint and model are fixed at
//! construction; every request asks for a JSON object response.

use async_trait::async_trait;
use mendbot_core::engine::ReasoningEngine;
use mendbot_core::error::EngineError;
use mendbot_core::message::Message;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Engine backed by an OpenAI-compatible chat completions endpoint.
pub struct OpenAiCompatEngine {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiCompatEngine {
    /// Creates a new engine for `base_url` (e.g. `https://api.openai.com/v1`).
    ///
    /// A trailing slash on the base URL is tolerated and stripped.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        }
    }

    /// The model identifier sent with each request.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, messages: &[Message]) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": messages,
            "response_format": { "type": "json_object" },
        })
    }
}

#[async_trait]
impl ReasoningEngine for OpenAiCompatEngine {
    fn name(&self) -> &str {
        "openai-compat"
    }

    async fn complete_json(&self, messages: &[Message]) -> Result<String, EngineError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.request_body(messages);

        debug!(
            engine = self.name(),
            model = %self.model,
            message_count = messages.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EngineError::Timeout(e.to_string())
                } else {
                    EngineError::Network(e.to_string())
                }
            })?;

        let status = response.status();

        if status.as_u16() == 429 {
            return Err(EngineError::RateLimited { retry_after_secs: 5 });
        }

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(EngineError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".to_string(),
            ));
        }

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %error_body, "Engine returned error");
            return Err(EngineError::ApiError {
                status_code: status.as_u16(),
                message: error_body,
            });
        }

        let api_response: ApiResponse = response.json().await.map_err(|e| EngineError::ApiError {
            status_code: status.as_u16(),
            message: format!("Failed to parse response: {e}"),
        })?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::EmptyResponse("No choices in response".to_string()))?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ApiChoiceMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_strips_trailing_slash() {
        let engine = OpenAiCompatEngine::new("https://api.openai.com/v1/", "key", "gpt-4o-mini");
        assert_eq!(engine.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn request_body_forces_json_object_output() {
        let engine = OpenAiCompatEngine::new("http://localhost:8080/v1", "key", "test-model");
        let messages = vec![Message::system("You are a bot"), Message::user("hello")];

        let body = engine.request_body(&messages);

        assert_eq!(body["model"], "test-model");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hello");
    }

    #[test]
    fn parses_completion_response() {
        let raw = r#"{
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "model": "gpt-4o-mini",
            "choices": [
                {
                    "index": 0,
                    "message": { "role": "assistant", "content": "{\"thought\": \"ok\"}" },
                    "finish_reason": "stop"
                }
            ],
            "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
        }"#;

        let parsed: ApiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices.len(), 1);
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("{\"thought\": \"ok\"}")
        );
    }

    #[test]
    fn parses_response_with_null_content() {
        let raw = r#"{
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": null } }
            ]
        }"#;

        let parsed: ApiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, None);
    }
}
