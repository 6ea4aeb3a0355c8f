//! Message and Conversation domain types.
//!
//! A run's conversation is the single source of context for the reasoning
//! engine: system instruction first, then alternating action/observation
//! messages. It is append-only and owned by exactly one run; nothing is
//! persisted after the run ends.

use serde::{Deserialize, Serialize};

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (identity, rules, output contract)
    System,
    /// Ticket content and tool observations
    User,
    /// The engine's chosen actions
    Assistant,
}

/// A single message in a conversation.
///
/// Serializes to the `{"role": ..., "content": ...}` shape chat-completion
/// endpoints expect, so wire adapters can send messages as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// An ordered, append-only sequence of messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Create a new empty conversation.
    pub fn new() -> Self {
        Self { messages: Vec::new() }
    }

    /// Add a message to the conversation. Prior messages are never edited.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The most recently appended message, if any.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("Fix the refund bug");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Fix the refund bug");
    }

    #[test]
    fn conversation_preserves_order() {
        let mut conv = Conversation::new();
        conv.push(Message::system("rules"));
        conv.push(Message::user("task"));
        conv.push(Message::assistant("action"));
        assert_eq!(conv.len(), 3);
        assert_eq!(conv.messages[0].role, Role::System);
        assert_eq!(conv.last().map(|m| m.role), Some(Role::Assistant));
    }

    #[test]
    fn role_serializes_lowercase() {
        let msg = Message::assistant("{}");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""role":"assistant""#));

        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
