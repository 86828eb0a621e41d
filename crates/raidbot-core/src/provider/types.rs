//! LLM provider types shared across provider implementations.
//!
//! These types define the contract between the fallback generator and any
//! LLM backend. Every provider produces an `LlmResponse` from a list of
//! `ChatMessage`s.

use serde::{Deserialize, Serialize};

/// A single message in a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// Response from an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: Option<String>,
    pub finish_reason: String,
    pub usage: Usage,
}

/// Token usage statistics. Missing fields read as zero.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_constructors() {
        let sys = ChatMessage::system("You are a RAID expert.");
        assert_eq!(sys.role, "system");
        assert_eq!(sys.content, "You are a RAID expert.");

        assert_eq!(ChatMessage::user("Hello").role, "user");
    }

    #[test]
    fn test_chat_message_wire_format() {
        let json = serde_json::to_value(ChatMessage::user("cb team?")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "cb team?"}));
    }
}
