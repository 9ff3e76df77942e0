//! Core types for the backend abstraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use codedrop_utils::error::LlmError;

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Input to one backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmInvocation {
    /// Model name; empty means the backend's default
    pub model: String,
    pub timeout: Duration,
    /// Ordered conversation, system prompt first
    pub messages: Vec<Message>,
}

impl LlmInvocation {
    #[must_use]
    pub fn new(model: impl Into<String>, timeout: Duration, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            timeout,
            messages,
        }
    }

    /// System prompt plus one user message, the shape every request takes.
    #[must_use]
    pub fn chat(
        model: impl Into<String>,
        timeout: Duration,
        system_prompt: impl Into<String>,
        user_message: impl Into<String>,
    ) -> Self {
        Self::new(
            model,
            timeout,
            vec![Message::system(system_prompt), Message::user(user_message)],
        )
    }

    /// Content of the last user message, if any.
    #[must_use]
    pub fn user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

/// Result of one backend call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmResult {
    /// Reply text extracted from the response envelope
    pub raw_response: String,
    /// Provider name, e.g. `ollama`
    pub provider: String,
    pub model_used: String,
    pub tokens_input: Option<u64>,
    pub tokens_output: Option<u64>,
}

impl LlmResult {
    #[must_use]
    pub fn new(
        raw_response: impl Into<String>,
        provider: impl Into<String>,
        model_used: impl Into<String>,
    ) -> Self {
        Self {
            raw_response: raw_response.into(),
            provider: provider.into(),
            model_used: model_used.into(),
            tokens_input: None,
            tokens_output: None,
        }
    }

    #[must_use]
    pub fn with_tokens(mut self, input: Option<u64>, output: Option<u64>) -> Self {
        self.tokens_input = input;
        self.tokens_output = output;
        self
    }
}

/// A generation backend
///
/// Implementations own their transport and timeouts. Callers only see the
/// reply text or a typed error.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Send the conversation and return the reply.
    ///
    /// # Errors
    ///
    /// Transport failures, provider errors, timeouts, and replies that carry
    /// no text ([`LlmError::EmptyResponse`]).
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_invocation_orders_system_first() {
        let inv = LlmInvocation::chat("m", Duration::from_secs(1), "sys", "make a page");
        assert_eq!(inv.messages.len(), 2);
        assert_eq!(inv.messages[0].role, Role::System);
        assert_eq!(inv.user_message(), Some("make a page"));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }
}
