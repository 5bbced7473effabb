use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::LlmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

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

/// One prompt sent to a backend.
#[derive(Debug, Clone)]
pub struct LlmInvocation {
    /// Short tag for logs, e.g. `topic` or `slide-3`
    pub label: String,
    /// Model name; empty selects the backend's configured default
    pub model: String,
    pub timeout: Duration,
    pub messages: Vec<Message>,
}

impl LlmInvocation {
    #[must_use]
    pub fn new(
        label: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
        messages: Vec<Message>,
    ) -> Self {
        Self {
            label: label.into(),
            model: model.into(),
            timeout,
            messages,
        }
    }
}

/// One completion returned by a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResult {
    /// The completion text exactly as returned by the provider
    pub raw_response: String,
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
    pub fn with_tokens(mut self, input: u64, output: u64) -> Self {
        self.tokens_input = Some(input);
        self.tokens_output = Some(output);
        self
    }
}

/// A remote completion service.
///
/// Implementations perform exactly one remote attempt per call; retrying is
/// the caller's concern. Backends are shared across concurrent slide tasks,
/// so they must be `Send + Sync`.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Send the invocation's messages and return the completion.
    ///
    /// # Errors
    ///
    /// Returns `LlmError` for transport failures, provider errors (auth,
    /// quota, outages), timeouts, and local misconfiguration.
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        assert_eq!(Message::system("s").role, Role::System);
        assert_eq!(Message::user("u").role, Role::User);
        assert_eq!(Message::assistant("a").content, "a");
        assert_eq!(Role::Assistant.as_str(), "assistant");
    }

    #[test]
    fn test_invocation_defaults_to_backend_model() {
        let inv = LlmInvocation::new("topic", "", Duration::from_secs(5), vec![Message::user("x")]);
        assert_eq!(inv.label, "topic");
        assert!(inv.model.is_empty());
        assert_eq!(inv.messages.len(), 1);
    }
}
