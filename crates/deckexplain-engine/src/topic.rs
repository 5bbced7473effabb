//! Presentation topic resolution.

use deckexplain_llm::LlmBackend;
use deckexplain_utils::error::ExplainError;
use std::sync::Arc;
use tracing::{debug, info};

use crate::query::{QuerySettings, ask};
use crate::retry::RetryPolicy;

pub const TOPIC_SYSTEM_PROMPT: &str =
    "You are a chatbot that extracts the main topic of a presentation based on the presentation's text.";

fn topic_user_prompt(full_text: &str) -> String {
    format!(
        "Provide the main topic of this presentation based on the presentation's following text: \
         {full_text} , no longer than one word."
    )
}

/// Derives one topic string from the whole deck's text.
#[derive(Clone)]
pub struct TopicResolver {
    backend: Arc<dyn LlmBackend>,
    settings: QuerySettings,
    policy: RetryPolicy,
}

impl TopicResolver {
    /// `policy` supplies the backoff; the bound comes from each `resolve` call.
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>, settings: QuerySettings, policy: RetryPolicy) -> Self {
        Self {
            backend,
            settings,
            policy,
        }
    }

    /// Resolve the topic of `full_text`, making at most `max_retries` attempts.
    ///
    /// Returns the completion verbatim.
    ///
    /// # Errors
    ///
    /// - [`ExplainError::InvalidInput`] when `full_text` is blank; no remote call is made
    /// - [`ExplainError::TopicResolutionFailed`] wrapping the retry outcome otherwise
    pub async fn resolve(&self, full_text: &str, max_retries: u32) -> Result<String, ExplainError> {
        if full_text.trim().is_empty() {
            return Err(ExplainError::InvalidInput(
                "presentation's text cannot be empty".to_string(),
            ));
        }

        let policy = self.policy.with_max_attempts(max_retries);
        debug!(
            chars = full_text.len(),
            max_attempts = policy.max_attempts(),
            "Resolving presentation topic"
        );

        let topic = policy
            .run("topic", |_| {
                ask(
                    self.backend.as_ref(),
                    &self.settings,
                    "topic",
                    TOPIC_SYSTEM_PROMPT,
                    topic_user_prompt(full_text),
                )
            })
            .await
            .map_err(|source| ExplainError::TopicResolutionFailed {
                source: Box::new(source),
            })?;

        info!(topic = %topic, "Resolved presentation topic");
        Ok(topic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedBackend, user_text};
    use deckexplain_llm::{LlmError, Role};
    use std::time::Duration;

    fn resolver(backend: Arc<ScriptedBackend>) -> TopicResolver {
        TopicResolver::new(
            backend,
            QuerySettings {
                model: "gpt-3.5-turbo".to_string(),
                timeout: Duration::from_secs(30),
            },
            RetryPolicy::new(3, Duration::from_secs(4), Duration::from_secs(1)),
        )
    }

    #[tokio::test]
    async fn test_blank_text_is_invalid_input_without_remote_call() {
        let backend = Arc::new(ScriptedBackend::replying("unused"));
        let r = resolver(Arc::clone(&backend));

        for text in ["", " ", "  \n\t "] {
            let err = r.resolve(text, 3).await.unwrap_err();
            assert!(matches!(err, ExplainError::InvalidInput(_)), "{text:?}");
        }
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_returns_completion_verbatim() {
        let backend = Arc::new(ScriptedBackend::replying(" Networking.\n"));
        let topic = resolver(Arc::clone(&backend))
            .resolve("TCP handshake Routing tables ", 3)
            .await
            .unwrap();

        assert_eq!(topic, " Networking.\n");
        assert_eq!(backend.calls(), 1);

        let inv = &backend.seen()[0];
        assert_eq!(inv.label, "topic");
        assert_eq!(inv.model, "gpt-3.5-turbo");
        assert_eq!(inv.messages[0].role, Role::System);
        assert_eq!(inv.messages[0].content, TOPIC_SYSTEM_PROMPT);
        assert!(user_text(inv).contains("TCP handshake Routing tables"));
        assert!(user_text(inv).contains("no longer than one word"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_is_topic_resolution_failure() {
        let backend = Arc::new(ScriptedBackend::failing(LlmError::ProviderQuota("429".into())));
        let err = resolver(Arc::clone(&backend))
            .resolve("some text", 2)
            .await
            .unwrap_err();

        assert_eq!(backend.calls(), 2);
        match err {
            ExplainError::TopicResolutionFailed { source } => {
                assert!(matches!(
                    *source,
                    ExplainError::RetriesExhausted { attempts: 2, .. }
                ));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_misconfiguration_fails_after_one_call() {
        let backend = Arc::new(ScriptedBackend::failing(LlmError::Misconfiguration(
            "missing key".into(),
        )));
        let err = resolver(Arc::clone(&backend))
            .resolve("some text", 5)
            .await
            .unwrap_err();

        assert_eq!(backend.calls(), 1);
        assert!(matches!(err, ExplainError::TopicResolutionFailed { .. }));
    }
}
