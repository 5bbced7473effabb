//! Per-slide explanation.

use deckexplain_llm::{LlmBackend, LlmError};
use deckexplain_utils::error::NO_TEXT_EXPLANATION;
use std::sync::Arc;

use crate::query::{QuerySettings, ask};

pub const SLIDE_SYSTEM_PROMPT: &str =
    "You are a chatbot that generates expanded explanations about slide topics.";

fn slide_user_prompt(slide_text: &str, topic: &str) -> String {
    format!(
        "Please provide an expanded explanation for the slide content. \
         The slide topic is: {slide_text}. \
         If applicable, provide the explanation within the context of the main topic: {topic}. \
         Please make the explanation natural and expand on the slide topic with relevant details. \
         Make the explanation up to 3 sentences."
    )
}

/// Generates one explanation for one slide. Holds no mutable state, so a
/// single explainer is shared by every slide task of a run.
#[derive(Clone)]
pub struct SlideExplainer {
    backend: Arc<dyn LlmBackend>,
    settings: QuerySettings,
}

impl SlideExplainer {
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>, settings: QuerySettings) -> Self {
        Self { backend, settings }
    }

    /// Explain `slide_text` in the context of `topic`.
    ///
    /// Blank text short-circuits to [`NO_TEXT_EXPLANATION`] without a remote
    /// call. Otherwise exactly one remote request is made and its completion is
    /// returned verbatim.
    pub async fn explain(&self, slide_text: &str, topic: &str) -> Result<String, LlmError> {
        self.explain_labelled("slide", slide_text, topic).await
    }

    pub(crate) async fn explain_labelled(
        &self,
        label: &str,
        slide_text: &str,
        topic: &str,
    ) -> Result<String, LlmError> {
        if slide_text.trim().is_empty() {
            return Ok(NO_TEXT_EXPLANATION.to_string());
        }

        ask(
            self.backend.as_ref(),
            &self.settings,
            label,
            SLIDE_SYSTEM_PROMPT,
            slide_user_prompt(slide_text, topic),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedBackend, user_text};

    fn explainer(backend: Arc<ScriptedBackend>) -> SlideExplainer {
        SlideExplainer::new(backend, QuerySettings::default())
    }

    #[tokio::test]
    async fn test_blank_slide_short_circuits() {
        let backend = Arc::new(ScriptedBackend::replying("unused"));
        let e = explainer(Arc::clone(&backend));

        for text in ["", " ", "\n  "] {
            assert_eq!(e.explain(text, "Networking").await.unwrap(), NO_TEXT_EXPLANATION);
        }
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_prompt_carries_slide_text_and_topic() {
        let backend = Arc::new(ScriptedBackend::replying("An explanation."));
        let out = explainer(Arc::clone(&backend))
            .explain("Routing tables ", "Networking")
            .await
            .unwrap();

        assert_eq!(out, "An explanation.");
        let seen = backend.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].messages[0].content, SLIDE_SYSTEM_PROMPT);
        let user = user_text(&seen[0]);
        assert!(user.contains("The slide topic is: Routing tables"));
        assert!(user.contains("main topic: Networking"));
        assert!(user.contains("up to 3 sentences"));
    }

    #[tokio::test]
    async fn test_remote_error_is_returned() {
        let backend = Arc::new(ScriptedBackend::failing(LlmError::ProviderOutage("502".into())));
        let err = explainer(Arc::clone(&backend))
            .explain("Intro", "Networking")
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::ProviderOutage(_)));
        assert_eq!(backend.calls(), 1);
    }
}
