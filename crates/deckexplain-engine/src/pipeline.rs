//! End-to-end explanation of one deck: topic, then every slide.

use deckexplain_config::Config;
use deckexplain_llm::LlmBackend;
use deckexplain_utils::error::ExplainError;
use deckexplain_utils::types::{ExplanationResult, SlideDeck, SlideIndex};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info, info_span};

use crate::coordinator::PresentationExplanationCoordinator;
use crate::explainer::SlideExplainer;
use crate::query::QuerySettings;
use crate::retry::RetryPolicy;
use crate::topic::TopicResolver;

/// Outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeckExplanation {
    /// `None` when the deck had no text, so no topic was needed
    pub topic: Option<String>,
    pub explanations: ExplanationResult,
    /// Slides whose entry is a failure sentinel, ascending
    pub failed: Vec<SlideIndex>,
}

/// Wires topic resolution and the slide coordinator around one backend.
#[derive(Clone)]
pub struct ExplanationPipeline {
    resolver: TopicResolver,
    coordinator: PresentationExplanationCoordinator,
    max_retries: u32,
}

impl ExplanationPipeline {
    /// One policy drives both topic resolution and every slide.
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>, settings: QuerySettings, policy: RetryPolicy) -> Self {
        let max_retries = policy.max_attempts();
        Self {
            resolver: TopicResolver::new(Arc::clone(&backend), settings.clone(), policy.clone()),
            coordinator: PresentationExplanationCoordinator::new(
                SlideExplainer::new(backend, settings),
                policy,
            ),
            max_retries,
        }
    }

    #[must_use]
    pub fn from_config(backend: Arc<dyn LlmBackend>, config: &Config) -> Self {
        Self::new(
            backend,
            QuerySettings::from_config(&config.llm),
            RetryPolicy::from_config(&config.retry),
        )
    }

    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Explain `deck`, resolving the topic unless the caller supplies one.
    ///
    /// A deck whose text is entirely blank needs no topic: every slide gets
    /// the no-text sentinel and no remote call is made.
    ///
    /// # Errors
    ///
    /// - [`ExplainError::InvalidInput`] when a caller-supplied topic is blank
    /// - [`ExplainError::TopicResolutionFailed`]; no slide is attempted
    /// - [`ExplainError::Aggregation`] from the coordinator
    pub async fn explain_deck(
        &self,
        deck: &SlideDeck,
        topic: Option<String>,
    ) -> Result<DeckExplanation, ExplainError> {
        let span = info_span!("explain_deck", slides = deck.len());
        self.explain_deck_inner(deck, topic).instrument(span).await
    }

    async fn explain_deck_inner(
        &self,
        deck: &SlideDeck,
        topic: Option<String>,
    ) -> Result<DeckExplanation, ExplainError> {
        let started = Instant::now();

        let topic = match topic {
            Some(t) if t.trim().is_empty() => {
                return Err(ExplainError::InvalidInput(
                    "topic must not be blank".to_string(),
                ));
            }
            Some(t) => {
                info!(topic = %t, "Using caller-supplied topic");
                Some(t)
            }
            None => {
                let full_text = deck.full_text();
                if full_text.trim().is_empty() {
                    info!("Deck has no text, skipping topic resolution");
                    None
                } else {
                    Some(self.resolver.resolve(&full_text, self.max_retries).await?)
                }
            }
        };

        let run = self
            .coordinator
            .run_tracked(deck, topic.as_deref().unwrap_or_default(), self.max_retries)
            .await?;

        info!(
            slides = deck.len(),
            failed = run.failed.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Deck explained"
        );

        Ok(DeckExplanation {
            topic,
            explanations: run.explanations,
            failed: run.failed,
        })
    }
}
