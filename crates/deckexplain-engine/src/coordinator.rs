//! Concurrent fan-out of slide explanations with per-slide failure isolation.

use deckexplain_utils::error::ExplainError;
use deckexplain_utils::types::{ExplanationResult, SlideDeck, SlideIndex};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::{Id, JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::explainer::SlideExplainer;
use crate::retry::RetryPolicy;

/// Explanations of one deck plus the slides that got a failure sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatedRun {
    pub explanations: ExplanationResult,
    /// Ascending slide indexes whose entry is an `ERROR - ...` sentinel
    pub failed: Vec<SlideIndex>,
}

/// Explains every slide of a deck concurrently.
///
/// One task per slide is spawned on a [`JoinSet`]; each task retries its own
/// remote query under the run's [`RetryPolicy`]. A slide that cannot be
/// explained gets a failure sentinel in place of its explanation and never
/// affects the others. The coordinator is the only writer of the result map.
#[derive(Clone)]
pub struct PresentationExplanationCoordinator {
    explainer: SlideExplainer,
    policy: RetryPolicy,
}

impl PresentationExplanationCoordinator {
    /// `policy` supplies the backoff; the bound comes from each `run` call.
    #[must_use]
    pub fn new(explainer: SlideExplainer, policy: RetryPolicy) -> Self {
        Self { explainer, policy }
    }

    /// Explain every slide of `slides` in the context of `topic`.
    ///
    /// Returns only after every slide task has terminated. The result holds
    /// exactly one entry per input index: the completion, the no-text
    /// sentinel, or an `ERROR - ...` sentinel naming the slide.
    ///
    /// # Errors
    ///
    /// [`ExplainError::Aggregation`] if the collected key set differs from the
    /// input key set. Per-slide failures are never returned as errors.
    pub async fn run(
        &self,
        slides: &SlideDeck,
        topic: &str,
        max_retries: u32,
    ) -> Result<ExplanationResult, ExplainError> {
        self.run_tracked(slides, topic, max_retries)
            .await
            .map(|run| run.explanations)
    }

    /// Like [`run`](Self::run), also reporting which slides failed.
    ///
    /// A slide counts as failed only when its task errored or panicked, never
    /// because of what a completion happens to say.
    pub async fn run_tracked(
        &self,
        slides: &SlideDeck,
        topic: &str,
        max_retries: u32,
    ) -> Result<CoordinatedRun, ExplainError> {
        let topic: Arc<str> = Arc::from(topic);
        let policy = self.policy.with_max_attempts(max_retries);

        let mut tasks = JoinSet::new();
        let mut task_slides: HashMap<Id, SlideIndex> = HashMap::with_capacity(slides.len());

        for (index, text) in slides.iter() {
            let explainer = self.explainer.clone();
            let policy = policy.clone();
            let topic = Arc::clone(&topic);
            let text = text.to_owned();

            let handle = tasks.spawn(async move {
                let label = format!("slide-{index}");
                let outcome = policy
                    .run(&label, |_| explainer.explain_labelled(&label, &text, &topic))
                    .await;
                (index, outcome)
            });
            task_slides.insert(handle.id(), index);
        }
        debug!(slides = slides.len(), "Spawned slide explanation tasks");

        let mut result = ExplanationResult::new();
        let mut failed = Vec::new();

        while let Some(joined) = tasks.join_next_with_id().await {
            let (index, explanation) = match joined {
                Ok((_, (index, Ok(text)))) => (index, text),
                Ok((_, (index, Err(source)))) => {
                    failed.push(index);
                    (index, failure_sentinel(index, source))
                }
                Err(join_err) => {
                    let Some(&index) = task_slides.get(&join_err.id()) else {
                        error!(task = %join_err.id(), "Slide task finished with unknown id");
                        continue;
                    };
                    failed.push(index);
                    let reason = describe_join_error(join_err);
                    (index, failure_sentinel(index, ExplainError::TaskAborted(reason)))
                }
            };

            if result.insert(index, explanation).is_some() {
                error!(slide = %index, "Slide explanation recorded twice");
            }
        }

        if !result.covers(slides) {
            error!(
                expected = slides.len(),
                collected = result.len(),
                "Explanation key set does not match the deck"
            );
            return Err(ExplainError::Aggregation {
                expected: slides.len(),
                collected: result.len(),
            });
        }

        failed.sort_unstable();
        info!(
            slides = slides.len(),
            failed = failed.len(),
            "Slide explanations collected"
        );
        Ok(CoordinatedRun {
            explanations: result,
            failed,
        })
    }
}

fn failure_sentinel(index: SlideIndex, source: ExplainError) -> String {
    let failure = ExplainError::SlideExplanationFailed {
        index,
        source: Box::new(source),
    };
    let sentinel = failure.to_sentinel();
    warn!(slide = %index, error = %sentinel, "Slide explanation failed");
    sentinel
}

fn describe_join_error(err: JoinError) -> String {
    if err.is_cancelled() {
        return "task was cancelled".to_string();
    }
    match err.try_into_panic() {
        Ok(payload) => format!("task panicked: {}", panic_message(payload.as_ref())),
        Err(err) => err.to_string(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
