//! Explanation engine for deckexplain.
//!
//! Resolves a presentation's topic, then explains every slide concurrently
//! under a bounded retry policy. Per-slide failures are isolated into
//! sentinel strings so one run always yields one entry per slide.

pub mod coordinator;
pub mod explainer;
pub mod pipeline;
pub mod query;
pub mod retry;
pub mod sink;
pub mod topic;

#[cfg(test)]
mod testing;

pub use coordinator::{CoordinatedRun, PresentationExplanationCoordinator};
pub use explainer::SlideExplainer;
pub use pipeline::{DeckExplanation, ExplanationPipeline};
pub use query::QuerySettings;
pub use retry::RetryPolicy;
pub use sink::{ExplanationSink, JsonFileSink, OutputDirSink};
pub use topic::TopicResolver;
