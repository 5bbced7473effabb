//! deckexplain - LLM explanations for every slide of a PPTX deck
//!
//! deckexplain extracts the text of each slide, asks a language model for the
//! deck's main topic, then explains every slide concurrently in the context
//! of that topic. Remote calls are retried with a linear backoff; a slide
//! that still fails gets an `ERROR - ...` entry instead of sinking the run.
//!
//! deckexplain can be used in two ways:
//! - **CLI**: run `deckexplain explain talk.pptx` to write `talk.json`
//! - **HTTP**: run `deckexplain serve` to accept uploads and answer status polls
//! - **Library**: build an [`ExplanationPipeline`] around any [`LlmBackend`]
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! export OPENAI_API_KEY=...
//!
//! # Print the extracted slide text
//! deckexplain extract talk.pptx
//!
//! # Explain every slide, writing talk.json
//! deckexplain explain talk.pptx
//!
//! # Queue a deck for the watcher, then poll for the result
//! deckexplain upload talk.pptx
//! deckexplain watch --once
//! deckexplain status <uid>
//!
//! # Or run the HTTP API (POST /upload, GET /status/{uid}) with a watcher
//! deckexplain serve --watch
//! ```
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use deckexplain::{Config, ExplanationPipeline, PptxExtractor};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::builder().max_retries(5).build()?;
//! let backend = deckexplain::llm::from_config(&config)?;
//! let pipeline = ExplanationPipeline::from_config(backend, &config);
//!
//! let deck = PptxExtractor::new().extract_path("talk.pptx")?;
//! let explained = pipeline.explain_deck(&deck, None).await?;
//! for (slide, text) in explained.explanations.iter() {
//!     println!("{slide}: {text}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Output
//!
//! Results serialize as a JSON object keyed by 1-based slide number:
//!
//! ```json
//! { "1": "An explanation...", "2": "No text in the slide - unable to generate explanation" }
//! ```

pub mod cli;

pub use deckexplain_config::{CliArgs, Config, ConfigBuilder};
pub use deckexplain_engine::{
    DeckExplanation, ExplanationPipeline, ExplanationSink, JsonFileSink, OutputDirSink,
    PresentationExplanationCoordinator, QuerySettings, RetryPolicy, SlideExplainer,
    TopicResolver,
};
pub use deckexplain_llm::{LlmBackend, LlmError, LlmInvocation, LlmResult, Message, Role};
pub use deckexplain_pptx::PptxExtractor;
pub use deckexplain_service::{ApiState, StatusReport, StatusService, UploadStore, UploadWatcher};
pub use deckexplain_utils::error::{DeckError, ExplainError, NO_TEXT_EXPLANATION};
pub use deckexplain_utils::exit_codes::ExitCode;
pub use deckexplain_utils::types::{ExplanationResult, SlideDeck, SlideIndex};

/// LLM backends and their construction from configuration.
pub mod llm {
    pub use deckexplain_llm::from_config;
}
