//! `deckexplain explain`

use anyhow::Result;
use camino::Utf8PathBuf;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::{Config, DeckError, ExplanationPipeline, ExplanationSink, JsonFileSink, PptxExtractor};

/// Explain every slide of `pptx` and write the mapping as JSON.
///
/// Per-slide failures end up as `ERROR - ...` entries and do not change the
/// exit status; they are counted in the summary line.
pub async fn execute_explain_command(
    pptx: &Path,
    topic: Option<String>,
    output: Option<PathBuf>,
    config: &Config,
) -> Result<()> {
    let sink = match output {
        Some(path) => JsonFileSink::new(utf8(path)?),
        None => JsonFileSink::beside_input(&utf8(pptx.to_path_buf())?),
    };

    let deck = PptxExtractor::new()
        .extract_path(pptx)
        .map_err(DeckError::from)?;
    info!(path = %pptx.display(), slides = deck.len(), "Extracted deck");

    let backend = crate::llm::from_config(config).map_err(DeckError::from)?;
    let pipeline = ExplanationPipeline::from_config(backend, config);
    let explained = pipeline
        .explain_deck(&deck, topic)
        .await
        .map_err(DeckError::from)?;

    let written = sink.write(&explained.explanations)?;

    let failed = explained.failed.len();
    let topic = explained.topic.as_deref().unwrap_or("-").trim();
    println!(
        "✓ Explained {} slides (topic: {topic}) → {written}",
        explained.explanations.len()
    );
    if failed > 0 {
        println!("  {failed} slide(s) could not be explained; see the ERROR entries");
    }
    Ok(())
}

fn utf8(path: PathBuf) -> Result<Utf8PathBuf, DeckError> {
    Utf8PathBuf::from_path_buf(path).map_err(|path| DeckError::OutputWrite {
        path,
        reason: "path is not valid UTF-8".to_string(),
    })
}
