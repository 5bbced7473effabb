//! Destinations for finished explanation results.

use camino::{Utf8Path, Utf8PathBuf};
use deckexplain_utils::atomic_write::write_file_atomic;
use deckexplain_utils::error::DeckError;
use deckexplain_utils::types::ExplanationResult;
use std::path::Path;
use tracing::info;

/// Receives the result of a completed run. Called exactly once per run.
pub trait ExplanationSink: Send + Sync {
    /// Persist `result`, returning where it went.
    fn write(&self, result: &ExplanationResult) -> Result<Utf8PathBuf, DeckError>;
}

/// Writes pretty JSON to one explicit path.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: Utf8PathBuf,
}

impl JsonFileSink {
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Sibling of the input deck: `talk.pptx` becomes `talk.json`.
    #[must_use]
    pub fn beside_input(input: &Utf8Path) -> Self {
        Self::new(input.with_extension("json"))
    }

    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl ExplanationSink for JsonFileSink {
    fn write(&self, result: &ExplanationResult) -> Result<Utf8PathBuf, DeckError> {
        write_json(&self.path, result)?;
        Ok(self.path.clone())
    }
}

/// Writes `<outputs_dir>/<stem>.json`, the layout status lookups poll.
#[derive(Debug, Clone)]
pub struct OutputDirSink {
    path: Utf8PathBuf,
}

impl OutputDirSink {
    /// Sink for the upload whose stored name without extension is `stem`.
    pub fn new(outputs_dir: &Path, stem: &str) -> Result<Self, DeckError> {
        let dir = Utf8Path::from_path(outputs_dir).ok_or_else(|| DeckError::OutputWrite {
            path: outputs_dir.to_path_buf(),
            reason: "outputs directory is not valid UTF-8".to_string(),
        })?;
        Ok(Self {
            path: dir.join(format!("{stem}.json")),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl ExplanationSink for OutputDirSink {
    fn write(&self, result: &ExplanationResult) -> Result<Utf8PathBuf, DeckError> {
        write_json(&self.path, result)?;
        Ok(self.path.clone())
    }
}

fn write_json(path: &Utf8Path, result: &ExplanationResult) -> Result<(), DeckError> {
    let output_error = |reason: String| DeckError::OutputWrite {
        path: path.as_std_path().to_path_buf(),
        reason,
    };

    let json = serde_json::to_string_pretty(result).map_err(|e| output_error(e.to_string()))?;
    write_file_atomic(path, &json).map_err(|e| output_error(format!("{e:#}")))?;

    info!(path = %path, slides = result.len(), "Wrote explanations");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckexplain_utils::types::SlideIndex;
    use tempfile::TempDir;

    fn sample() -> ExplanationResult {
        let mut r = ExplanationResult::new();
        r.insert(SlideIndex::new(1).unwrap(), "first".to_string());
        r.insert(SlideIndex::new(2).unwrap(), "second".to_string());
        r
    }

    #[test]
    fn test_beside_input_swaps_extension() {
        let sink = JsonFileSink::beside_input(Utf8Path::new("decks/talk.pptx"));
        assert_eq!(sink.path(), Utf8Path::new("decks/talk.json"));
    }

    #[test]
    fn test_json_file_sink_writes_string_keys() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("talk.json")).unwrap();

        let written = JsonFileSink::new(path.clone()).write(&sample()).unwrap();
        assert_eq!(written, path);

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["1"], "first");
        assert_eq!(value["2"], "second");
    }

    #[test]
    fn test_output_dir_sink_uses_stem() {
        let dir = TempDir::new().unwrap();
        let sink = OutputDirSink::new(&dir.path().join("outputs"), "abc_20240101120000_talk_").unwrap();
        assert!(sink.path().as_str().ends_with("outputs/abc_20240101120000_talk_.json"));

        sink.write(&sample()).unwrap();
        assert!(sink.path().exists());
    }
}
