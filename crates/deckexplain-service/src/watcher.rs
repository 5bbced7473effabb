//! Background processing of the upload directory.

use deckexplain_config::Config;
use deckexplain_engine::{ExplanationPipeline, ExplanationSink, OutputDirSink};
use deckexplain_llm::LlmBackend;
use deckexplain_pptx::PptxExtractor;
use deckexplain_utils::error::{DeckError, StoreError};
use deckexplain_utils::redaction::redact_error_message;
use std::collections::HashSet;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::uploads::{UploadStore, stored_stem};

/// Outcome of one scan of the upload directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Stored names explained and written during this scan
    pub processed: Vec<String>,
    /// Stored names that failed, with a redacted reason
    pub failed: Vec<(String, String)>,
}

impl ScanReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processed.is_empty() && self.failed.is_empty()
    }
}

/// Explains every new upload and writes its output for status lookups.
///
/// Each watcher remembers which uploads it has attempted, successful or
/// not, and never retries them. The memory belongs to the instance.
pub struct UploadWatcher {
    uploads: UploadStore,
    outputs_dir: PathBuf,
    pipeline: ExplanationPipeline,
    extractor: PptxExtractor,
    poll_interval: Duration,
    attempted: HashSet<String>,
}

impl UploadWatcher {
    #[must_use]
    pub fn new(
        uploads: UploadStore,
        outputs_dir: impl Into<PathBuf>,
        pipeline: ExplanationPipeline,
        poll_interval: Duration,
    ) -> Self {
        Self {
            uploads,
            outputs_dir: outputs_dir.into(),
            pipeline,
            extractor: PptxExtractor::new(),
            poll_interval,
            attempted: HashSet::new(),
        }
    }

    #[must_use]
    pub fn from_config(config: &Config, backend: Arc<dyn LlmBackend>) -> Self {
        Self::new(
            UploadStore::from_config(&config.service),
            config.service.outputs_dir.clone(),
            ExplanationPipeline::from_config(backend, config),
            config.service.poll_interval(),
        )
    }

    /// Process every upload that has no output and was not attempted yet.
    ///
    /// Uploads are handled one after another. A failing upload is logged and
    /// reported, and the scan moves on.
    ///
    /// # Errors
    ///
    /// Only when the upload directory itself cannot be listed.
    pub async fn run_once(&mut self) -> Result<ScanReport, StoreError> {
        let mut report = ScanReport::default();

        for stored_name in self.uploads.list()? {
            if self.attempted.contains(&stored_name) {
                continue;
            }
            let stem = stored_stem(&stored_name).to_string();
            if self.output_exists(&stem) {
                debug!(upload = %stored_name, "Output already present, skipping");
                self.attempted.insert(stored_name);
                continue;
            }

            self.attempted.insert(stored_name.clone());
            info!(upload = %stored_name, "Processing upload");

            match self.process(&stored_name, &stem).await {
                Ok(()) => report.processed.push(stored_name),
                Err(e) => {
                    let reason = redact_error_message(&e.to_string());
                    warn!(upload = %stored_name, error = %reason, "Upload processing failed");
                    report.failed.push((stored_name, reason));
                }
            }
        }

        if !report.is_empty() {
            info!(
                processed = report.processed.len(),
                failed = report.failed.len(),
                "Upload scan finished"
            );
        }
        Ok(report)
    }

    /// Scan, then sleep `poll_interval`, until `shutdown` resolves.
    ///
    /// Shutdown is observed between scans and while sleeping; an in-flight
    /// upload is finished first.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(
            uploads = %self.uploads.dir().display(),
            outputs = %self.outputs_dir.display(),
            poll_secs = self.poll_interval.as_secs(),
            "Watching upload directory"
        );

        loop {
            if let Err(e) = self.run_once().await {
                warn!(error = %e, "Upload scan failed");
            }

            tokio::select! {
                () = &mut shutdown => break,
                () = tokio::time::sleep(self.poll_interval) => {}
            }
        }
        info!("Upload watcher stopped");
    }

    async fn process(&self, stored_name: &str, stem: &str) -> Result<(), DeckError> {
        let path = self.uploads.path_of(stored_name);
        let extractor = self.extractor;
        let deck = tokio::task::spawn_blocking(move || extractor.extract_path(path))
            .await
            .map_err(|e| DeckError::Io(io::Error::other(e.to_string())))??;

        let explained = self.pipeline.explain_deck(&deck, None).await?;
        let sink = OutputDirSink::new(&self.outputs_dir, stem)?;
        sink.write(&explained.explanations)?;
        Ok(())
    }

    fn output_exists(&self, stem: &str) -> bool {
        OutputDirSink::new(&self.outputs_dir, stem).is_ok_and(|sink| sink.path().exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use deckexplain_engine::{QuerySettings, RetryPolicy};
    use deckexplain_llm::{LlmError, LlmInvocation, LlmResult};
    use deckexplain_pptx::fixtures::build_pptx;
    use std::fs;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::TempDir;

    struct CountingBackend {
        calls: AtomicU32,
    }

    #[async_trait]
    impl LlmBackend for CountingBackend {
        async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = if inv.label == "topic" {
                "Networking".to_string()
            } else {
                format!("explained {}", inv.label)
            };
            Ok(LlmResult::new(reply, "test", "test-model"))
        }
    }

    struct Fixture {
        _root: TempDir,
        uploads: UploadStore,
        outputs: PathBuf,
        backend: Arc<CountingBackend>,
    }

    impl Fixture {
        fn new() -> Self {
            let root = TempDir::new().unwrap();
            let outputs = root.path().join("outputs");
            fs::create_dir_all(&outputs).unwrap();
            Self {
                uploads: UploadStore::new(root.path().join("uploads")),
                outputs,
                backend: Arc::new(CountingBackend {
                    calls: AtomicU32::new(0),
                }),
                _root: root,
            }
        }

        fn watcher(&self) -> UploadWatcher {
            let pipeline = ExplanationPipeline::new(
                self.backend.clone(),
                QuerySettings::default(),
                RetryPolicy::new(1, Duration::ZERO, Duration::ZERO),
            );
            UploadWatcher::new(
                self.uploads.clone(),
                &self.outputs,
                pipeline,
                Duration::from_secs(10),
            )
        }

        fn calls(&self) -> u32 {
            self.backend.calls.load(Ordering::SeqCst)
        }
    }

    #[tokio::test]
    async fn test_run_once_writes_output_for_new_upload() {
        let fx = Fixture::new();
        let deck = build_pptx(&[&["TCP", "handshake"], &[], &["Routing"]]);
        let receipt = fx.uploads.save("talk.pptx", &deck).unwrap();

        let report = fx.watcher().run_once().await.unwrap();

        assert_eq!(report.processed, vec![receipt.stored_name.clone()]);
        assert!(report.failed.is_empty());
        // topic + two slides with text
        assert_eq!(fx.calls(), 3);

        let out = fx
            .outputs
            .join(format!("{}.json", stored_stem(&receipt.stored_name)));
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out).unwrap()).unwrap();
        assert_eq!(value["1"], "explained slide-1");
        assert_eq!(value["3"], "explained slide-3");
        assert!(value["2"].as_str().unwrap().starts_with("No text"));
    }

    #[tokio::test]
    async fn test_failed_upload_is_not_retried_by_same_watcher() {
        let fx = Fixture::new();
        let receipt = fx.uploads.save("notes.txt", b"not a deck").unwrap();
        let mut watcher = fx.watcher();

        let first = watcher.run_once().await.unwrap();
        assert_eq!(first.failed.len(), 1);
        assert_eq!(first.failed[0].0, receipt.stored_name);

        let second = watcher.run_once().await.unwrap();
        assert!(second.is_empty());

        // A fresh watcher has its own memory and tries again.
        let third = fx.watcher().run_once().await.unwrap();
        assert_eq!(third.failed.len(), 1);
        assert_eq!(fx.calls(), 0);
    }

    #[tokio::test]
    async fn test_existing_output_is_skipped() {
        let fx = Fixture::new();
        let receipt = fx.uploads.save("talk.pptx", &build_pptx(&[&["x"]])).unwrap();
        let stem = stored_stem(&receipt.stored_name);
        fs::write(fx.outputs.join(format!("{stem}.json")), "{}").unwrap();

        let report = fx.watcher().run_once().await.unwrap();
        assert!(report.is_empty());
        assert_eq!(fx.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_stops_on_shutdown() {
        let fx = Fixture::new();
        fx.uploads.save("talk.pptx", &build_pptx(&[&["x"]])).unwrap();
        let mut watcher = fx.watcher();

        watcher
            .run_until(tokio::time::sleep(Duration::from_secs(25)))
            .await;

        // Processed on the first scan only; later scans find nothing new.
        assert_eq!(fx.calls(), 2);
    }
}
