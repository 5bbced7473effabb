//! Status of an upload, derived from the upload and output directories.
//!
//! An output file is written once, atomically, when a deck finishes. A
//! lookup therefore sees either no output (`pending`) or a complete one
//! (`done`).

use deckexplain_config::ServiceConfig;
use deckexplain_engine::OutputDirSink;
use deckexplain_utils::error::{DeckError, StoreError};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::debug;

use crate::uploads::{UploadStore, stored_stem, upload_time};

/// Display format for the upload time in a report.
pub const REPORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UploadStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "done")]
    Done,
    #[serde(rename = "not found")]
    NotFound,
}

/// Details present for any upload that exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadDetail {
    /// Stored name without its extension
    pub filename: String,
    pub timestamp: String,
    /// `null` until the output exists, then the parsed explanation mapping
    pub explanation: Option<Value>,
}

/// Serialized as `{"status": "not found"}` or
/// `{"status", "filename", "timestamp", "explanation"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub status: UploadStatus,
    #[serde(flatten)]
    pub detail: Option<UploadDetail>,
}

impl StatusReport {
    #[must_use]
    pub fn not_found() -> Self {
        Self {
            status: UploadStatus::NotFound,
            detail: None,
        }
    }

    #[must_use]
    pub fn is_found(&self) -> bool {
        self.status != UploadStatus::NotFound
    }
}

#[derive(Debug, Clone)]
pub struct StatusService {
    uploads: UploadStore,
    outputs_dir: PathBuf,
}

impl StatusService {
    #[must_use]
    pub fn new(uploads: UploadStore, outputs_dir: impl Into<PathBuf>) -> Self {
        Self {
            uploads,
            outputs_dir: outputs_dir.into(),
        }
    }

    #[must_use]
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(UploadStore::from_config(config), config.outputs_dir.clone())
    }

    /// Report on the upload whose stored name contains `uid`.
    ///
    /// # Errors
    ///
    /// - [`DeckError::Store`] with [`StoreError::CorruptOutput`] when the output is not a JSON object
    /// - [`DeckError::Store`] with [`StoreError::InvalidUpload`] when the stored name carries no timestamp
    /// - I/O failures reading either directory
    pub fn lookup(&self, uid: &str) -> Result<StatusReport, DeckError> {
        let Some(stored_name) = self.uploads.find(uid)? else {
            debug!(uid = %uid, "No upload matches uid");
            return Ok(StatusReport::not_found());
        };

        let filename = stored_stem(&stored_name).to_string();
        let timestamp = upload_time(&stored_name)
            .ok_or_else(|| {
                StoreError::InvalidUpload(format!("{stored_name} has no upload timestamp"))
            })?
            .format(REPORT_TIMESTAMP_FORMAT)
            .to_string();

        let output = OutputDirSink::new(&self.outputs_dir, &filename)?;
        let explanation = match fs::read_to_string(output.path()) {
            Ok(raw) => Some(parse_output(&filename, &raw)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(source) => {
                return Err(StoreError::Io {
                    path: output.path().as_std_path().to_path_buf(),
                    source,
                }
                .into());
            }
        };

        let status = if explanation.is_some() {
            UploadStatus::Done
        } else {
            UploadStatus::Pending
        };
        debug!(uid = %uid, filename = %filename, ?status, "Resolved upload status");

        Ok(StatusReport {
            status,
            detail: Some(UploadDetail {
                filename,
                timestamp,
                explanation,
            }),
        })
    }
}

fn parse_output(filename: &str, raw: &str) -> Result<Value, StoreError> {
    let corrupt = |reason: String| StoreError::CorruptOutput {
        filename: filename.to_string(),
        reason,
    };
    let value: Value = serde_json::from_str(raw).map_err(|e| corrupt(e.to_string()))?;
    if !value.is_object() {
        return Err(corrupt("expected a JSON object".to_string()));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    struct Dirs {
        _root: TempDir,
        service: StatusService,
        uploads: UploadStore,
        outputs: PathBuf,
    }

    fn dirs() -> Dirs {
        let root = TempDir::new().unwrap();
        let uploads = UploadStore::new(root.path().join("uploads"));
        let outputs = root.path().join("outputs");
        fs::create_dir_all(&outputs).unwrap();
        Dirs {
            service: StatusService::new(uploads.clone(), &outputs),
            uploads,
            outputs,
            _root: root,
        }
    }

    #[test]
    fn test_unknown_uid_is_not_found() {
        let d = dirs();
        let report = d.service.lookup("missing").unwrap();
        assert!(!report.is_found());
        assert_eq!(serde_json::to_value(&report).unwrap(), json!({"status": "not found"}));
    }

    #[test]
    fn test_pending_until_output_exists() {
        let d = dirs();
        let receipt = d.uploads.save("talk.pptx", b"x").unwrap();

        let report = d.service.lookup(&receipt.uid).unwrap();
        assert_eq!(report.status, UploadStatus::Pending);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["status"], "pending");
        assert_eq!(value["filename"], stored_stem(&receipt.stored_name));
        assert_eq!(value["explanation"], Value::Null);
        let ts = value["timestamp"].as_str().unwrap();
        assert_eq!(ts.len(), "2024-05-01 09:30:00".len());
    }

    #[test]
    fn test_done_carries_parsed_explanation() {
        let d = dirs();
        let receipt = d.uploads.save("talk.pptx", b"x").unwrap();
        let stem = stored_stem(&receipt.stored_name);
        fs::write(
            d.outputs.join(format!("{stem}.json")),
            r#"{"1": "first", "2": "second"}"#,
        )
        .unwrap();

        let report = d.service.lookup(&receipt.uid).unwrap();
        assert_eq!(report.status, UploadStatus::Done);
        let detail = report.detail.unwrap();
        assert_eq!(detail.explanation, Some(json!({"1": "first", "2": "second"})));
    }

    #[test]
    fn test_corrupt_output_is_an_error() {
        let d = dirs();
        let receipt = d.uploads.save("talk.pptx", b"x").unwrap();
        let stem = stored_stem(&receipt.stored_name);
        fs::write(d.outputs.join(format!("{stem}.json")), "{not json").unwrap();

        let err = d.service.lookup(&receipt.uid).unwrap_err();
        assert!(matches!(
            err,
            DeckError::Store(StoreError::CorruptOutput { .. })
        ));
    }

    #[test]
    fn test_timestamp_is_reformatted() {
        let d = dirs();
        fs::create_dir_all(d.uploads.dir()).unwrap();
        fs::write(
            d.uploads.path_of("abc123_20240501093000_talk_.pptx"),
            b"x",
        )
        .unwrap();

        let report = d.service.lookup("abc123").unwrap();
        let detail = report.detail.unwrap();
        assert_eq!(detail.filename, "abc123_20240501093000_talk_");
        assert_eq!(detail.timestamp, "2024-05-01 09:30:00");
    }
}
