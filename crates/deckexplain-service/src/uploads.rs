//! Upload directory: stores submitted decks under unique, timestamped names.
//!
//! A stored name has the shape `{uid}_{YYYYmmddHHMMSS}_{stem}_{ext}` where
//! `ext` keeps its leading dot, e.g. `9f1c…_20240501093000_talk_.pptx`.
//! Status lookups and the watcher both rely on this layout.

use chrono::{Local, NaiveDateTime};
use deckexplain_config::ServiceConfig;
use deckexplain_utils::error::StoreError;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use uuid::Uuid;

/// Timestamp format embedded in stored names.
pub const NAME_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// What the caller gets back after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    pub uid: String,
    pub stored_name: String,
    /// Compact `YYYYmmddHHMMSS` form, as embedded in the name.
    pub timestamp: String,
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(config.uploads_dir.clone())
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store `bytes` under a fresh uid. Only the final component of
    /// `original_filename` is used. The file appears atomically.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidUpload`] when the filename is empty or names no file
    /// - [`StoreError::Io`] when the directory or file cannot be written
    pub fn save(&self, original_filename: &str, bytes: &[u8]) -> Result<UploadReceipt, StoreError> {
        let file_name = Path::new(original_filename)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| {
                StoreError::InvalidUpload(format!("no usable file name in {original_filename:?}"))
            })?;

        let uid = Uuid::new_v4().to_string();
        let timestamp = Local::now().format(NAME_TIMESTAMP_FORMAT).to_string();
        let stored_name = stored_name(&uid, &timestamp, file_name);

        fs::create_dir_all(&self.dir).map_err(|source| self.io_error(&self.dir, source))?;
        let target = self.dir.join(&stored_name);
        write_new_file(&self.dir, &target, bytes).map_err(|source| self.io_error(&target, source))?;

        info!(uid = %uid, stored_name = %stored_name, bytes = bytes.len(), "Stored upload");
        Ok(UploadReceipt {
            uid,
            stored_name,
            timestamp,
        })
    }

    /// Stored names in the upload directory, sorted. A missing directory
    /// holds no uploads. Dotfiles (in-flight temporaries) are skipped.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(self.io_error(&self.dir, source)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| self.io_error(&self.dir, source))?;
            if !entry.file_type().is_ok_and(|t| t.is_file()) {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) if !name.starts_with('.') => names.push(name),
                Ok(_) => {}
                Err(raw) => debug!(name = ?raw, "Skipping non UTF-8 upload name"),
            }
        }
        names.sort();
        Ok(names)
    }

    /// First stored name (in sorted order) that contains `uid`.
    ///
    /// A blank `uid` matches nothing.
    pub fn find(&self, uid: &str) -> Result<Option<String>, StoreError> {
        let uid = uid.trim();
        if uid.is_empty() {
            return Ok(None);
        }
        Ok(self.list()?.into_iter().find(|name| name.contains(uid)))
    }

    #[must_use]
    pub fn path_of(&self, stored_name: &str) -> PathBuf {
        self.dir.join(stored_name)
    }

    fn io_error(&self, path: &Path, source: io::Error) -> StoreError {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Stored name with its extension removed; the key for the output file.
#[must_use]
pub fn stored_stem(stored_name: &str) -> &str {
    Path::new(stored_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(stored_name)
}

/// Upload time embedded in a stored name, if it has the expected shape.
#[must_use]
pub fn upload_time(stored_name: &str) -> Option<NaiveDateTime> {
    let (_, rest) = stored_name.split_once('_')?;
    let (stamp, _) = rest.split_once('_')?;
    NaiveDateTime::parse_from_str(stamp, NAME_TIMESTAMP_FORMAT).ok()
}

fn stored_name(uid: &str, timestamp: &str, file_name: &str) -> String {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    format!("{uid}_{timestamp}_{stem}_{ext}")
}

fn write_new_file(dir: &Path, target: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist_noclobber(target).map_err(|e| e.error)?;
    Ok(())
}
