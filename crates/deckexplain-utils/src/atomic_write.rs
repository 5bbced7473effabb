//! Atomic file writes: temp file in the target directory, fsync, rename.
//!
//! Readers polling the outputs directory never observe a half-written
//! explanation file.

use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Outcome of [`write_file_atomic`].
#[derive(Debug, Clone, Default)]
pub struct AtomicWriteResult {
    /// Whether the copy fallback was needed because the rename crossed filesystems
    pub used_cross_filesystem_fallback: bool,
    pub bytes_written: usize,
}

/// Atomically replace `path` with `content`, creating parent directories.
pub fn write_file_atomic(path: &Utf8Path, content: &str) -> Result<AtomicWriteResult> {
    let mut result = AtomicWriteResult {
        bytes_written: content.len(),
        ..AtomicWriteResult::default()
    };

    let parent = match path.parent() {
        Some(p) if !p.as_str().is_empty() => p,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create parent directory: {parent}"))?;

    let mut temp_file = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temporary file in: {parent}"))?;
    temp_file
        .write_all(content.as_bytes())
        .context("Failed to write content to temporary file")?;
    temp_file
        .as_file()
        .sync_all()
        .context("Failed to fsync temporary file")?;

    let temp_path = temp_file.path().to_path_buf();
    match temp_file.persist(path.as_std_path()) {
        Ok(_) => {}
        Err(e) if is_cross_filesystem_error(&e.error) => {
            tracing::debug!(target = %path, "rename crossed filesystems, copying instead");
            result.used_cross_filesystem_fallback = true;
            copy_then_persist(&temp_path, path)?;
        }
        Err(e) => {
            return Err(e.error)
                .with_context(|| format!("Failed to atomically write file: {path}"));
        }
    }

    Ok(result)
}

fn is_cross_filesystem_error(err: &std::io::Error) -> bool {
    err.kind() == std::io::ErrorKind::CrossesDevices
}

fn copy_then_persist(temp_path: &Path, target: &Utf8Path) -> Result<()> {
    let target_dir = target.parent().unwrap_or_else(|| Utf8Path::new("."));
    let data = fs::read(temp_path).context("Failed to read temporary file for copy")?;
    let mut target_temp = NamedTempFile::new_in(target_dir)
        .with_context(|| format!("Failed to create temporary file in: {target_dir}"))?;
    target_temp.write_all(&data)?;
    target_temp
        .as_file()
        .sync_all()
        .context("Failed to fsync copied file")?;
    target_temp
        .persist(target.as_std_path())
        .map_err(|e| e.error)
        .context("Failed to persist during cross-filesystem copy")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn utf8_dir(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_atomic_write_basic() {
        let dir = TempDir::new().unwrap();
        let path = utf8_dir(&dir).join("deck.json");

        let result = write_file_atomic(&path, r#"{"1":"hello"}"#).unwrap();
        assert_eq!(result.bytes_written, 13);
        assert!(!result.used_cross_filesystem_fallback);
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"1":"hello"}"#);
    }

    #[test]
    fn test_atomic_write_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = utf8_dir(&dir).join("outputs/nested/deck.json");

        write_file_atomic(&path, "{}").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_atomic_write_overwrites_existing() {
        let dir = TempDir::new().unwrap();
        let path = utf8_dir(&dir).join("deck.json");

        write_file_atomic(&path, "old").unwrap();
        write_file_atomic(&path, "new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");

        let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1, "temp files must not be left behind");
    }

    #[test]
    fn test_atomic_write_unicode_content() {
        let dir = TempDir::new().unwrap();
        let path = utf8_dir(&dir).join("deck.json");

        write_file_atomic(&path, "Photosynthèse → énergie 🌱").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "Photosynthèse → énergie 🌱");
    }
}
