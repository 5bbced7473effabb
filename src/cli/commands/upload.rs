use anyhow::Result;
use serde_json::json;
use std::fs;
use std::path::Path;

use crate::{Config, DeckError, UploadStore};

/// Copy `file` into the uploads directory and print `{"uid": ...}`.
pub fn execute_upload_command(file: &Path, config: &Config) -> Result<()> {
    let bytes = fs::read(file).map_err(DeckError::from)?;
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let receipt = UploadStore::from_config(&config.service)
        .save(&name, &bytes)
        .map_err(DeckError::from)?;

    println!("{}", json!({ "uid": receipt.uid }));
    Ok(())
}
