use anyhow::Result;
use std::path::Path;

use crate::{DeckError, PptxExtractor};

/// Print the slide text mapping of `pptx` as pretty JSON.
pub fn execute_extract_command(pptx: &Path) -> Result<()> {
    let deck = PptxExtractor::new()
        .extract_path(pptx)
        .map_err(DeckError::from)?;
    println!("{}", serde_json::to_string_pretty(&deck)?);
    Ok(())
}
