use anyhow::Result;
use deckexplain_utils::error::StoreError;

use crate::{Config, DeckError, StatusService};

/// Print the status report for `uid`. An unknown uid still prints the
/// `not found` report before failing with the not-found exit code.
pub fn execute_status_command(uid: &str, config: &Config) -> Result<()> {
    let report = StatusService::from_config(&config.service).lookup(uid)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.is_found() {
        return Err(DeckError::Store(StoreError::NotFound {
            uid: uid.to_string(),
        })
        .into());
    }
    Ok(())
}
