use anyhow::Result;
use tracing::info;

use crate::{Config, DeckError, UploadWatcher};

/// Run the upload watcher, once or until Ctrl-C.
pub async fn execute_watch_command(once: bool, config: &Config) -> Result<()> {
    let backend = crate::llm::from_config(config).map_err(DeckError::from)?;
    let mut watcher = UploadWatcher::from_config(config, backend);

    if once {
        let report = watcher.run_once().await.map_err(DeckError::from)?;
        println!(
            "✓ Processed {} upload(s), {} failed",
            report.processed.len(),
            report.failed.len()
        );
        for (name, reason) in &report.failed {
            println!("  ✗ {name}: {reason}");
        }
        return Ok(());
    }

    watcher
        .run_until(async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
            info!("Shutdown requested");
        })
        .await;
    Ok(())
}
