//! `deckexplain serve`

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use crate::{ApiState, Config, DeckError, UploadWatcher};

/// Serve the HTTP API until Ctrl-C, optionally with an in-process watcher.
pub async fn execute_serve_command(with_watcher: bool, config: &Config) -> Result<()> {
    let bind = config.service.bind_address.as_str();

    // Build the watcher first so a missing API key fails before binding.
    let watcher = if with_watcher {
        let backend = crate::llm::from_config(config).map_err(DeckError::from)?;
        Some(UploadWatcher::from_config(config, backend))
    } else {
        None
    };

    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind HTTP API to {bind}"))?;
    println!("✓ Listening on http://{}", listener.local_addr()?);

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            stop_tx.send_replace(true);
        }
    });

    let api = deckexplain_service::serve(
        listener,
        ApiState::from_config(&config.service),
        stopped(stop_rx.clone()),
    );

    match watcher {
        Some(mut watcher) => {
            let (served, ()) = tokio::join!(api, watcher.run_until(stopped(stop_rx)));
            served?;
        }
        None => api.await?,
    }
    Ok(())
}

async fn stopped(mut rx: watch::Receiver<bool>) {
    // A dropped sender means Ctrl-C handling is gone; keep running.
    if rx.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}
