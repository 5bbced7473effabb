//! CLI entry point and dispatch logic
//!
//! `run()` parses arguments, initialises logging, discovers configuration,
//! creates the tokio runtime and dispatches to a command. It owns all error
//! output; `main` only maps the returned code to the process exit status.

use anyhow::Result;
use clap::Parser;
use deckexplain_utils::logging::init_tracing;
use deckexplain_utils::redaction::redact_error_message;

use super::args::{Cli, Commands};
use super::commands;
use crate::{Config, DeckError, ExitCode};

/// Main CLI execution function.
///
/// Returns `Ok(())` after printing any output, or the exit code matching the
/// failure after printing a user-facing report to stderr.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("⚠ Logging disabled: {e}");
    }

    let config = match Config::discover(&cli.config_overrides()) {
        Ok(config) => config,
        Err(err) => {
            let err = DeckError::Config(err);
            eprintln!("{}", err.display_for_user());
            return Err(err.to_exit_code());
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("✗ Failed to create async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    let operation = match &cli.command {
        Commands::Extract { .. } => "extract",
        Commands::Explain { .. } => "explain",
        Commands::Upload { .. } => "upload",
        Commands::Status { .. } => "status",
        Commands::Watch { .. } => "watch",
        Commands::Serve { .. } => "serve",
        Commands::Config => "config",
    };
    tracing::debug!(operation, "Dispatching command");

    let result = rt.block_on(async {
        match cli.command {
            Commands::Extract { pptx } => commands::execute_extract_command(&pptx),
            Commands::Explain {
                pptx,
                topic,
                output,
            } => commands::execute_explain_command(&pptx, topic, output, &config).await,
            Commands::Upload { file } => commands::execute_upload_command(&file, &config),
            Commands::Status { uid } => commands::execute_status_command(&uid, &config),
            Commands::Watch { once } => commands::execute_watch_command(once, &config).await,
            Commands::Serve { watch, .. } => commands::execute_serve_command(watch, &config).await,
            Commands::Config => commands::execute_config_command(&config),
        }
    });

    if let Err(error) = result {
        if let Some(deck_error) = error.downcast_ref::<DeckError>() {
            eprintln!("{}", redact_error_message(&deck_error.display_for_user()));
            return Err(deck_error.to_exit_code());
        }

        eprintln!(
            "✗ Unexpected error during {operation}: {}",
            redact_error_message(&format!("{error:#}"))
        );
        eprintln!("\n  Run with --verbose for more detailed output");
        return Err(ExitCode::INTERNAL);
    }

    Ok(())
}
