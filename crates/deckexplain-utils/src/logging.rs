//! Tracing setup for deckexplain binaries.
//!
//! Library crates only emit `tracing` events; the subscriber is installed
//! once by the CLI through [`init_tracing`].

use std::io::IsTerminal;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

fn use_color() -> bool {
    std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Directive used when `RUST_LOG` is unset.
#[must_use]
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "deckexplain=debug,info"
    } else {
        "deckexplain=info,warn"
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `verbose`. Verbose mode adds targets and
/// span close events with timings. Logs go to stderr so that stdout stays
/// reserved for JSON output.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(verbose)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(use_color())
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_line_number(false)
        .with_file(false);

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                layer
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.with_target(false).compact())
            .try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_directives_parse() {
        for verbose in [true, false] {
            assert!(EnvFilter::try_new(default_filter(verbose)).is_ok());
        }
        assert!(default_filter(true).contains("debug"));
    }
}
