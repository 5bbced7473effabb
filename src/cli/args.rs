//! CLI argument definitions and parsing structures

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::CliArgs;

/// deckexplain - LLM explanations for every slide of a PPTX deck
#[derive(Parser, Debug)]
#[command(name = "deckexplain")]
#[command(about = "Generate an expanded explanation for every slide of a PPTX deck")]
#[command(long_about = r#"
deckexplain extracts the text of each slide, asks a language model for the
deck's main topic, and explains every slide concurrently in that context.

EXAMPLES:
  # Explain a deck, writing talk.json next to it
  deckexplain explain talk.pptx

  # Skip topic resolution and write somewhere else
  deckexplain explain talk.pptx --topic Networking --output out.json

  # Queue a deck, process the queue once, then poll
  deckexplain upload talk.pptx
  deckexplain watch --once
  deckexplain status 3f2b...

  # Accept uploads over HTTP and explain them in the background
  deckexplain serve --bind 0.0.0.0:5000 --watch

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > config file > defaults
  Config file is discovered by searching upward from CWD for .deckexplain/config.toml
  The API key is read from the variable named by llm.api_key_env (OPENAI_API_KEY)
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Model to use for completions
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Maximum attempts per remote query (topic and each slide)
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Directory holding uploaded decks
    #[arg(long, global = true)]
    pub uploads_dir: Option<PathBuf>,

    /// Directory receiving explanation JSON for uploads
    #[arg(long, global = true)]
    pub outputs_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the text of every slide as JSON
    Extract {
        /// Deck to read
        pptx: PathBuf,
    },

    /// Explain every slide of a deck and write the result as JSON
    Explain {
        /// Deck to explain
        pptx: PathBuf,

        /// Use this topic instead of asking the model for one
        #[arg(long)]
        topic: Option<String>,

        /// Output path (default: the deck path with a .json extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Copy a deck into the uploads directory and print its uid
    Upload {
        /// File to upload
        file: PathBuf,
    },

    /// Report the processing status of an upload
    Status {
        /// uid printed by `upload`
        uid: String,
    },

    /// Explain new uploads as they appear
    Watch {
        /// Process the current uploads once and exit
        #[arg(long)]
        once: bool,
    },

    /// Serve the HTTP API: POST /upload and GET /status/{uid}
    Serve {
        /// Listen address, host:port (default: service.bind_address)
        #[arg(long)]
        bind: Option<String>,

        /// Also run the upload watcher in this process
        #[arg(long)]
        watch: bool,
    },

    /// Show the effective configuration and where each value came from
    Config,
}

impl Cli {
    /// Configuration overrides carried by the global flags.
    #[must_use]
    pub fn config_overrides(&self) -> CliArgs {
        CliArgs {
            config_path: self.config.clone(),
            model: self.model.clone(),
            max_retries: self.max_retries,
            base_url: self.base_url.clone(),
            uploads_dir: self.uploads_dir.clone(),
            outputs_dir: self.outputs_dir.clone(),
            bind_address: match &self.command {
                Commands::Serve { bind, .. } => bind.clone(),
                _ => None,
            },
        }
    }
}
