//! Configuration management for deckexplain
//!
//! Hierarchical configuration with discovery and precedence:
//! CLI > file > defaults. The TOML file supports `[llm]`, `[retry]` and
//! `[service]` sections.

mod builder;
mod cli_args;
mod discovery;
mod model;
mod sources;
mod validation;

pub use builder::ConfigBuilder;
pub use cli_args::CliArgs;
pub use model::*;
pub use deckexplain_utils::types::ConfigSource;

/// Directory searched for during discovery.
pub const CONFIG_DIR_NAME: &str = ".deckexplain";

/// File name inside [`CONFIG_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "config.toml";
