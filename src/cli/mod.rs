//! Command-line interface for deckexplain
//!
//! ## Module Structure
//!
//! - `args`: CLI argument definitions (clap)
//! - `run`: Entry point, configuration, logging and dispatch
//! - `commands`: Command implementations

pub mod args;
mod commands;
mod run;

pub use args::{Cli, Commands};
pub use run::run;
