//! CLI command implementations.
//!
//! Every handler returns `anyhow::Result<()>`; failures that carry an exit
//! code are raised as [`crate::DeckError`] so `run` can map them.

mod config;
mod explain;
mod extract;
mod serve;
mod status;
mod upload;
mod watch;

pub use config::execute_config_command;
pub use explain::execute_explain_command;
pub use extract::execute_extract_command;
pub use serve::execute_serve_command;
pub use status::execute_status_command;
pub use upload::execute_upload_command;
pub use watch::execute_watch_command;
