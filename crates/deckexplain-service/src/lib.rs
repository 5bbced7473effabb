//! File-backed service layer for deckexplain.
//!
//! # Modules
//!
//! - [`uploads`] - Upload directory with uid-stamped file names
//! - [`status`] - Pending/done lookups over the upload and output directories
//! - [`watcher`] - Polling processor that explains new uploads
//! - [`api`] - axum HTTP API exposing upload and status

pub mod api;
pub mod status;
pub mod uploads;
pub mod watcher;

pub use api::{ApiState, router, serve};
pub use status::{StatusReport, StatusService, UploadDetail, UploadStatus};
pub use uploads::{UploadReceipt, UploadStore};
pub use watcher::{ScanReport, UploadWatcher};
