//! HTTP API over the upload store and status lookups.
//!
//! Two routes:
//!
//! - `POST /upload`: multipart form with a `file` part. Stores the deck and
//!   answers `{"uid": "..."}`, or 400 `{"error": "No file provided"}`.
//! - `GET /status/{uid}`: the [`StatusReport`] for the upload; 404 with
//!   `{"status": "not found"}` when no upload matches.
//!
//! Explaining the uploads is the watcher's job; the API only reads and
//! writes the two directories.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use deckexplain_config::ServiceConfig;
use deckexplain_utils::error::{DeckError, StoreError};
use deckexplain_utils::redaction::redact_error_message;
use serde::Serialize;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::status::{StatusReport, StatusService};
use crate::uploads::UploadStore;

/// Multipart part that carries the deck.
pub const FILE_FIELD: &str = "file";

/// Largest accepted request body.
pub const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct ApiState {
    uploads: UploadStore,
    status: StatusService,
}

impl ApiState {
    #[must_use]
    pub fn new(uploads: UploadStore, outputs_dir: impl Into<PathBuf>) -> Self {
        Self {
            status: StatusService::new(uploads.clone(), outputs_dir),
            uploads,
        }
    }

    #[must_use]
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(UploadStore::from_config(config), config.outputs_dir.clone())
    }
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    uid: String,
}

#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error("No file provided")]
    MissingFile,

    #[error("Malformed upload: {0}")]
    BadRequest(String),

    #[error("Background task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Deck(#[from] DeckError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::MissingFile | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Deck(DeckError::Store(StoreError::InvalidUpload(_))) => StatusCode::BAD_REQUEST,
            Self::Task(_) | Self::Deck(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = redact_error_message(&self.to_string());
        if status.is_server_error() {
            error!(status = %status, error = %message, "API request failed");
        } else {
            warn!(status = %status, error = %message, "API request rejected");
        }
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Router with both routes and the upload size limit applied.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/upload", post(upload))
        .route("/status/{uid}", get(status))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Serve the API on `listener` until `shutdown` resolves.
///
/// In-flight requests are allowed to finish after shutdown is requested.
///
/// # Errors
///
/// I/O errors from the listener.
pub async fn serve<F>(listener: TcpListener, state: ApiState, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(%addr, "HTTP API listening");

    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;

    info!(%addr, "HTTP API stopped");
    Ok(())
}

async fn upload(
    State(state): State<ApiState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let (file_name, bytes) = loop {
        let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?
        else {
            return Err(ApiError::MissingFile);
        };
        if field.name() != Some(FILE_FIELD) {
            debug!(field = ?field.name(), "Ignoring multipart field");
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if file_name.trim().is_empty() {
            return Err(ApiError::MissingFile);
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        break (file_name, bytes);
    };

    let store = state.uploads.clone();
    let receipt = tokio::task::spawn_blocking(move || store.save(&file_name, &bytes))
        .await
        .map_err(|e| ApiError::Task(e.to_string()))?
        .map_err(DeckError::from)?;

    Ok(Json(UploadResponse { uid: receipt.uid }))
}

async fn status(
    State(state): State<ApiState>,
    Path(uid): Path<String>,
) -> Result<(StatusCode, Json<StatusReport>), ApiError> {
    let service = state.status.clone();
    let report = tokio::task::spawn_blocking(move || service.lookup(&uid))
        .await
        .map_err(|e| ApiError::Task(e.to_string()))??;

    let code = if report.is_found() {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };
    Ok((code, Json(report)))
}
