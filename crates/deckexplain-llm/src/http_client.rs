//! Shared HTTP client for HTTP-based LLM providers.
//!
//! Each call performs a single attempt and maps the outcome onto the
//! `LlmError` taxonomy. Retrying is left to the caller's retry policy.

use deckexplain_utils::redaction::redact_error_message;
use reqwest::{Client, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::LlmError;

/// Upper bound on any single request, whatever the invocation asks for.
const DEFAULT_MAX_HTTP_TIMEOUT: Duration = Duration::from_secs(300);

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Characters of an error body kept in the error message.
const ERROR_BODY_EXCERPT: usize = 200;

/// Pooled client owned by one backend. Clones share its connection pool;
/// separately constructed clients do not.
#[derive(Clone)]
pub(crate) struct HttpClient {
    client: Arc<Client>,
    max_timeout: Duration,
}

impl HttpClient {
    pub fn new() -> Result<Self, LlmError> {
        Self::with_max_timeout(DEFAULT_MAX_HTTP_TIMEOUT)
    }

    pub fn with_max_timeout(max_timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(32)
            .build()
            .map_err(|e| LlmError::Misconfiguration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client: Arc::new(client),
            max_timeout,
        })
    }

    /// The underlying client, for building requests.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Execute one request. Non-2xx statuses become `LlmError`s.
    pub async fn send(
        &self,
        request_builder: reqwest::RequestBuilder,
        request_timeout: Duration,
        provider_name: &str,
    ) -> Result<Response, LlmError> {
        let effective_timeout = request_timeout.min(self.max_timeout);

        let request = request_builder
            .timeout(effective_timeout)
            .build()
            .map_err(|e| {
                LlmError::Misconfiguration(format!(
                    "Failed to build {provider_name} request: {}",
                    redact_error_message(&e.to_string())
                ))
            })?;

        debug!(
            provider = provider_name,
            url = %request.url(),
            timeout_secs = effective_timeout.as_secs(),
            "Executing HTTP request"
        );

        let response = self.client.execute(request).await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout {
                    duration: effective_timeout,
                }
            } else {
                LlmError::Transport(format!(
                    "{provider_name} request failed: {}",
                    redact_error_message(&e.to_string())
                ))
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_status_error(status, provider_name, &body))
    }
}

/// Map a non-success HTTP status onto the error taxonomy.
fn map_status_error(status: StatusCode, provider_name: &str, body: &str) -> LlmError {
    let detail = excerpt(body);
    let suffix = if detail.is_empty() {
        String::new()
    } else {
        format!(" ({detail})")
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::ProviderAuth(format!(
            "{provider_name} authentication failed: {status}{suffix}"
        )),
        StatusCode::TOO_MANY_REQUESTS => LlmError::ProviderQuota(format!(
            "{provider_name} rate limit exceeded: {status}{suffix}"
        )),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => LlmError::ProviderOutage(
            format!("{provider_name} timed out upstream: {status}{suffix}"),
        ),
        s if s.is_server_error() => LlmError::ProviderOutage(format!(
            "{provider_name} returned server error: {status}{suffix}"
        )),
        _ => LlmError::Transport(format!(
            "{provider_name} returned client error: {status}{suffix}"
        )),
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    let cut: String = trimmed.chars().take(ERROR_BODY_EXCERPT).collect();
    redact_error_message(&cut)
}
