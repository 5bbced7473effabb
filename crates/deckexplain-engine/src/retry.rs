//! Bounded retry with linear backoff.

use deckexplain_config::RetryConfig;
use deckexplain_utils::error::{ExplainError, LlmError};
use deckexplain_utils::redaction::redact_error_message;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry bound and backoff for remote queries.
///
/// The wait after failed attempt `i` (0-based) is
/// `initial_backoff + i * backoff_step`, so a policy with `max_attempts = N`
/// sleeps `N - 1` times: `w0, w0 + step, ..., w0 + (N - 2) * step`. There is
/// no sleep after the final attempt.
///
/// A policy holds no per-run state; every [`RetryPolicy::run`] counts its own
/// attempts, so one policy can drive any number of concurrent queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// `max_attempts` below 1 is raised to 1.
    #[must_use]
    pub fn new(max_attempts: u32, initial_backoff: Duration, backoff_step: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            backoff_step,
        }
    }

    #[must_use]
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_retries,
            config.initial_backoff(),
            config.backoff_step(),
        )
    }

    /// Same backoff, different bound.
    #[must_use]
    pub fn with_max_attempts(&self, max_attempts: u32) -> Self {
        Self::new(max_attempts, self.initial_backoff, self.backoff_step)
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait after the 0-based failed attempt `failed_attempt`.
    #[must_use]
    pub fn backoff_for(&self, failed_attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_add(self.backoff_step.saturating_mul(failed_attempt))
    }

    /// Every wait a fully failing run would sleep, in order.
    #[must_use]
    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.max_attempts - 1)
            .map(|i| self.backoff_for(i))
            .collect()
    }

    /// Run `op` until it succeeds, fails non-transiently, or the bound is hit.
    ///
    /// `op` receives the 1-based attempt number. `label` tags log events.
    ///
    /// # Errors
    ///
    /// - [`ExplainError::Remote`] on the first non-transient error, with no retry
    /// - [`ExplainError::RetriesExhausted`] after `max_attempts` transient failures
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, ExplainError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let err = match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let message = redact_error_message(&err.to_string());

            if !err.is_transient() {
                warn!(
                    label,
                    attempt,
                    max_attempts = self.max_attempts,
                    error = %message,
                    "Query failed with non-retryable error"
                );
                return Err(ExplainError::Remote(err));
            }

            if attempt >= self.max_attempts {
                warn!(
                    label,
                    attempt,
                    max_attempts = self.max_attempts,
                    error = %message,
                    "Query failed, retries exhausted"
                );
                return Err(ExplainError::RetriesExhausted {
                    attempts: attempt,
                    last: err,
                });
            }

            let wait = self.backoff_for(attempt - 1);
            warn!(
                label,
                attempt,
                max_attempts = self.max_attempts,
                wait_secs = wait.as_secs_f64(),
                error = %message,
                "Query attempt failed, will retry"
            );
            tokio::time::sleep(wait).await;
        }
    }
}
