use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::ConfigSource;

pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_INITIAL_BACKOFF_SECS: u64 = 4;
pub const DEFAULT_BACKOFF_STEP_SECS: u64 = 1;

pub const DEFAULT_UPLOADS_DIR: &str = "uploads";
pub const DEFAULT_OUTPUTS_DIR: &str = "outputs";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5000";

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub retry: RetryConfig,
    pub service: ServiceConfig,
    /// Which layer supplied each key, keyed by `section.field`
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// `[llm]` section: which completion service to call and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    /// Base URL of an OpenAI-compatible API; `None` selects the provider default
    pub base_url: Option<String>,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            max_tokens: None,
            temperature: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl LlmConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `[retry]` section: bound and linear backoff for every remote call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per remote query, including the first
    pub max_retries: u32,
    pub initial_backoff_secs: u64,
    pub backoff_step_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff_secs: DEFAULT_INITIAL_BACKOFF_SECS,
            backoff_step_secs: DEFAULT_BACKOFF_STEP_SECS,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_secs(self.initial_backoff_secs)
    }

    #[must_use]
    pub fn backoff_step(&self) -> Duration {
        Duration::from_secs(self.backoff_step_secs)
    }
}

/// `[service]` section: upload and output directories shared by the watcher
/// and the HTTP API, plus the API listen address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub uploads_dir: PathBuf,
    pub outputs_dir: PathBuf,
    pub poll_interval_secs: u64,
    /// `host:port` the HTTP API listens on
    pub bind_address: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            uploads_dir: PathBuf::from(DEFAULT_UPLOADS_DIR),
            outputs_dir: PathBuf::from(DEFAULT_OUTPUTS_DIR),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
        }
    }
}

impl ServiceConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            retry: RetryConfig::default(),
            service: ServiceConfig::default(),
            source_attribution: HashMap::new(),
        }
    }
}

impl Config {
    /// Source of `key`, falling back to `Default` for untracked keys.
    #[must_use]
    pub fn source_of(&self, key: &str) -> ConfigSource {
        self.source_attribution
            .get(key)
            .cloned()
            .unwrap_or(ConfigSource::Default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.llm.timeout(), Duration::from_secs(120));
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.initial_backoff(), Duration::from_secs(4));
        assert_eq!(config.retry.backoff_step(), Duration::from_secs(1));
        assert_eq!(config.service.uploads_dir, PathBuf::from("uploads"));
        assert_eq!(config.service.outputs_dir, PathBuf::from("outputs"));
        assert_eq!(config.service.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.service.bind_address, "127.0.0.1:5000");
        assert_eq!(config.source_of("retry.max_retries"), ConfigSource::Default);
    }
}
