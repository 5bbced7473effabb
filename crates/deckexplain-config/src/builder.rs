use std::path::PathBuf;
use std::time::Duration;

use deckexplain_utils::error::ConfigError;

use super::discovery::TRACKED_KEYS;
use super::{Config, ConfigSource};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// Use this when embedding deckexplain without config files or CLI flags.
    ///
    /// ```rust
    /// use deckexplain_config::Config;
    /// use std::time::Duration;
    ///
    /// let config = Config::builder()
    ///     .model("gpt-4o-mini")
    ///     .max_retries(5)
    ///     .initial_backoff(Duration::from_secs(1))
    ///     .build()
    ///     .expect("valid config");
    /// assert_eq!(config.retry.max_retries, 5);
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Fluent builder for [`Config`].
///
/// Every value set through the builder is attributed to
/// `ConfigSource::Programmatic`; unset values keep their defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    model: Option<String>,
    base_url: Option<String>,
    api_key_env: Option<String>,
    timeout: Option<Duration>,
    max_retries: Option<u32>,
    initial_backoff: Option<Duration>,
    backoff_step: Option<Duration>,
    uploads_dir: Option<PathBuf>,
    outputs_dir: Option<PathBuf>,
    poll_interval: Option<Duration>,
    bind_address: Option<String>,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn api_key_env(mut self, var: impl Into<String>) -> Self {
        self.api_key_env = Some(var.into());
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = Some(n);
        self
    }

    #[must_use]
    pub fn initial_backoff(mut self, wait: Duration) -> Self {
        self.initial_backoff = Some(wait);
        self
    }

    #[must_use]
    pub fn backoff_step(mut self, step: Duration) -> Self {
        self.backoff_step = Some(step);
        self
    }

    #[must_use]
    pub fn uploads_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.uploads_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn outputs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.outputs_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    #[must_use]
    pub fn bind_address(mut self, addr: impl Into<String>) -> Self {
        self.bind_address = Some(addr.into());
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<Config, ConfigError> {
        let mut config = Config::default();
        for key in TRACKED_KEYS {
            config
                .source_attribution
                .insert((*key).to_string(), ConfigSource::Default);
        }

        let mut set = |key: &str| {
            config
                .source_attribution
                .insert(key.to_string(), ConfigSource::Programmatic);
        };

        if self.model.is_some() {
            set("llm.model");
        }
        if self.base_url.is_some() {
            set("llm.base_url");
        }
        if self.api_key_env.is_some() {
            set("llm.api_key_env");
        }
        if self.timeout.is_some() {
            set("llm.timeout_secs");
        }
        if self.max_retries.is_some() {
            set("retry.max_retries");
        }
        if self.initial_backoff.is_some() {
            set("retry.initial_backoff_secs");
        }
        if self.backoff_step.is_some() {
            set("retry.backoff_step_secs");
        }
        if self.uploads_dir.is_some() {
            set("service.uploads_dir");
        }
        if self.outputs_dir.is_some() {
            set("service.outputs_dir");
        }
        if self.poll_interval.is_some() {
            set("service.poll_interval_secs");
        }
        if self.bind_address.is_some() {
            set("service.bind_address");
        }

        if let Some(model) = self.model {
            config.llm.model = model;
        }
        if let Some(url) = self.base_url {
            config.llm.base_url = Some(url);
        }
        if let Some(var) = self.api_key_env {
            config.llm.api_key_env = var;
        }
        if let Some(timeout) = self.timeout {
            config.llm.timeout_secs = timeout.as_secs();
        }
        if let Some(n) = self.max_retries {
            config.retry.max_retries = n;
        }
        if let Some(wait) = self.initial_backoff {
            config.retry.initial_backoff_secs = wait.as_secs();
        }
        if let Some(step) = self.backoff_step {
            config.retry.backoff_step_secs = step.as_secs();
        }
        if let Some(dir) = self.uploads_dir {
            config.service.uploads_dir = dir;
        }
        if let Some(dir) = self.outputs_dir {
            config.service.outputs_dir = dir;
        }
        if let Some(interval) = self.poll_interval {
            config.service.poll_interval_secs = interval.as_secs();
        }
        if let Some(addr) = self.bind_address {
            config.service.bind_address = addr;
        }

        config.validate()?;
        Ok(config)
    }
}
