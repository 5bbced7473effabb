use deckexplain_utils::error::ConfigError;
use std::net::SocketAddr;

use super::Config;

pub(crate) const SUPPORTED_PROVIDERS: &[&str] = &["openai"];
pub(crate) const MAX_RETRIES_LIMIT: u32 = 20;
pub(crate) const MAX_BACKOFF_SECS: u64 = 300;

fn invalid(key: &str, value: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.into(),
    }
}

impl Config {
    /// Validate configuration values
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !SUPPORTED_PROVIDERS.contains(&self.llm.provider.as_str()) {
            return Err(invalid(
                "llm.provider",
                format!(
                    "unknown provider '{}', expected one of: {}",
                    self.llm.provider,
                    SUPPORTED_PROVIDERS.join(", ")
                ),
            ));
        }

        if self.llm.model.trim().is_empty() {
            return Err(invalid("llm.model", "must not be empty"));
        }

        if self.llm.api_key_env.trim().is_empty() {
            return Err(invalid("llm.api_key_env", "must not be empty"));
        }

        if let Some(base_url) = &self.llm.base_url
            && !(base_url.starts_with("http://") || base_url.starts_with("https://"))
        {
            return Err(invalid(
                "llm.base_url",
                format!("'{base_url}' must start with http:// or https://"),
            ));
        }

        if let Some(temperature) = self.llm.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(invalid("llm.temperature", "must be between 0.0 and 2.0"));
        }

        if self.llm.max_tokens == Some(0) {
            return Err(invalid("llm.max_tokens", "must be greater than 0"));
        }

        if self.llm.timeout_secs == 0 {
            return Err(invalid("llm.timeout_secs", "must be greater than 0"));
        }

        if self.retry.max_retries == 0 {
            return Err(invalid("retry.max_retries", "must be at least 1"));
        }
        if self.retry.max_retries > MAX_RETRIES_LIMIT {
            return Err(invalid(
                "retry.max_retries",
                format!("exceeds maximum limit of {MAX_RETRIES_LIMIT}"),
            ));
        }

        if self.retry.initial_backoff_secs > MAX_BACKOFF_SECS {
            return Err(invalid(
                "retry.initial_backoff_secs",
                format!("exceeds maximum limit of {MAX_BACKOFF_SECS} seconds"),
            ));
        }
        if self.retry.backoff_step_secs > MAX_BACKOFF_SECS {
            return Err(invalid(
                "retry.backoff_step_secs",
                format!("exceeds maximum limit of {MAX_BACKOFF_SECS} seconds"),
            ));
        }

        if self.service.poll_interval_secs == 0 {
            return Err(invalid("service.poll_interval_secs", "must be at least 1"));
        }

        if self.service.uploads_dir.as_os_str().is_empty() {
            return Err(invalid("service.uploads_dir", "must not be empty"));
        }
        if self.service.outputs_dir.as_os_str().is_empty() {
            return Err(invalid("service.outputs_dir", "must not be empty"));
        }

        if self.service.bind_address.parse::<SocketAddr>().is_err() {
            return Err(invalid(
                "service.bind_address",
                format!("'{}' is not a host:port socket address", self.service.bind_address),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_of(err: ConfigError) -> String {
        match err {
            ConfigError::InvalidValue { key, .. } => key,
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_max_retries_bounds() {
        let mut config = Config::default();
        config.retry.max_retries = 0;
        assert_eq!(key_of(config.validate().unwrap_err()), "retry.max_retries");

        config.retry.max_retries = 21;
        assert_eq!(key_of(config.validate().unwrap_err()), "retry.max_retries");

        config.retry.max_retries = 20;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_provider() {
        let mut config = Config::default();
        config.llm.provider = "carrier-pigeon".to_string();
        assert_eq!(key_of(config.validate().unwrap_err()), "llm.provider");
    }

    #[test]
    fn test_base_url_scheme() {
        let mut config = Config::default();
        config.llm.base_url = Some("localhost:8080".to_string());
        assert_eq!(key_of(config.validate().unwrap_err()), "llm.base_url");

        config.llm.base_url = Some("http://localhost:8080/v1".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_poll_interval_and_backoff_limits() {
        let mut config = Config::default();
        config.service.poll_interval_secs = 0;
        assert_eq!(
            key_of(config.validate().unwrap_err()),
            "service.poll_interval_secs"
        );

        let mut config = Config::default();
        config.retry.initial_backoff_secs = 301;
        assert_eq!(
            key_of(config.validate().unwrap_err()),
            "retry.initial_backoff_secs"
        );

        let mut config = Config::default();
        config.retry.initial_backoff_secs = 0;
        config.retry.backoff_step_secs = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bind_address_must_be_socket_address() {
        let mut config = Config::default();
        config.service.bind_address = "localhost".to_string();
        assert_eq!(key_of(config.validate().unwrap_err()), "service.bind_address");

        config.service.bind_address = "0.0.0.0:8080".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_temperature_range() {
        let mut config = Config::default();
        config.llm.temperature = Some(2.5);
        assert_eq!(key_of(config.validate().unwrap_err()), "llm.temperature");
    }
}
