//! LLM backends for deckexplain.
//!
//! The engine talks to a completion service only through [`LlmBackend`].
//! [`from_config`] constructs the production backend selected by `[llm]
//! provider`; tests substitute their own implementations.

pub(crate) mod http_client;
mod openai_backend;
mod types;

pub use deckexplain_config as config;
pub use deckexplain_utils::error::LlmError;
pub use types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};

pub(crate) use openai_backend::OpenAiBackend;

use std::sync::Arc;

use crate::config::Config;

/// Providers accepted by [`from_config`].
pub const SUPPORTED_PROVIDERS: &[&str] = &["openai"];

fn construct_backend_for_provider(
    provider: &str,
    config: &Config,
) -> Result<Arc<dyn LlmBackend>, LlmError> {
    match provider {
        "openai" => Ok(Arc::new(OpenAiBackend::new_from_config(config)?)),
        unknown => Err(LlmError::Unsupported(format!(
            "Unknown LLM provider '{unknown}'. Supported providers: {}.",
            SUPPORTED_PROVIDERS.join(", ")
        ))),
    }
}

/// Build the backend named by `config.llm.provider`.
///
/// # Errors
///
/// `Misconfiguration` when the API key variable is unset or the HTTP client
/// cannot be built; `Unsupported` for unknown providers.
pub fn from_config(config: &Config) -> Result<Arc<dyn LlmBackend>, LlmError> {
    let provider = config.llm.provider.as_str();
    tracing::debug!(provider, model = %config.llm.model, "constructing LLM backend");
    construct_backend_for_provider(provider, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_guard() -> std::sync::MutexGuard<'static, ()> {
        ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    #[test]
    fn test_unknown_provider_is_unsupported() {
        let mut config = Config::default();
        config.llm.provider = "carrier-pigeon".to_string();
        match from_config(&config) {
            Err(LlmError::Unsupported(msg)) => assert!(msg.contains("carrier-pigeon")),
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[test]
    fn test_missing_api_key_is_misconfiguration() {
        let _guard = env_guard();
        let mut config = Config::default();
        config.llm.api_key_env = "DECKEXPLAIN_TEST_MISSING_KEY".to_string();

        // SAFETY: env mutation is serialized by env_guard.
        unsafe {
            std::env::remove_var("DECKEXPLAIN_TEST_MISSING_KEY");
        }

        match from_config(&config) {
            Err(err @ LlmError::Misconfiguration(_)) => {
                assert!(!err.is_transient());
                assert!(err.to_string().contains("DECKEXPLAIN_TEST_MISSING_KEY"));
            }
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[test]
    fn test_backend_constructed_when_key_present() {
        let _guard = env_guard();
        let mut config = Config::default();
        config.llm.api_key_env = "DECKEXPLAIN_TEST_PRESENT_KEY".to_string();

        // SAFETY: env mutation is serialized by env_guard.
        unsafe {
            std::env::set_var("DECKEXPLAIN_TEST_PRESENT_KEY", "sk-test");
        }
        let result = from_config(&config);
        unsafe {
            std::env::remove_var("DECKEXPLAIN_TEST_PRESENT_KEY");
        }

        assert!(result.is_ok());
    }
}
