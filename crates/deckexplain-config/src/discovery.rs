use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use deckexplain_utils::error::ConfigError;

use super::{CliArgs, Config, ConfigSource, LlmConfig, RetryConfig, ServiceConfig};
use crate::{CONFIG_DIR_NAME, CONFIG_FILE_NAME};

/// TOML configuration file structure. Every field is optional so that a file
/// only overrides what it names.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    llm: Option<TomlLlm>,
    retry: Option<TomlRetry>,
    service: Option<TomlService>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlLlm {
    provider: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    api_key_env: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlRetry {
    max_retries: Option<u32>,
    initial_backoff_secs: Option<u64>,
    backoff_step_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlService {
    uploads_dir: Option<PathBuf>,
    outputs_dir: Option<PathBuf>,
    poll_interval_secs: Option<u64>,
    bind_address: Option<String>,
}

/// Keys tracked for source attribution, in display order.
pub(crate) const TRACKED_KEYS: &[&str] = &[
    "llm.provider",
    "llm.model",
    "llm.base_url",
    "llm.api_key_env",
    "llm.max_tokens",
    "llm.temperature",
    "llm.timeout_secs",
    "retry.max_retries",
    "retry.initial_backoff_secs",
    "retry.backoff_step_secs",
    "service.uploads_dir",
    "service.outputs_dir",
    "service.poll_interval_secs",
    "service.bind_address",
];

/// Overwrite `$target` and record `$key` as coming from `$source` when `$value` is set.
macro_rules! apply {
    ($attr:expr, $source:expr, $key:literal, $target:expr, $value:expr) => {
        if let Some(v) = $value {
            $target = v;
            $attr.insert($key.to_string(), $source.clone());
        }
    };
}

impl Config {
    /// Discover and load configuration with precedence: CLI > file > defaults
    ///
    /// Uses the current working directory for config file discovery when no
    /// explicit path is provided in `cli_args`.
    pub fn discover(cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let start_dir = std::env::current_dir().map_err(|e| {
            ConfigError::InvalidFile(format!("Failed to get current directory: {e}"))
        })?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Path-driven variant of [`Config::discover`] that avoids process-global state.
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let mut source_attribution: HashMap<String, ConfigSource> = TRACKED_KEYS
            .iter()
            .map(|k| ((*k).to_string(), ConfigSource::Default))
            .collect();

        let mut llm = LlmConfig::default();
        let mut retry = RetryConfig::default();
        let mut service = ServiceConfig::default();

        let config_path = match &cli_args.config_path {
            Some(explicit) => {
                if !explicit.exists() {
                    return Err(ConfigError::NotFound {
                        path: explicit.display().to_string(),
                    });
                }
                Some(explicit.clone())
            }
            None => Self::discover_config_file_from(start_dir),
        };

        if let Some(path) = &config_path {
            tracing::debug!(path = %path.display(), "loading config file");
            let file = Self::load_config_file(path)?;
            let src = ConfigSource::Config;
            let attr = &mut source_attribution;

            if let Some(f) = file.llm {
                apply!(attr, src, "llm.provider", llm.provider, f.provider);
                apply!(attr, src, "llm.model", llm.model, f.model);
                apply!(attr, src, "llm.base_url", llm.base_url, f.base_url.map(Some));
                apply!(attr, src, "llm.api_key_env", llm.api_key_env, f.api_key_env);
                apply!(attr, src, "llm.max_tokens", llm.max_tokens, f.max_tokens.map(Some));
                apply!(attr, src, "llm.temperature", llm.temperature, f.temperature.map(Some));
                apply!(attr, src, "llm.timeout_secs", llm.timeout_secs, f.timeout_secs);
            }
            if let Some(f) = file.retry {
                apply!(attr, src, "retry.max_retries", retry.max_retries, f.max_retries);
                apply!(
                    attr,
                    src,
                    "retry.initial_backoff_secs",
                    retry.initial_backoff_secs,
                    f.initial_backoff_secs
                );
                apply!(
                    attr,
                    src,
                    "retry.backoff_step_secs",
                    retry.backoff_step_secs,
                    f.backoff_step_secs
                );
            }
            if let Some(f) = file.service {
                apply!(attr, src, "service.uploads_dir", service.uploads_dir, f.uploads_dir);
                apply!(attr, src, "service.outputs_dir", service.outputs_dir, f.outputs_dir);
                apply!(
                    attr,
                    src,
                    "service.poll_interval_secs",
                    service.poll_interval_secs,
                    f.poll_interval_secs
                );
                apply!(attr, src, "service.bind_address", service.bind_address, f.bind_address);
            }
        }

        let src = ConfigSource::Cli;
        let attr = &mut source_attribution;
        apply!(attr, src, "llm.model", llm.model, cli_args.model.clone());
        apply!(attr, src, "llm.base_url", llm.base_url, cli_args.base_url.clone().map(Some));
        apply!(attr, src, "retry.max_retries", retry.max_retries, cli_args.max_retries);
        apply!(attr, src, "service.uploads_dir", service.uploads_dir, cli_args.uploads_dir.clone());
        apply!(attr, src, "service.outputs_dir", service.outputs_dir, cli_args.outputs_dir.clone());
        apply!(attr, src, "service.bind_address", service.bind_address, cli_args.bind_address.clone());

        let config = Config {
            llm,
            retry,
            service,
            source_attribution,
        };
        config.validate()?;
        Ok(config)
    }

    /// Search upward from `start_dir` for `.deckexplain/config.toml`, stopping
    /// at the filesystem root or the first repository root.
    #[must_use]
    pub fn discover_config_file_from(start_dir: &Path) -> Option<PathBuf> {
        let mut current = Some(start_dir);

        while let Some(dir) = current {
            let candidate = dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if dir.join(".git").exists() || dir.join(".hg").exists() || dir.join(".svn").exists()
            {
                break;
            }
            current = dir.parent();
        }

        None
    }

    fn load_config_file(path: &Path) -> Result<TomlConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::InvalidFile(format!("Failed to read {}: {e}", path.display()))
        })?;
        toml::from_str(&content).map_err(|e| {
            ConfigError::InvalidFile(format!("Failed to parse {}: {e}", path.display()))
        })
    }
}
