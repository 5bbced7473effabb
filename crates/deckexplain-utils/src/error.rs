use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::exit_codes::ExitCode;
use crate::types::SlideIndex;

/// Library-level error type with rich context and user-friendly reporting.
///
/// `DeckError` is the primary error type returned by deckexplain library
/// operations that cross crate boundaries (the CLI, the upload watcher).
///
/// # Error Categories
///
/// | Category | Description |
/// |----------|-------------|
/// | `Config` | Configuration file or CLI argument errors |
/// | `Extraction` | The deck could not be read or parsed |
/// | `Explain` | Topic or explanation generation failed |
/// | `Llm` | The language-model backend could not be constructed |
/// | `Store` | Upload/status directory errors |
///
/// # Exit Code Mapping
///
/// | Exit Code | Error Type |
/// |-----------|------------|
/// | 2 | Configuration/CLI argument errors |
/// | 3 | Invalid input or unreadable deck |
/// | 4 | Topic resolution failed |
/// | 5 | Upload not found |
/// | 70 | LLM backend failure |
/// | 1 | Other errors |
///
/// Library code returns `DeckError` and does NOT call `std::process::exit()`.
#[derive(Error, Debug)]
pub enum DeckError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Deck extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Explanation error: {0}")]
    Explain(#[from] ExplainError),

    #[error("LLM backend error: {0}")]
    Llm(#[from] LlmError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to write output {path}: {reason}")]
    OutputWrite { path: PathBuf, reason: String },
}

impl DeckError {
    /// Map this error to the CLI exit code.
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) => ExitCode::CLI_ARGS,
            Self::Extraction(_) => ExitCode::INVALID_INPUT,
            Self::Explain(ExplainError::InvalidInput(_)) => ExitCode::INVALID_INPUT,
            Self::Explain(ExplainError::TopicResolutionFailed { .. }) => {
                ExitCode::TOPIC_RESOLUTION
            }
            Self::Explain(_) | Self::Llm(_) => ExitCode::LLM_FAILURE,
            Self::Store(StoreError::NotFound { .. }) => ExitCode::NOT_FOUND,
            Self::Store(StoreError::InvalidUpload(_)) => ExitCode::INVALID_INPUT,
            Self::Store(_) | Self::Io(_) | Self::OutputWrite { .. } => ExitCode::INTERNAL,
        }
    }

    /// Render the error with context and suggestions for terminal output.
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut out = format!("✗ {}", self.user_message());
        if let Some(context) = self.context() {
            out.push_str(&format!("\n  {context}"));
        }
        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            out.push_str("\n\nSuggestions:");
            for s in suggestions {
                out.push_str(&format!("\n  • {s}"));
            }
        }
        out
    }
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    LlmIntegration,
    FileSystem,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Input => write!(f, "Input"),
            Self::LlmIntegration => write!(f, "LLM Integration"),
            Self::FileSystem => write!(f, "File System"),
        }
    }
}

impl UserFriendlyError for DeckError {
    fn user_message(&self) -> String {
        match self {
            Self::Config(e) => e.user_message(),
            Self::Extraction(e) => e.user_message(),
            Self::Explain(e) => e.user_message(),
            Self::Llm(e) => e.user_message(),
            Self::Store(e) => e.user_message(),
            Self::Io(e) => format!("File system operation failed: {e}"),
            Self::OutputWrite { path, reason } => {
                format!("Could not write explanations to {}: {reason}", path.display())
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Config(e) => e.context(),
            Self::Extraction(e) => e.context(),
            Self::Explain(e) => e.context(),
            Self::Llm(e) => e.context(),
            Self::Store(e) => e.context(),
            Self::Io(_) | Self::OutputWrite { .. } => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(e) => e.suggestions(),
            Self::Extraction(e) => e.suggestions(),
            Self::Explain(e) => e.suggestions(),
            Self::Llm(e) => e.suggestions(),
            Self::Store(e) => e.suggestions(),
            Self::Io(_) | Self::OutputWrite { .. } => vec![
                "Check that the target directory exists and is writable".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(e) => e.category(),
            Self::Extraction(e) => e.category(),
            Self::Explain(e) => e.category(),
            Self::Llm(e) => e.category(),
            Self::Store(e) => e.category(),
            Self::Io(_) | Self::OutputWrite { .. } => ErrorCategory::FileSystem,
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(msg) => format!("Configuration file is invalid: {msg}"),
            Self::MissingRequired(what) => format!("Required configuration is missing: {what}"),
            Self::InvalidValue { key, value } => {
                format!("Configuration value '{key}' is invalid: {value}")
            }
            Self::NotFound { path } => format!("Configuration file not found: {path}"),
        }
    }

    fn context(&self) -> Option<String> {
        Some(
            "Configuration is read from CLI flags, then .deckexplain/config.toml, then built-in defaults."
                .to_string(),
        )
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax of .deckexplain/config.toml".to_string(),
                "Run 'deckexplain config' to see the effective configuration".to_string(),
            ],
            Self::MissingRequired(_) => {
                vec!["Add the missing value to .deckexplain/config.toml".to_string()]
            }
            Self::InvalidValue { key, .. } => vec![format!(
                "Fix the value of '{key}' in the config file or on the command line"
            )],
            Self::NotFound { .. } => {
                vec!["Check the path passed to --config".to_string()]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// LLM backend error taxonomy.
///
/// Every failure of the remote completion service maps onto one of these
/// variants. [`LlmError::is_transient`] decides whether a retry is worthwhile.
#[derive(Error, Debug, Clone)]
pub enum LlmError {
    /// Transport-level failure (HTTP connectivity, malformed response)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider authentication failure (401, 403)
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Provider quota/rate limit exceeded (429)
    #[error("Provider quota exceeded: {0}")]
    ProviderQuota(String),

    /// Provider service outage (5xx errors)
    #[error("Provider outage: {0}")]
    ProviderOutage(String),

    /// Invocation timed out
    #[error("Timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// Configuration error (missing API key, bad base URL)
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),

    /// Unsupported feature or provider
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl LlmError {
    /// Whether the failure came from the remote service and may succeed on a
    /// later attempt. Local configuration faults are never transient.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Misconfiguration(_) | Self::Unsupported(_))
    }
}

impl UserFriendlyError for LlmError {
    fn user_message(&self) -> String {
        match self {
            Self::Transport(msg) => format!("LLM transport error: {msg}"),
            Self::ProviderAuth(msg) => format!("LLM provider authentication failed: {msg}"),
            Self::ProviderQuota(msg) => format!("LLM provider quota exceeded: {msg}"),
            Self::ProviderOutage(msg) => format!("LLM provider service outage: {msg}"),
            Self::Timeout { duration } => {
                format!("LLM invocation timed out after {:?}", duration)
            }
            Self::Misconfiguration(msg) => format!("LLM configuration error: {msg}"),
            Self::Unsupported(msg) => format!("LLM feature not supported: {msg}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Transport(_) => {
                Some("Transport errors occur when the LLM endpoint cannot be reached.".to_string())
            }
            Self::ProviderAuth(_) => Some(
                "Authentication errors indicate a missing or invalid API key.".to_string(),
            ),
            Self::ProviderQuota(_) => Some(
                "Quota errors occur when rate limits or usage limits are exceeded.".to_string(),
            ),
            Self::ProviderOutage(_) => {
                Some("Provider outages are temporary service disruptions.".to_string())
            }
            Self::Timeout { .. } => Some(
                "Timeouts occur when a completion takes longer than [llm] timeout_secs.".to_string(),
            ),
            Self::Misconfiguration(_) => Some(
                "Configuration errors indicate missing or invalid [llm] settings.".to_string(),
            ),
            Self::Unsupported(_) => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Transport(_) => vec![
                "Verify network connectivity to the LLM endpoint".to_string(),
                "Check [llm] base_url".to_string(),
            ],
            Self::ProviderAuth(_) => vec![
                "Set the API key environment variable (default OPENAI_API_KEY)".to_string(),
            ],
            Self::ProviderQuota(_) | Self::ProviderOutage(_) => vec![
                "Wait and retry later".to_string(),
                "Increase [retry] max_retries or initial_backoff_secs".to_string(),
            ],
            Self::Timeout { .. } => vec!["Increase [llm] timeout_secs".to_string()],
            Self::Misconfiguration(_) => {
                vec!["Run 'deckexplain config' to inspect LLM settings".to_string()]
            }
            Self::Unsupported(_) => vec!["Use provider = \"openai\"".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::LlmIntegration
    }
}

/// Sentinel explanation for slides without text.
pub const NO_TEXT_EXPLANATION: &str = "No text in the slide - unable to generate explanation";

/// Errors from topic resolution and slide explanation.
#[derive(Error, Debug)]
pub enum ExplainError {
    /// Input rejected before any remote call was made
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Non-transient backend failure, surfaced without retrying
    #[error("{0}")]
    Remote(LlmError),

    /// Every permitted attempt failed with a transient error
    #[error("Query failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: LlmError },

    /// The presentation topic could not be derived; fatal for the batch
    #[error("Topic resolution failed: {source}")]
    TopicResolutionFailed {
        #[source]
        source: Box<ExplainError>,
    },

    /// One slide could not be explained; isolated to that slide
    #[error("explanation generation for slide {index} failed: {source}")]
    SlideExplanationFailed {
        index: SlideIndex,
        #[source]
        source: Box<ExplainError>,
    },

    /// A slide task ended without producing an outcome (panic or cancellation)
    #[error("slide task aborted: {0}")]
    TaskAborted(String),

    /// Fan-in did not produce exactly one entry per input slide
    #[error("Aggregation failed: expected {expected} explanations, collected {collected}")]
    Aggregation { expected: usize, collected: usize },
}

impl ExplainError {
    /// The sentinel string stored in place of an explanation for a failed
    /// slide. Only meaningful for `SlideExplanationFailed`; other variants
    /// render their plain message.
    #[must_use]
    pub fn to_sentinel(&self) -> String {
        format!("ERROR - {self}")
    }
}

impl UserFriendlyError for ExplainError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(msg) => format!("Invalid data: {msg}"),
            Self::Remote(e) => e.user_message(),
            Self::RetriesExhausted { attempts, last } => {
                format!("LLM request failed after {attempts} attempts: {last}")
            }
            Self::TopicResolutionFailed { source } => {
                format!("Could not determine the presentation topic: {source}")
            }
            Self::SlideExplanationFailed { index, source } => {
                format!("Slide {index} could not be explained: {source}")
            }
            Self::TaskAborted(reason) => format!("A slide task stopped unexpectedly: {reason}"),
            Self::Aggregation {
                expected,
                collected,
            } => format!("Collected {collected} of {expected} slide explanations"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::TopicResolutionFailed { .. } => Some(
                "Every slide explanation depends on the topic, so the whole deck was skipped."
                    .to_string(),
            ),
            Self::Remote(e) => e.context(),
            Self::RetriesExhausted { last, .. } => last.context(),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidInput(_) => {
                vec!["Check that the deck contains slide text".to_string()]
            }
            Self::TopicResolutionFailed { .. } => vec![
                "Pass the topic explicitly with --topic".to_string(),
                "Check LLM connectivity and credentials".to_string(),
            ],
            Self::Remote(e) => e.suggestions(),
            Self::RetriesExhausted { last, .. } => last.suggestions(),
            Self::SlideExplanationFailed { .. }
            | Self::TaskAborted(_)
            | Self::Aggregation { .. } => Vec::new(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput(_) => ErrorCategory::Input,
            _ => ErrorCategory::LlmIntegration,
        }
    }
}

/// Errors while reading slide text out of a deck file.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Failed to read deck: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid PPTX archive: {0}")]
    Archive(String),

    #[error("Malformed slide XML in {part}: {reason}")]
    Xml { part: String, reason: String },
}

impl UserFriendlyError for ExtractionError {
    fn user_message(&self) -> String {
        match self {
            Self::Io(e) => format!("Please provide a valid pptx file path ({e})"),
            Self::Archive(msg) => format!("The file is not a readable PPTX deck: {msg}"),
            Self::Xml { part, reason } => format!("Slide part {part} is malformed: {reason}"),
        }
    }

    fn context(&self) -> Option<String> {
        Some("Only Office Open XML presentations (.pptx) are supported.".to_string())
    }

    fn suggestions(&self) -> Vec<String> {
        vec!["Re-save the presentation as .pptx and try again".to_string()]
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Input
    }
}

/// Errors from the upload and output directories.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No upload found for uid {uid}")]
    NotFound { uid: String },

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Output for {filename} is not valid JSON: {reason}")]
    CorruptOutput { filename: String, reason: String },

    #[error("Store IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl UserFriendlyError for StoreError {
    fn user_message(&self) -> String {
        match self {
            Self::NotFound { uid } => format!("No upload with uid {uid}"),
            Self::InvalidUpload(msg) => format!("Upload rejected: {msg}"),
            Self::CorruptOutput { filename, reason } => {
                format!("Explanation output for {filename} is unreadable: {reason}")
            }
            Self::Io { path, source } => format!("Could not access {}: {source}", path.display()),
        }
    }

    fn context(&self) -> Option<String> {
        None
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::NotFound { .. } => vec!["Check the uid printed by 'deckexplain upload'".to_string()],
            Self::Io { .. } => vec!["Check [service] uploads_dir and outputs_dir".to_string()],
            _ => Vec::new(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidUpload(_) => ErrorCategory::Input,
            _ => ErrorCategory::FileSystem,
        }
    }
}
