use deckexplain_config::LlmConfig;
use deckexplain_llm::{LlmBackend, LlmError, LlmInvocation, Message};
use std::time::Duration;

/// Model and per-request timeout applied to every prompt of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySettings {
    /// Empty selects the backend's default model
    pub model: String,
    pub timeout: Duration,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self::from_config(&LlmConfig::default())
    }
}

impl QuerySettings {
    #[must_use]
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            timeout: config.timeout(),
        }
    }
}

/// Send one system + user prompt and return the completion text verbatim.
pub(crate) async fn ask(
    backend: &dyn LlmBackend,
    settings: &QuerySettings,
    label: &str,
    system: &str,
    user: String,
) -> Result<String, LlmError> {
    let inv = LlmInvocation::new(
        label,
        settings.model.clone(),
        settings.timeout,
        vec![Message::system(system), Message::user(user)],
    );
    backend.invoke(inv).await.map(|result| result.raw_response)
}
