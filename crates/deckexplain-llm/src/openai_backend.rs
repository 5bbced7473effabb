//! OpenAI-compatible chat-completions backend.
//!
//! Works against api.openai.com and any server exposing the same
//! `/chat/completions` contract (set `[llm] base_url`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::LlmError;
use crate::config::Config;
use crate::http_client::HttpClient;
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const COMPLETIONS_PATH: &str = "/chat/completions";

const PROVIDER: &str = "openai";

#[derive(Clone)]
pub(crate) struct OpenAiBackend {
    client: HttpClient,
    endpoint: String,
    api_key: String,
    default_model: String,
    default_timeout: Duration,
    default_params: HttpParams,
}

/// Sampling parameters; unset values are omitted from the request body.
#[derive(Debug, Clone, Default)]
pub(crate) struct HttpParams {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl OpenAiBackend {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        default_model: String,
        default_timeout: Duration,
        default_params: HttpParams,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: HttpClient::new()?,
            endpoint: completions_endpoint(base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)),
            api_key,
            default_model,
            default_timeout,
            default_params,
        })
    }

    pub fn new_from_config(config: &Config) -> Result<Self, LlmError> {
        let api_key_env = config.llm.api_key_env.as_str();
        let api_key = std::env::var(api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                LlmError::Misconfiguration(format!(
                    "API key not found in environment variable '{api_key_env}'. \
                     Set this variable or configure a different api_key_env in [llm]."
                ))
            })?;

        Self::new(
            api_key,
            config.llm.base_url.clone(),
            config.llm.model.clone(),
            config.llm.timeout(),
            HttpParams {
                max_tokens: config.llm.max_tokens,
                temperature: config.llm.temperature,
            },
        )
    }

    fn resolve_params(&self, inv: &LlmInvocation) -> (String, Duration, HttpParams) {
        let model = if inv.model.is_empty() {
            self.default_model.clone()
        } else {
            inv.model.clone()
        };

        let timeout = if inv.timeout.is_zero() {
            self.default_timeout
        } else {
            inv.timeout
        };

        (model, timeout, self.default_params.clone())
    }

    fn convert_messages(messages: &[Message]) -> Vec<ChatMessage<'_>> {
        messages
            .iter()
            .map(|msg| ChatMessage {
                role: msg.role.as_str(),
                content: &msg.content,
            })
            .collect()
    }
}

/// Append `/chat/completions` unless the configured URL already names it.
fn completions_endpoint(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with(COMPLETIONS_PATH) {
        trimmed.to_string()
    } else {
        format!("{trimmed}{COMPLETIONS_PATH}")
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let (model, timeout, params) = self.resolve_params(&inv);

        debug!(
            provider = PROVIDER,
            label = %inv.label,
            model = %model,
            timeout_secs = timeout.as_secs(),
            "Invoking OpenAI backend"
        );

        let body = ChatRequest {
            model: &model,
            messages: Self::convert_messages(&inv.messages),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            stream: false,
        };

        let request = self
            .client
            .inner()
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body);

        let response = self.client.send(request, timeout, PROVIDER).await?;

        let response_body: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Transport(format!("Failed to parse OpenAI response: {e}")))?;

        let choice = response_body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Transport("OpenAI response missing choices[0]".to_string()))?;

        let content = choice.message.content.ok_or_else(|| {
            LlmError::Transport("OpenAI response missing content in choices[0]".to_string())
        })?;

        let mut result = LlmResult::new(
            content,
            PROVIDER,
            response_body.model.unwrap_or(model),
        );
        if let Some(usage) = response_body.usage {
            result = result.with_tokens(usage.prompt_tokens, usage.completion_tokens);
        }

        debug!(
            provider = PROVIDER,
            label = %inv.label,
            tokens_input = ?result.tokens_input,
            tokens_output = ?result.tokens_output,
            "OpenAI invocation completed"
        );

        Ok(result)
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: Option<String>,
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}
