//! HTTP completion client for OpenAI, Anthropic and Ollama style endpoints.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};

use wardrobe_core::config::{LlmConfig, LlmProvider};
use wardrobe_core::suggestions::{CompletionClient, CompletionError};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_REPLY_TOKENS: u32 = 512;

pub struct HttpCompletionClient {
    client: Client,
    provider: LlmProvider,
    base_url: String,
    model: String,
}

impl HttpCompletionClient {
    pub fn new(
        provider: LlmProvider,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| CompletionError::Transport(error.to_string()))?;
        Ok(Self {
            client,
            provider,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, CompletionError> {
        Self::new(
            config.provider,
            config.effective_base_url(),
            config.model.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    pub fn endpoint(&self) -> String {
        endpoint_url(self.provider, &self.base_url)
    }

    fn request(&self, credential: &SecretString, prompt: &str) -> RequestBuilder {
        let body = request_body(self.provider, &self.model, prompt);
        let builder = self.client.post(self.endpoint()).json(&body);
        let key = credential.expose_secret();
        match self.provider {
            LlmProvider::OpenAi => builder.bearer_auth(key),
            LlmProvider::Anthropic => {
                builder.header("x-api-key", key).header("anthropic-version", ANTHROPIC_VERSION)
            }
            LlmProvider::Ollama => builder.bearer_auth(key),
        }
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(
        &self,
        credential: &SecretString,
        prompt: &str,
    ) -> Result<String, CompletionError> {
        let response = self
            .request(credential, prompt)
            .send()
            .await
            .map_err(|error| CompletionError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_secs = retry_after_secs(response.headers());
            tracing::debug!(
                event_name = "llm.status",
                provider = self.provider.as_str(),
                status = status.as_u16(),
                retry_after_secs = ?retry_after_secs,
                "completion endpoint returned an error status"
            );
            return Err(CompletionError::Status { status: status.as_u16(), retry_after_secs });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|error| CompletionError::Envelope(format!("reply is not JSON: {error}")))?;
        reply_text(self.provider, &payload).map(str::to_string).ok_or_else(|| {
            CompletionError::Envelope(format!(
                "reply has no text for provider {}",
                self.provider.as_str()
            ))
        })
    }
}

/// Client for the configured endpoint, or `None` when it is disabled or the
/// HTTP client cannot be built. Callers fall back to rule-based suggestions.
pub fn completion_client(config: &LlmConfig) -> Option<Arc<dyn CompletionClient>> {
    if !config.enabled {
        return None;
    }
    match HttpCompletionClient::from_config(config) {
        Ok(client) => Some(Arc::new(client)),
        Err(error) => {
            tracing::warn!(
                event_name = "agent.client_unavailable",
                provider = config.provider.as_str(),
                error = %error,
                "completion client could not be built"
            );
            None
        }
    }
}

fn endpoint_url(provider: LlmProvider, base_url: &str) -> String {
    let path = match provider {
        LlmProvider::OpenAi => "/v1/chat/completions",
        LlmProvider::Anthropic => "/v1/messages",
        LlmProvider::Ollama => "/api/generate",
    };
    format!("{base_url}{path}")
}

fn request_body(provider: LlmProvider, model: &str, prompt: &str) -> Value {
    match provider {
        LlmProvider::OpenAi => json!({
            "model": model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0.7,
        }),
        LlmProvider::Anthropic => json!({
            "model": model,
            "max_tokens": MAX_REPLY_TOKENS,
            "messages": [{ "role": "user", "content": prompt }],
        }),
        LlmProvider::Ollama => json!({
            "model": model,
            "prompt": prompt,
            "stream": false,
        }),
    }
}

fn reply_text(provider: LlmProvider, payload: &Value) -> Option<&str> {
    let text = match provider {
        LlmProvider::OpenAi => payload.pointer("/choices/0/message/content"),
        LlmProvider::Anthropic => payload.pointer("/content/0/text"),
        LlmProvider::Ollama => payload.get("response"),
    };
    text.and_then(Value::as_str)
}

/// Only the delta-seconds form is honoured; HTTP dates are ignored.
fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
}
