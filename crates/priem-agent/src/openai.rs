use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use priem_core::error::ConfigError;

use crate::provider::{BackendError, ChatRequest, LlmBackend};

/// OpenAI chat-completions endpoint (e.g. Ollama's `/v1/chat/completions`).
pub struct OpenAiCompatBackend {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    label: String,
}

impl OpenAiCompatBackend {
    /// `url` is the full completions endpoint. `api_key`, when present, is
    /// sent as a bearer token.
    pub fn new(
        url: &str,
        api_key: Option<String>,
        label: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            client: build_client(timeout)?,
            url: parse_url(url)?,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            label: label.into(),
        })
    }
}

#[async_trait]
impl LlmBackend for OpenAiCompatBackend {
    fn name(&self) -> &str {
        "openai_compat"
    }

    fn label(&self) -> &str {
        &self.label
    }

    async fn complete(&self, req: &ChatRequest) -> Result<String, BackendError> {
        post_chat_completion(&self.client, &self.url, self.api_key.as_deref(), req, self.name())
            .await
    }
}

/// Build the shared HTTP client with a whole-request timeout.
pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ConfigError::Client(e.to_string()))
}

pub(crate) fn parse_url(url: &str) -> Result<String, ConfigError> {
    let parsed = reqwest::Url::parse(url.trim())
        .map_err(|e| ConfigError::Invalid(format!("backend url {url:?}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid(format!(
            "backend url {url:?}: scheme must be http or https"
        )));
    }
    Ok(parsed.to_string())
}

/// POST one chat-completions request and pull out `choices[0].message.content`.
///
/// Shared by every backend that speaks the chat-completions shape.
pub(crate) async fn post_chat_completion(
    client: &reqwest::Client,
    url: &str,
    api_key: Option<&str>,
    req: &ChatRequest,
    backend: &str,
) -> Result<String, BackendError> {
    let body = build_request_body(req);

    debug!(backend, model = %req.model, messages = req.messages.len(), "sending chat completion request");

    let mut builder = client
        .post(url)
        .header("content-type", "application/json")
        .json(&body);
    if let Some(key) = api_key {
        builder = builder.bearer_auth(key);
    }

    let resp = builder.send().await?;

    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        warn!(backend, status = status.as_u16(), body = %text, "chat completion API error");
        return Err(BackendError::Connection(format!("HTTP {status}")));
    }

    let text = resp.text().await?;
    parse_response(&text)
}

fn build_request_body(req: &ChatRequest) -> serde_json::Value {
    serde_json::json!({
        "model": req.model,
        "messages": req.messages,
        "temperature": req.params.temperature,
        "max_tokens": req.params.max_tokens,
        "stream": false,
    })
}

fn parse_response(body: &str) -> Result<String, BackendError> {
    let api_resp: ApiResponse = serde_json::from_str(body)
        .map_err(|e| BackendError::MalformedResponse(format!("invalid JSON: {e}")))?;

    api_resp
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| {
            warn!(body, "chat completion response without choices[0].message.content");
            BackendError::MalformedResponse("missing choices[0].message.content".to_string())
        })
}

// Chat-completions response types (private, deserialization only)

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}
