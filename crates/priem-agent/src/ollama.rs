use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use priem_core::error::ConfigError;

use crate::openai::{build_client, parse_url};
use crate::provider::{BackendError, ChatRequest, LlmBackend};

/// Ollama's native chat protocol (`POST {host}/api/chat`).
pub struct OllamaBackend {
    client: reqwest::Client,
    chat_url: String,
    label: String,
}

impl OllamaBackend {
    /// `host` is the server base URL, e.g. `http://localhost:11434`.
    pub fn new(host: &str, label: impl Into<String>, timeout: Duration) -> Result<Self, ConfigError> {
        let host = parse_url(host)?;
        Ok(Self {
            client: build_client(timeout)?,
            chat_url: format!("{}/api/chat", host.trim_end_matches('/')),
            label: label.into(),
        })
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    fn label(&self) -> &str {
        &self.label
    }

    async fn complete(&self, req: &ChatRequest) -> Result<String, BackendError> {
        let body = build_request_body(req);

        debug!(model = %req.model, messages = req.messages.len(), "sending request to Ollama");

        let resp = self
            .client
            .post(&self.chat_url)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %text, "Ollama API error");
            return Err(BackendError::Connection(format!("HTTP {status}")));
        }

        let text = resp.text().await?;
        parse_response(&text)
    }
}

fn build_request_body(req: &ChatRequest) -> serde_json::Value {
    // Native protocol: same message list, sampling knobs live under `options`.
    serde_json::json!({
        "model": req.model,
        "messages": req.messages,
        "stream": false,
        "options": {
            "temperature": req.params.temperature,
            "num_predict": req.params.max_tokens,
        },
    })
}

fn parse_response(body: &str) -> Result<String, BackendError> {
    let api_resp: ApiResponse = serde_json::from_str(body)
        .map_err(|e| BackendError::MalformedResponse(format!("invalid JSON: {e}")))?;

    api_resp
        .message
        .and_then(|m| m.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| {
            warn!(body, "Ollama response without message.content");
            BackendError::MalformedResponse("missing message.content".to_string())
        })
}

// Ollama API response types (private, deserialization only)

#[derive(Deserialize)]
struct ApiResponse {
    message: Option<OllamaMessage>,
}

#[derive(Deserialize)]
struct OllamaMessage {
    content: Option<String>,
}
