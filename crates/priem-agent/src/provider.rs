use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use priem_core::config::{AgentConfig, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};

pub use priem_core::types::{Message, Role};

/// Sampling knobs forwarded to the backend. Streaming is always off.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl From<&AgentConfig> for SamplingParams {
    fn from(agent: &AgentConfig) -> Self {
        Self {
            temperature: agent.temperature,
            max_tokens: agent.max_tokens,
        }
    }
}

/// One completion request: the full ordered message list, system first.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub params: SamplingParams,
}

/// Common interface for the inference backends (Ollama native, OpenAI-compatible,
/// generic REST).
///
/// Implementations make exactly one attempt per call and never retry; the
/// caller decides what to show the user on failure.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Human-readable backend name used in user-facing error replies.
    fn label(&self) -> &str;

    /// Run one non-streaming completion and return the raw (trimmed) text.
    async fn complete(&self, req: &ChatRequest) -> Result<String, BackendError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    /// Transport failure, timeout or non-2xx status.
    #[error("connection error: {0}")]
    Connection(String),

    /// 2xx response without the expected completion field.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl BackendError {
    pub fn kind(&self) -> &'static str {
        match self {
            BackendError::Connection(_) => "connection",
            BackendError::MalformedResponse(_) => "malformed_response",
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Connection(format!("request timed out: {e}"))
        } else {
            BackendError::Connection(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_the_failure_category() {
        assert_eq!(BackendError::Connection("HTTP 503".into()).kind(), "connection");
        assert_eq!(BackendError::MalformedResponse("x".into()).kind(), "malformed_response");
    }
}
