use std::time::Duration;

use async_trait::async_trait;

use priem_core::error::ConfigError;

use crate::openai::{build_client, parse_url, post_chat_completion};
use crate::provider::{BackendError, ChatRequest, LlmBackend};

/// Plain REST endpoint with the chat-completions request/response shape
/// (LM Studio's local server). Never sends credentials.
pub struct GenericRestBackend {
    client: reqwest::Client,
    url: String,
    label: String,
}

impl GenericRestBackend {
    pub fn new(url: &str, label: impl Into<String>, timeout: Duration) -> Result<Self, ConfigError> {
        Ok(Self {
            client: build_client(timeout)?,
            url: parse_url(url)?,
            label: label.into(),
        })
    }
}

#[async_trait]
impl LlmBackend for GenericRestBackend {
    fn name(&self) -> &str {
        "generic_rest"
    }

    fn label(&self) -> &str {
        &self.label
    }

    async fn complete(&self, req: &ChatRequest) -> Result<String, BackendError> {
        post_chat_completion(&self.client, &self.url, None, req, self.name()).await
    }
}
