//! Per-message conversation pipeline, shared by every chat adapter.
//!
//! `ConversationHandler::handle` runs one turn:
//! load context → learn name → build prompt → call backend → sanitize →
//! record turn → prefix name. Adapters only deliver the returned text.

use tracing::{debug, error, info, warn};

use priem_core::config::PriemConfig;
use priem_core::types::UserId;
use priem_sessions::SessionStore;

use crate::name::extract_name;
use crate::prompt::PromptBuilder;
use crate::provider::{BackendError, ChatRequest, LlmBackend, SamplingParams};
use crate::thinking;

/// Orchestrates session store, prompt builder and backend for each message.
///
/// Built once at startup and shared across tasks behind an `Arc`.
pub struct ConversationHandler {
    sessions: SessionStore,
    backend: Box<dyn LlmBackend>,
    prompt: PromptBuilder,
    model: String,
    params: SamplingParams,
    greeting: String,
}

impl ConversationHandler {
    pub fn new(
        backend: Box<dyn LlmBackend>,
        prompt: PromptBuilder,
        model: impl Into<String>,
        params: SamplingParams,
        greeting: impl Into<String>,
    ) -> Self {
        Self {
            sessions: SessionStore::new(),
            backend,
            prompt,
            model: model.into(),
            params,
            greeting: greeting.into(),
        }
    }

    /// Wire the handler from a validated config and an already-built backend.
    pub fn from_config(config: &PriemConfig, backend: Box<dyn LlmBackend>) -> Self {
        Self::new(
            backend,
            PromptBuilder::new(config.system_prompt(), config.agent.context_window),
            config.backend.model.clone(),
            SamplingParams::from(&config.agent),
            config.greeting(),
        )
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn backend(&self) -> &dyn LlmBackend {
        &*self.backend
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Forget the user's history and name, return the greeting.
    pub fn reset(&self, user: UserId) -> String {
        self.sessions.reset(user);
        info!(user_id = %user, "session reset by user");
        self.greeting.clone()
    }

    /// Run one conversational turn and return the reply to deliver.
    ///
    /// Never fails: backend errors become an apology that is recorded in
    /// history like any other assistant reply.
    pub async fn handle(&self, user: UserId, text: &str) -> String {
        info!(user_id = %user, question = %text, "user asked");

        let session = self.sessions.get_or_create(user);
        let context = self.sessions.read_context(user, self.prompt.window());
        debug!(user_id = %user, turns = session.turns, context = context.len(), "session loaded");

        let mut name = session.name;
        if name.is_none() {
            if let Some(found) = extract_name(text) {
                if self.sessions.set_name(user, &found) {
                    info!(user_id = %user, name = %found, "user introduced themselves");
                }
                name = self.sessions.name(user);
            }
        }

        let request = ChatRequest {
            model: self.model.clone(),
            messages: self.prompt.build(context, text),
            params: self.params,
        };

        // No session lock is held here; a slow backend only delays this user.
        let answer = match self.backend.complete(&request).await {
            Ok(raw) => thinking::clean(&raw),
            Err(e) => {
                match &e {
                    BackendError::Connection(_) => {
                        error!(user_id = %user, backend = %self.backend.name(), kind = e.kind(), err = %e, "backend unreachable")
                    }
                    BackendError::MalformedResponse(_) => {
                        warn!(user_id = %user, backend = %self.backend.name(), kind = e.kind(), err = %e, "backend returned malformed response")
                    }
                }
                apology(self.backend.label(), &e)
            }
        };

        self.sessions.record_turn(user, text, &answer);

        let reply = match name {
            Some(name) => format!("{name}, {answer}"),
            None => answer,
        };
        info!(user_id = %user, reply = %reply, "bot replied");
        reply
    }
}

/// User-facing replacement text for a failed backend call.
fn apology(label: &str, err: &BackendError) -> String {
    match err {
        BackendError::Connection(detail) => format!("Ошибка соединения с {label}: {detail}"),
        BackendError::MalformedResponse(_) => format!("Ошибка: Неверный формат ответа от {label}."),
    }
}
