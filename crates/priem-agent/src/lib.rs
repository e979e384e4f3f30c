pub mod generic;
pub mod name;
pub mod ollama;
pub mod openai;
pub mod pipeline;
pub mod prompt;
pub mod provider;
pub mod thinking;

pub use pipeline::ConversationHandler;
pub use provider::{BackendError, ChatRequest, LlmBackend, SamplingParams};
