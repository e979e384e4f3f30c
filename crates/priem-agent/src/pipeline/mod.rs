//! Channel-agnostic message pipeline.
//!
//! Chat adapters route slash commands through `slash::handle_slash_command`
//! and every other text message through `ConversationHandler::handle`.

pub mod process;
pub mod slash;

pub use process::ConversationHandler;
pub use slash::{handle_slash_command, Command};
