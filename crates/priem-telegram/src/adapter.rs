//! Telegram channel adapter.
//!
//! Wraps a teloxide `Bot` + `Dispatcher` and drives the long-polling event loop
//! until the process is interrupted.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::info;

use priem_agent::pipeline::ConversationHandler;
use priem_core::config::TelegramConfig;

use crate::error::TelegramError;
use crate::handler::handle_message;

/// Telegram channel adapter. Long polling, no public URL required.
pub struct TelegramAdapter {
    conversation: Arc<ConversationHandler>,
    config: TelegramConfig,
}

impl TelegramAdapter {
    pub fn new(
        config: &TelegramConfig,
        conversation: Arc<ConversationHandler>,
    ) -> Result<Self, TelegramError> {
        if config.bot_token.trim().is_empty() {
            return Err(TelegramError::NoToken);
        }
        Ok(Self {
            conversation,
            config: config.clone(),
        })
    }

    /// Check the token, then drive the long-polling loop until Ctrl-C.
    ///
    /// Returns `Err` only if Telegram rejects the token at startup.
    pub async fn run(self) -> Result<(), TelegramError> {
        let bot = Bot::new(self.config.bot_token.trim());

        let me = bot.get_me().await.map_err(TelegramError::Startup)?;
        info!(
            bot = %me.user.username.as_deref().unwrap_or("?"),
            backend = %self.conversation.backend().name(),
            model = %self.conversation.model(),
            "Telegram: bot started, polling for messages"
        );

        let handler = Update::filter_message().endpoint(handle_message);

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![self.conversation])
            .default_handler(|_upd| async {})
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        info!("Telegram: dispatcher stopped");
        Ok(())
    }
}
