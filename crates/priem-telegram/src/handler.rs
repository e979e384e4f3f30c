//! Telegram message handler registered in the teloxide Dispatcher.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::debug;

use priem_agent::pipeline::{handle_slash_command, Command, ConversationHandler};
use priem_core::types::UserId;

use crate::send;
use crate::typing::while_typing;

/// Main message handler registered in the teloxide Dispatcher.
///
/// Runs for every incoming `Message`:
/// 1. Ignore bots, anonymous senders and non-text messages
/// 2. Bot commands: `/start` resets and greets, others are ignored. Text
///    that only begins with `/` is not a command
/// 3. Anything else is a conversational turn, run in its own task so a slow
///    backend never holds up the dispatcher
pub async fn handle_message(
    bot: Bot,
    msg: Message,
    conversation: Arc<ConversationHandler>,
) -> ResponseResult<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    if from.is_bot {
        return Ok(());
    }
    let user = UserId(from.id.0);

    let Some(text) = msg.text() else {
        debug!(user_id = %user, "Telegram: ignoring non-text message");
        return Ok(());
    };
    if text.trim().is_empty() {
        return Ok(());
    }

    if Command::parse(text).is_some() {
        if let Some(reply) = handle_slash_command(text, &conversation, user) {
            send::send_response(&bot, msg.chat.id, &reply).await;
        } else {
            debug!(user_id = %user, command = %text, "Telegram: ignoring unknown command");
        }
        return Ok(());
    }

    let chat_id = msg.chat.id;
    let text = text.to_string();

    tokio::spawn(async move {
        let reply = while_typing(&bot, chat_id, conversation.handle(user, &text)).await;
        send::send_response(&bot, chat_id, &reply).await;
    });

    Ok(())
}
