//! "typing…" indicator shown while the backend is working.

use std::future::Future;
use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::ChatAction;
use tracing::debug;

/// Telegram drops the chat action after about 5 seconds.
const REFRESH: Duration = Duration::from_secs(4);

/// Drive `work` to completion, re-sending `ChatAction::Typing` to `chat_id`
/// every few seconds until it finishes. The indicator stops with the work,
/// there is no task to clean up afterwards.
pub async fn while_typing<F: Future>(bot: &Bot, chat_id: ChatId, work: F) -> F::Output {
    tokio::pin!(work);
    let mut refresh = tokio::time::interval(REFRESH);

    loop {
        tokio::select! {
            biased;
            output = &mut work => return output,
            _ = refresh.tick() => {
                if let Err(e) = bot.send_chat_action(chat_id, ChatAction::Typing).await {
                    debug!(chat_id = chat_id.0, error = %e, "Telegram: typing indicator not sent");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ready_work_returns_without_contacting_telegram() {
        let bot = Bot::new("0:test");
        let reply = while_typing(&bot, ChatId(1), async { "Здравствуйте!".to_string() }).await;
        assert_eq!(reply, "Здравствуйте!");
    }
}
