/// Startup failures of the Telegram adapter. Per-message send errors are
/// logged in `send`, never returned.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    /// `getMe` failed: the token was rejected or Telegram is unreachable.
    #[error("telegram rejected the bot at startup: {0}")]
    Startup(#[source] teloxide::RequestError),

    #[error("telegram.bot_token is empty")]
    NoToken,
}
