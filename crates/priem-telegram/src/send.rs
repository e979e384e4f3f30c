//! Reply delivery for the Telegram adapter.
//!
//! Telegram rejects messages longer than 4096 characters, so long model
//! answers are split on line or word boundaries. Replies are sent as plain
//! text: model output is not valid MarkdownV2.

use std::time::Duration;

use teloxide::prelude::*;
use tracing::warn;

/// Maximum characters per Telegram message (limit is 4096; we use 4090 for safety).
const CHUNK_MAX: usize = 4090;

/// Split `text` into chunks of at most `CHUNK_MAX` characters.
///
/// Prefers the last newline, then the last space, inside each window; a
/// single unbroken run is cut at the limit. Counts characters, not bytes,
/// so Cyrillic text is never cut inside a code point.
pub fn split_chunks(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut remaining = text;

    while remaining.chars().count() > CHUNK_MAX {
        let limit = byte_offset(remaining, CHUNK_MAX);
        let window = &remaining[..limit];
        let split_at = window
            .rfind('\n')
            .or_else(|| window.rfind(' '))
            .filter(|&i| i > 0)
            .unwrap_or(limit);
        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }

    if !remaining.is_empty() {
        chunks.push(remaining.to_string());
    }
    chunks
}

/// Byte index of the `n`-th character, or the string length.
fn byte_offset(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

/// Send `text` to `chat_id`, chunked. Failures are logged, never propagated.
///
/// A 100ms delay is inserted between consecutive chunks to avoid hitting rate limits.
pub async fn send_response(bot: &Bot, chat_id: ChatId, text: &str) {
    let chunks = split_chunks(text);
    if chunks.is_empty() {
        warn!(chat_id = chat_id.0, "Telegram: refusing to send an empty reply");
        return;
    }

    for (i, chunk) in chunks.iter().enumerate() {
        if let Err(e) = bot.send_message(chat_id, chunk).await {
            warn!(error = %e, chunk_index = i, chat_id = chat_id.0, "Telegram: failed to send reply");
        }

        if i + 1 < chunks.len() {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}
