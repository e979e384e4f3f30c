use priem_core::types::Message;

/// Conversational state of one end user.
///
/// `history` only ever grows by whole (user, assistant) pairs, so its length
/// is always even. Nothing is persisted: a restart starts everyone fresh.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Every exchanged message, oldest first.
    pub history: Vec<Message>,
    /// Name the user introduced themselves with, once known.
    pub name: Option<String>,
}

/// What callers need to know about a session without copying its history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub name: Option<String>,
    pub turns: usize,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed (user, assistant) turns.
    pub fn turns(&self) -> usize {
        self.history.len() / 2
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            name: self.name.clone(),
            turns: self.turns(),
        }
    }

    /// The last `window` history entries, in original order.
    pub fn tail(&self, window: usize) -> &[Message] {
        let start = self.history.len().saturating_sub(window);
        &self.history[start..]
    }

    pub(crate) fn clear(&mut self) {
        self.history.clear();
        self.name = None;
    }

    pub(crate) fn push_turn(&mut self, user: Message, assistant: Message) {
        self.history.push(user);
        self.history.push(assistant);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_shorter_history_returns_everything() {
        let mut s = Session::new();
        s.push_turn(Message::user("a"), Message::assistant("b"));
        assert_eq!(s.tail(10).len(), 2);
    }

    #[test]
    fn tail_zero_window_is_empty() {
        let mut s = Session::new();
        s.push_turn(Message::user("a"), Message::assistant("b"));
        assert!(s.tail(0).is_empty());
    }

    #[test]
    fn summary_counts_pairs_and_copies_name() {
        let mut s = Session::new();
        s.push_turn(Message::user("a"), Message::assistant("b"));
        s.push_turn(Message::user("c"), Message::assistant("d"));
        s.name = Some("Анна".to_string());
        assert_eq!(
            s.summary(),
            SessionSummary {
                name: Some("Анна".to_string()),
                turns: 2,
            }
        );
    }
}
