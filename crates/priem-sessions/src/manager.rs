use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use tracing::{debug, instrument};

use priem_core::types::{Message, UserId};

use crate::types::{Session, SessionSummary};

/// In-memory owner of every user's `Session`.
///
/// Each user gets their own `Mutex`, so operations on different users never
/// contend; the map's shard lock is only held long enough to clone the `Arc`.
/// Every method locks once and releases before returning, so callers never
/// hold a session across the backend call.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<UserId, Arc<Mutex<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Summarize the user's session, creating an empty one first if this is
    /// their first message. The history is not copied.
    #[instrument(skip(self), fields(user_id = %user))]
    pub fn get_or_create(&self, user: UserId) -> SessionSummary {
        let slot = self.slot(user);
        let session = lock(&slot);
        session.summary()
    }

    /// Clear history and name. Creates the session if absent; idempotent.
    #[instrument(skip(self), fields(user_id = %user))]
    pub fn reset(&self, user: UserId) {
        let slot = self.slot(user);
        lock(&slot).clear();
        debug!("session reset");
    }

    /// Append the user message and the assistant reply, in that order,
    /// under a single lock so concurrent turns never interleave.
    pub fn record_turn(&self, user: UserId, user_message: &str, assistant_message: &str) {
        let slot = self.slot(user);
        lock(&slot).push_turn(
            Message::user(user_message),
            Message::assistant(assistant_message),
        );
    }

    /// Store `name` unless one is already known (first wins).
    ///
    /// Returns `true` when the name was stored.
    pub fn set_name(&self, user: UserId, name: &str) -> bool {
        let slot = self.slot(user);
        let mut session = lock(&slot);
        if session.name.is_some() {
            return false;
        }
        session.name = Some(name.to_string());
        true
    }

    pub fn name(&self, user: UserId) -> Option<String> {
        let slot = self.slot(user);
        let session = lock(&slot);
        session.name.clone()
    }

    /// The last `window` history entries (fewer if the history is shorter),
    /// oldest first.
    pub fn read_context(&self, user: UserId, window: usize) -> Vec<Message> {
        let slot = self.slot(user);
        let session = lock(&slot);
        session.tail(window).to_vec()
    }

    /// Number of users with a session.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn slot(&self, user: UserId) -> Arc<Mutex<Session>> {
        self.sessions.entry(user).or_default().value().clone()
    }
}

/// A panic while a session was locked cannot leave a half-written turn
/// (pairs are pushed together), so a poisoned lock is still usable.
fn lock(slot: &Mutex<Session>) -> MutexGuard<'_, Session> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use priem_core::types::Role;

    const ALICE: UserId = UserId(1);
    const BOB: UserId = UserId(2);

    #[test]
    fn get_or_create_starts_empty() {
        let store = SessionStore::new();
        let summary = store.get_or_create(ALICE);
        assert_eq!(summary.turns, 0);
        assert!(summary.name.is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn record_turn_appends_user_then_assistant() {
        let store = SessionStore::new();
        store.record_turn(ALICE, "вопрос", "ответ");

        let ctx = store.read_context(ALICE, 10);
        assert_eq!(ctx, vec![Message::user("вопрос"), Message::assistant("ответ")]);
    }

    #[test]
    fn read_context_returns_last_window_in_order() {
        let store = SessionStore::new();
        for i in 0..20 {
            store.record_turn(ALICE, &format!("q{i}"), &format!("a{i}"));
        }

        let ctx = store.read_context(ALICE, 10);
        assert_eq!(ctx.len(), 10);
        assert_eq!(ctx[0], Message::user("q15"));
        assert_eq!(ctx[9], Message::assistant("a19"));
        // full history is untouched
        assert_eq!(store.get_or_create(ALICE).turns, 20);
    }

    #[test]
    fn set_name_is_first_wins() {
        let store = SessionStore::new();
        assert!(store.set_name(ALICE, "Иван"));
        assert!(!store.set_name(ALICE, "Пётр"));
        assert_eq!(store.name(ALICE).as_deref(), Some("Иван"));
    }

    #[test]
    fn reset_clears_history_and_name() {
        let store = SessionStore::new();
        store.set_name(ALICE, "Анна");
        store.record_turn(ALICE, "q", "a");

        store.reset(ALICE);
        assert!(store.read_context(ALICE, 10).is_empty());
        assert!(store.name(ALICE).is_none());

        // idempotent, and works for unknown users
        store.reset(ALICE);
        store.reset(BOB);
        assert!(store.read_context(BOB, 10).is_empty());
    }

    #[test]
    fn users_are_isolated() {
        let store = SessionStore::new();
        store.set_name(ALICE, "Анна");
        store.record_turn(ALICE, "q", "a");

        assert!(store.name(BOB).is_none());
        assert!(store.read_context(BOB, 10).is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_turns_keep_pairs_intact() {
        let store = Arc::new(SessionStore::new());
        let mut handles = Vec::new();
        for i in 0..50 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.record_turn(ALICE, &format!("q{i}"), &format!("a{i}"));
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(store.get_or_create(ALICE).turns, 50);
        let history = store.read_context(ALICE, usize::MAX);
        assert_eq!(history.len(), 100);
        for pair in history.chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Assistant);
            assert_eq!(pair[0].content[1..], pair[1].content[1..]);
        }
    }
}
