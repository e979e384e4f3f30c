//! Slash commands, intercepted before the conversation pipeline.
//!
//! Only `/start` is meaningful. Any other bot command is swallowed so it never
//! reaches the model as a question. Text that merely starts with `/` is not a
//! command and goes through the conversation pipeline.

use priem_core::types::UserId;

use crate::pipeline::ConversationHandler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `/start`: reset the session and greet.
    Start,
    /// Any other `/command`.
    Unknown,
}

impl Command {
    /// Parse a Telegram bot command. Returns `None` for anything else.
    ///
    /// A bot command is `/` followed directly by ASCII letters, digits or
    /// `_`, optionally with an `@botname` suffix, and ends at whitespace or
    /// the end of the text: `/start`, `/start@priem_bot`, `/start ref123`.
    /// `/когда экзамены?` and `/ привет` are ordinary questions.
    pub fn parse(text: &str) -> Option<Self> {
        let body = text.trim().strip_prefix('/')?;
        let word = body.split(char::is_whitespace).next().unwrap_or("");
        let (name, bot) = match word.split_once('@') {
            Some((name, bot)) => (name, Some(bot)),
            None => (word, None),
        };
        if !is_command_token(name) || !bot.map_or(true, is_command_token) {
            return None;
        }
        if name.eq_ignore_ascii_case("start") {
            Some(Command::Start)
        } else {
            Some(Command::Unknown)
        }
    }
}

fn is_command_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Handle a slash command.
///
/// Returns `Some(reply)` when the command produces a reply, `None` when the
/// message was a command that should be ignored. Plain text also yields
/// `None`; callers check `Command::parse` first.
pub fn handle_slash_command(text: &str, handler: &ConversationHandler, user: UserId) -> Option<String> {
    match Command::parse(text)? {
        Command::Start => Some(handler.reset(user)),
        Command::Unknown => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_start_variants() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("  /START "), Some(Command::Start));
        assert_eq!(Command::parse("/start@priem_bot"), Some(Command::Start));
        assert_eq!(Command::parse("/start ref123"), Some(Command::Start));
    }

    #[test]
    fn other_commands_are_unknown() {
        assert_eq!(Command::parse("/help"), Some(Command::Unknown));
        assert_eq!(Command::parse("/starter"), Some(Command::Unknown));
        assert_eq!(Command::parse("/help@priem_bot please"), Some(Command::Unknown));
    }

    struct Unreachable;

    #[async_trait::async_trait]
    impl crate::provider::LlmBackend for Unreachable {
        fn name(&self) -> &str {
            "unreachable"
        }
        fn label(&self) -> &str {
            "Ollama"
        }
        async fn complete(
            &self,
            _req: &crate::provider::ChatRequest,
        ) -> Result<String, crate::provider::BackendError> {
            Err(crate::provider::BackendError::Connection("offline".to_string()))
        }
    }

    #[test]
    fn start_resets_session_and_greets() {
        let handler = ConversationHandler::new(
            Box::new(Unreachable),
            crate::prompt::PromptBuilder::new("persona", 10),
            "m",
            crate::provider::SamplingParams::default(),
            "Здравствуйте!",
        );
        let user = UserId(3);
        handler.sessions().set_name(user, "Анна");
        handler.sessions().record_turn(user, "q", "a");

        assert_eq!(
            handle_slash_command("/start", &handler, user).as_deref(),
            Some("Здравствуйте!")
        );
        assert!(handler.sessions().name(user).is_none());
        assert!(handler.sessions().read_context(user, 10).is_empty());

        assert_eq!(handle_slash_command("/help", &handler, user), None);
    }

    #[test]
    fn slash_prefixed_questions_are_not_commands() {
        assert_eq!(Command::parse("/когда экзамены?"), None);
        assert_eq!(Command::parse("/ привет"), None);
        assert_eq!(Command::parse("/"), None);
        assert_eq!(Command::parse("/start@"), None);
        assert_eq!(Command::parse("/start@бот"), None);
    }

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(Command::parse("меня зовут Анна"), None);
        assert_eq!(Command::parse("a /start"), None);
    }
}
