use crate::provider::Message;

/// Assembles the message list for one backend request:
/// system persona, recent history, new user message.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    system_prompt: String,
    window: usize,
}

impl PromptBuilder {
    pub fn new(system_prompt: impl Into<String>, window: usize) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            window,
        }
    }

    /// How many history entries to ask the session store for.
    pub fn window(&self) -> usize {
        self.window
    }

    /// `context` is used as given; windowing already happened in the store.
    pub fn build(&self, context: Vec<Message>, user_text: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(context.len() + 2);
        messages.push(Message::system(self.system_prompt.as_str()));
        messages.extend(context);
        messages.push(Message::user(user_text));
        messages
    }
}
