//! Per-speaker transcript

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::llm::{Message, MessageRole};

/// Ordered role-tagged messages sent with every request
///
/// Leading system messages are the speaker's instructions and survive
/// trimming; everything after them is dropped oldest-first once the
/// transcript grows past `max_messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
    max_messages: usize,
}

impl Transcript {
    pub fn new(max_messages: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_messages: max_messages.max(1),
        }
    }

    /// Replace everything with the given system instructions
    pub fn reseed<I, S>(&mut self, instructions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.messages.clear();
        self.messages.extend(
            instructions
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.trim().is_empty())
                .map(Message::system),
        );
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(Message::assistant(content));
    }

    /// Drop the oldest non-system messages until within bounds
    ///
    /// Returns how many messages were removed.
    pub fn trim(&mut self) -> usize {
        if self.messages.len() <= self.max_messages {
            return 0;
        }

        let preserved = self.leading_system_count();
        let excess = self.messages.len() - self.max_messages;
        let removable = self.messages.len() - preserved;
        let dropped = excess.min(removable);

        self.messages.drain(preserved..preserved + dropped);
        if dropped > 0 {
            debug!(dropped, remaining = self.messages.len(), "Trimmed transcript");
        }
        dropped
    }

    fn leading_system_count(&self) -> usize {
        self.messages
            .iter()
            .take_while(|m| m.role == MessageRole::System)
            .count()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new(40)
    }
}
