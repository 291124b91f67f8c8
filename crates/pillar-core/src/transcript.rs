//! Chat transcript shown in the research view

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
    /// Set on an inline failure note
    pub failure: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            failure: false,
            created_at: Utc::now(),
        }
    }
}

/// Ordered, append-only message list. Only the last assistant message is
/// ever changed in place, while its reply streams in.
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(Message::new(Role::User, text));
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.messages.push(Message::new(Role::Assistant, text));
    }

    /// Empty assistant message that receives streamed chunks
    pub fn begin_reply(&mut self) {
        self.push_assistant(String::new());
    }

    /// Append to the trailing assistant message. Returns it, or `None` if
    /// the transcript does not end with one.
    pub fn append_to_last(&mut self, chunk: &str) -> Option<&Message> {
        let last = self.messages.last_mut()?;
        if last.role != Role::Assistant || last.failure {
            return None;
        }
        last.text.push_str(chunk);
        Some(last)
    }

    /// Drop a trailing assistant placeholder that never received text
    pub fn discard_empty_reply(&mut self) {
        let empty = self
            .messages
            .last()
            .is_some_and(|m| m.role == Role::Assistant && !m.failure && m.text.is_empty());
        if empty {
            self.messages.pop();
        }
    }

    pub fn push_failure_note(&mut self, text: impl Into<String>) {
        let mut note = Message::new(Role::Assistant, text);
        note.failure = true;
        self.messages.push(note);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
