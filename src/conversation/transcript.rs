//! Append-only conversation transcript.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who said a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human user.
    User,
    /// The assistant.
    Assistant,
}

/// One chat message. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Monotonic id within one conversation.
    pub id: u64,
    /// Author.
    pub role: Role,
    /// Message text.
    pub text: String,
    /// When the message was appended.
    pub timestamp: DateTime<Utc>,
    /// Backend provider tag, for assistant messages that report one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_provider: Option<String>,
}

/// Ordered message sequence for one conversation.
///
/// Append-only; insertion order is display order. Ids keep counting up
/// across [`Transcript::reset`] so a response that resolves after a clear
/// can never collide with the reseeded greeting.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
    next_id: u64,
}

impl Transcript {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            next_id: 1,
        }
    }

    /// Append a message and return a copy of it.
    pub fn append(
        &mut self,
        role: Role,
        text: impl Into<String>,
        source_provider: Option<String>,
    ) -> Message {
        let message = Message {
            id: self.next_id,
            role,
            text: text.into(),
            timestamp: Utc::now(),
            source_provider,
        };
        self.next_id += 1;
        self.messages.push(message.clone());
        message
    }

    /// Drop all messages and reseed with a single assistant greeting.
    ///
    /// The id counter is deliberately not reset.
    pub fn reset(&mut self, greeting: &str) -> Message {
        self.messages.clear();
        self.append(Role::Assistant, greeting, None)
    }

    /// All messages in display order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Look up a message by id.
    pub fn get(&self, id: u64) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the transcript holds no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}
