//! Domain types for conversations held by the client.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Typed by the person using the client.
    User,
    /// Produced by the remote assistant.
    Assistant,
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Label shown above a message.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A supporting source passage attached to an assistant answer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetrievedContext {
    /// Server-assigned identifier.
    pub id: String,
    /// Raw passage text; may embed `$...$` math spans.
    pub content: String,
    /// Relevance score, conventionally in `[0, 1]` but never clamped.
    pub relevance_score: f64,
    /// Human-readable citation.
    pub source: String,
}

/// One message of a conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned identifier.
    pub id: String,
    /// Author role.
    pub role: Role,
    /// Raw content. Plain for user messages, possibly markup-bearing for
    /// assistant messages.
    pub content: String,
    /// When the message was created.
    pub timestamp: DateTime<Utc>,
    /// Supporting passages; only ever non-empty on assistant answers.
    #[serde(default)]
    pub contexts: Vec<RetrievedContext>,
}

/// A server-owned thread of messages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Server-assigned identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Messages in chronological order. Only ever appended to.
    pub messages: Vec<Message>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last activity time.
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// The most recent message, if any.
    #[must_use]
    pub fn latest_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Title to display, falling back when the server sent none.
    #[must_use]
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Untitled conversation"
        } else {
            &self.title
        }
    }

    /// Append messages in the given order and bump `updated_at`.
    pub fn append(&mut self, messages: impl IntoIterator<Item = Message>, now: DateTime<Utc>) {
        self.messages.extend(messages);
        self.updated_at = now;
    }
}
