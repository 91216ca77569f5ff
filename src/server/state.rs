//! In-memory session table shared across request handlers.

use chrono::{Local, Utc};
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::session::{Conversation, Message};

use super::fixtures::{Responder, sample_conversations, user_message};

/// Shared mock server state.
pub struct MockState {
    sessions: DashMap<String, Conversation>,
    responder: Responder,
}

impl MockState {
    /// Create the state, optionally seeded with the sample conversations.
    #[must_use]
    pub fn new(seed: bool) -> Self {
        let responder = Responder::new();
        let sessions = DashMap::new();
        if seed {
            for conversation in sample_conversations(&responder, Utc::now()) {
                sessions.insert(conversation.id.clone(), conversation);
            }
        }
        Self {
            sessions,
            responder,
        }
    }

    /// Number of stored sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no sessions are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Whether a session exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    /// All sessions, most recently updated first.
    #[must_use]
    pub fn list(&self) -> Vec<Conversation> {
        let mut sessions: Vec<Conversation> =
            self.sessions.iter().map(|entry| entry.value().clone()).collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sessions
    }

    /// Allocate an empty session titled after the local time.
    #[must_use]
    pub fn create(&self) -> Conversation {
        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::new_v4().simple().to_string(),
            title: format!("Chat {}", Local::now().format("%Y-%m-%d %H:%M")),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.sessions
            .insert(conversation.id.clone(), conversation.clone());
        debug!("Created mock session {}", conversation.id);
        conversation
    }

    /// Remove a session. Returns `false` if it did not exist.
    pub fn delete(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Append the user's message and a canned reply. Returns both, or `None`
    /// if the session does not exist.
    pub fn post(&self, id: &str, text: &str) -> Option<Vec<Message>> {
        let mut session = self.sessions.get_mut(id)?;
        let now = Utc::now();
        let appended = vec![user_message(text, now), self.responder.reply(text, now)];
        session.append(appended.iter().cloned(), now);
        Some(appended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;

    #[test]
    fn test_seeded_state() {
        let state = MockState::new(true);
        assert_eq!(state.len(), 3);
        let listed = state.list();
        assert_eq!(listed[0].title, "Uniform Regulations");
        assert_eq!(listed[2].title, "Chain of Command");
        assert!(MockState::new(false).is_empty());
    }

    #[test]
    fn test_create_and_post_reorders_list() {
        let state = MockState::new(true);
        let created = state.create();
        assert!(created.title.starts_with("Chat "));
        assert_eq!(created.title.len(), "Chat 2025-01-01 10:00".len());

        let oldest = state.list()[3].id.clone();
        let appended = state.post(&oldest, "What about leave?");
        let roles: Vec<Role> = appended
            .unwrap_or_default()
            .iter()
            .map(|m| m.role)
            .collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
        assert_eq!(state.list()[0].id, oldest);
    }

    #[test]
    fn test_unknown_ids() {
        let state = MockState::new(false);
        assert!(!state.delete("nope"));
        assert!(state.post("nope", "hi").is_none());
    }
}
