//! The remote Session API as seen by the store.

use std::future::Future;
use std::pin::Pin;

use crate::error::ChatResult;

use super::types::{Conversation, Message};

/// Boxed future type for Session API calls.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Operations of the remote Session API.
///
/// Implementations return validated domain values; the store never sees raw
/// wire payloads.
pub trait SessionApi: Send + Sync {
    /// Fetch every session with its messages, in server order.
    fn list_sessions(&self) -> ApiFuture<'_, ChatResult<Vec<Conversation>>>;

    /// Ask the server to allocate a new, empty session.
    fn create_session(&self) -> ApiFuture<'_, ChatResult<Conversation>>;

    /// Delete a session.
    fn delete_session<'a>(&'a self, id: &'a str) -> ApiFuture<'a, ChatResult<()>>;

    /// Post a user message and return the messages the server appended, in order.
    fn post_message<'a>(
        &'a self,
        id: &'a str,
        text: &'a str,
    ) -> ApiFuture<'a, ChatResult<Vec<Message>>>;
}
