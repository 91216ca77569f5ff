//! Conversation sessions: domain types, the remote Session API and the
//! store that keeps both in sync.
//!
//! - [`types`]: conversations, messages and retrieved contexts
//! - [`wire`]: JSON payloads and their validation into domain types
//! - [`api`]: the [`SessionApi`] seam
//! - [`http`]: the reqwest-backed [`HttpSessionApi`]
//! - [`store`]: the [`SessionStore`] and its published [`SessionSnapshot`]

pub mod api;
pub mod http;
pub mod store;
pub mod types;
pub mod wire;

pub use api::{ApiFuture, SessionApi};
pub use http::HttpSessionApi;
pub use store::{Failure, Intent, SessionSnapshot, SessionStore};
pub use types::{Conversation, Message, RetrievedContext, Role};
