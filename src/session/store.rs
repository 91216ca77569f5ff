//! Session store: the single source of truth for which conversations exist
//! and which one is active.
//!
//! All remote calls go through a [`SessionApi`]. Local state is a cache that
//! is replaced or extended only after a call succeeds; a failed call leaves
//! it untouched, is logged, recorded as the snapshot's `last_failure`, and
//! returned to the caller.
//!
//! Observers call [`SessionStore::subscribe`] and re-render from the
//! published [`SessionSnapshot`] after each change.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tokio::sync::{RwLock, watch};
use tracing::{debug, error, info, warn};

use crate::error::{ChatError, ChatResult};

use super::api::SessionApi;
use super::types::{Conversation, Message, RetrievedContext};

/// A user intent that reached the network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    /// Fetch the session list.
    LoadAll,
    /// Allocate a new conversation.
    CreateConversation,
    /// Delete a conversation.
    DeleteConversation {
        /// Conversation to delete.
        id: String,
    },
    /// Send a message.
    SendMessage {
        /// Conversation the message was addressed to.
        conversation_id: String,
        /// Message text.
        text: String,
    },
}

impl Intent {
    /// Short description for status lines.
    #[must_use]
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::LoadAll => "loading conversations",
            Self::CreateConversation => "creating a conversation",
            Self::DeleteConversation { .. } => "deleting a conversation",
            Self::SendMessage { .. } => "sending a message",
        }
    }
}

/// The most recent failed remote operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Failure {
    /// What was attempted.
    pub intent: Intent,
    /// Error description.
    pub message: String,
    /// Whether retrying may help.
    pub retryable: bool,
}

/// Immutable view of the store published after every change.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionSnapshot {
    /// Conversations in display order.
    pub conversations: Vec<Conversation>,
    /// Identifier of the active conversation.
    pub active_id: Option<String>,
    /// A message send is outstanding.
    pub busy: bool,
    /// A conversation creation is outstanding.
    pub creating: bool,
    /// Last failed remote operation, until the same operation succeeds.
    pub last_failure: Option<Failure>,
}

impl SessionSnapshot {
    /// The active conversation, if its id is present in the set.
    #[must_use]
    pub fn active(&self) -> Option<&Conversation> {
        let id = self.active_id.as_deref()?;
        self.conversations.iter().find(|c| c.id == id)
    }

    /// Retrieved contexts of the latest message of the active conversation.
    #[must_use]
    pub fn latest_contexts(&self) -> &[RetrievedContext] {
        self.active()
            .and_then(Conversation::latest_message)
            .map_or(&[], |m| m.contexts.as_slice())
    }
}

#[derive(Debug, Default)]
struct StoreState {
    conversations: Vec<Conversation>,
    active_id: Option<String>,
    last_failure: Option<Failure>,
}

impl StoreState {
    fn contains(&self, id: &str) -> bool {
        self.conversations.iter().any(|c| c.id == id)
    }

    fn clear_failure_for(&mut self, intent: &Intent) {
        if self
            .last_failure
            .as_ref()
            .is_some_and(|f| f.intent == *intent)
        {
            self.last_failure = None;
        }
    }
}

/// Sets a flag on acquisition and clears it when dropped, so the flag is
/// released exactly once on every exit path.
struct FlagGuard(Arc<AtomicBool>);

impl FlagGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for FlagGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Conversation state synchronised with the remote Session API.
///
/// Cloning is cheap and yields a handle to the same store.
#[derive(Clone)]
pub struct SessionStore {
    api: Arc<dyn SessionApi>,
    state: Arc<RwLock<StoreState>>,
    busy: Arc<AtomicBool>,
    creating: Arc<AtomicBool>,
    disposed: Arc<AtomicBool>,
    publisher: Arc<watch::Sender<SessionSnapshot>>,
}

impl SessionStore {
    /// Create an empty store over the given API.
    #[must_use]
    pub fn new(api: Arc<dyn SessionApi>) -> Self {
        let (publisher, _) = watch::channel(SessionSnapshot::default());
        Self {
            api,
            state: Arc::new(RwLock::new(StoreState::default())),
            busy: Arc::new(AtomicBool::new(false)),
            creating: Arc::new(AtomicBool::new(false)),
            disposed: Arc::new(AtomicBool::new(false)),
            publisher: Arc::new(publisher),
        }
    }

    /// Start the store: fetch the session list once.
    ///
    /// # Errors
    /// Returns the load error; the store stays usable with an empty set.
    pub async fn init(&self) -> ChatResult<()> {
        info!("Initializing session store");
        self.load_all().await.map(|_| ())
    }

    /// Shut the store down. Every later operation returns [`ChatError::Disposed`].
    pub async fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
        *self.state.write().await = StoreState::default();
        self.publish().await;
        info!("Session store disposed");
    }

    /// Receive a snapshot after every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.publisher.subscribe()
    }

    /// Current state.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        self.snapshot_of(&state)
    }

    /// Whether a message send is outstanding.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Fetch every session and replace local state with it.
    ///
    /// Selects the first conversation when none is active yet.
    ///
    /// # Errors
    /// Returns the remote failure; local state is left unchanged.
    pub async fn load_all(&self) -> ChatResult<usize> {
        self.ensure_live()?;

        match self.api.list_sessions().await {
            Ok(sessions) => {
                let count = sessions.len();
                {
                    let mut state = self.state.write().await;
                    state.conversations = sessions;
                    if state.active_id.is_none() {
                        state.active_id = state.conversations.first().map(|c| c.id.clone());
                    }
                    state.clear_failure_for(&Intent::LoadAll);
                }
                info!("Loaded {} conversations", count);
                self.publish().await;
                Ok(count)
            }
            Err(e) => {
                error!("Error fetching sessions: {}", e);
                self.fail(Intent::LoadAll, e).await
            }
        }
    }

    /// Make a conversation active. Purely local; an id that is not in the set
    /// simply leaves nothing active for display.
    ///
    /// # Errors
    /// Returns [`ChatError::Disposed`] after disposal.
    pub async fn select_active(&self, id: impl Into<String>) -> ChatResult<()> {
        self.ensure_live()?;
        let id = id.into();
        {
            let mut state = self.state.write().await;
            if !state.contains(&id) {
                debug!("Selected conversation {} is not in the local set", id);
            }
            state.active_id = Some(id);
        }
        self.publish().await;
        Ok(())
    }

    /// Ask the server for a new conversation, insert it first and make it active.
    ///
    /// # Errors
    /// Returns [`ChatError::CreateInFlight`] while another creation is
    /// outstanding, or the remote failure.
    pub async fn create_conversation(&self) -> ChatResult<Conversation> {
        self.ensure_live()?;
        let guard = FlagGuard::acquire(&self.creating).ok_or(ChatError::CreateInFlight)?;
        self.publish().await;

        let result = self.api.create_session().await;
        drop(guard);

        match result {
            Ok(conversation) => {
                {
                    let mut state = self.state.write().await;
                    state.conversations.insert(0, conversation.clone());
                    state.active_id = Some(conversation.id.clone());
                    state.clear_failure_for(&Intent::CreateConversation);
                }
                info!("Created conversation {}", conversation.id);
                self.publish().await;
                Ok(conversation)
            }
            Err(e) => {
                error!("Error creating new chat: {}", e);
                self.fail(Intent::CreateConversation, e).await
            }
        }
    }

    /// Delete a conversation remotely, then locally.
    ///
    /// If it was active, the first remaining conversation becomes active, or
    /// none when the set is empty.
    ///
    /// # Errors
    /// Returns the remote failure; local state is left unchanged.
    pub async fn delete_conversation(&self, id: &str) -> ChatResult<()> {
        self.ensure_live()?;

        match self.api.delete_session(id).await {
            Ok(()) => {
                {
                    let mut state = self.state.write().await;
                    state.conversations.retain(|c| c.id != id);
                    if state.active_id.as_deref() == Some(id) {
                        state.active_id = state.conversations.first().map(|c| c.id.clone());
                    }
                    state.clear_failure_for(&Intent::DeleteConversation { id: id.to_string() });
                }
                info!("Deleted conversation {}", id);
                self.publish().await;
                Ok(())
            }
            Err(e) => {
                error!("Error deleting conversation {}: {}", id, e);
                self.fail(Intent::DeleteConversation { id: id.to_string() }, e)
                    .await
            }
        }
    }

    /// Send a message to the active conversation.
    ///
    /// Returns the messages the server appended.
    ///
    /// # Errors
    /// Returns [`ChatError::NoActiveConversation`] without an active
    /// conversation, [`ChatError::SendInFlight`] while another send is
    /// outstanding, or the remote failure.
    pub async fn send_user_message(&self, text: &str) -> ChatResult<Vec<Message>> {
        self.ensure_live()?;
        let conversation_id = {
            let state = self.state.read().await;
            state
                .active_id
                .clone()
                .filter(|id| state.contains(id))
                .ok_or(ChatError::NoActiveConversation)?
        };
        self.send_to(&conversation_id, text).await
    }

    /// Send a message to a specific conversation.
    ///
    /// The busy flag is process-wide: while any send is outstanding, no other
    /// conversation can be messaged. Appended messages go to the addressed
    /// conversation even if the active selection changed meanwhile.
    ///
    /// # Errors
    /// Returns [`ChatError::SendInFlight`] while another send is outstanding,
    /// or the remote failure.
    pub async fn send_to(&self, conversation_id: &str, text: &str) -> ChatResult<Vec<Message>> {
        self.ensure_live()?;
        let guard = FlagGuard::acquire(&self.busy).ok_or(ChatError::SendInFlight)?;
        self.publish().await;

        let result = self.api.post_message(conversation_id, text).await;
        drop(guard);

        let intent = Intent::SendMessage {
            conversation_id: conversation_id.to_string(),
            text: text.to_string(),
        };

        match result {
            Ok(messages) => {
                {
                    let mut state = self.state.write().await;
                    if let Some(conversation) = state
                        .conversations
                        .iter_mut()
                        .find(|c| c.id == conversation_id)
                    {
                        conversation.append(messages.iter().cloned(), Utc::now());
                    } else {
                        warn!(
                            "Conversation {} disappeared before its reply arrived; dropping {} messages",
                            conversation_id,
                            messages.len()
                        );
                    }
                    state.clear_failure_for(&intent);
                }
                debug!(
                    "Appended {} messages to conversation {}",
                    messages.len(),
                    conversation_id
                );
                self.publish().await;
                Ok(messages)
            }
            Err(e) => {
                error!("Error sending message: {}", e);
                self.fail(intent, e).await
            }
        }
    }

    /// Re-run the last failed operation.
    ///
    /// Returns `false` when there was nothing to retry.
    ///
    /// # Errors
    /// Returns the error of the retried operation.
    pub async fn retry_last_failure(&self) -> ChatResult<bool> {
        self.ensure_live()?;
        let Some(failure) = self.state.read().await.last_failure.clone() else {
            return Ok(false);
        };

        info!("Retrying {}", failure.intent.describe());
        match failure.intent {
            Intent::LoadAll => self.load_all().await.map(|_| ()),
            Intent::CreateConversation => self.create_conversation().await.map(|_| ()),
            Intent::DeleteConversation { id } => self.delete_conversation(&id).await,
            Intent::SendMessage {
                conversation_id,
                text,
            } => self.send_to(&conversation_id, &text).await.map(|_| ()),
        }?;
        Ok(true)
    }

    fn ensure_live(&self) -> ChatResult<()> {
        if self.disposed.load(Ordering::Acquire) {
            Err(ChatError::Disposed)
        } else {
            Ok(())
        }
    }

    async fn fail<T>(&self, intent: Intent, err: ChatError) -> ChatResult<T> {
        {
            let mut state = self.state.write().await;
            state.last_failure = Some(Failure {
                intent,
                message: err.to_string(),
                retryable: err.is_retryable(),
            });
        }
        self.publish().await;
        Err(err)
    }

    fn snapshot_of(&self, state: &StoreState) -> SessionSnapshot {
        SessionSnapshot {
            conversations: state.conversations.clone(),
            active_id: state.active_id.clone(),
            busy: self.is_busy(),
            creating: self.creating.load(Ordering::Acquire),
            last_failure: state.last_failure.clone(),
        }
    }

    /// Publishers are serialized on the write lock, so the last value on the
    /// channel always reflects the latest state.
    async fn publish(&self) {
        let state = self.state.write().await;
        self.publisher.send_replace(self.snapshot_of(&state));
    }
}
