//! Error types for the chat client.

use thiserror::Error;

use crate::session::wire::ValidationError;

/// Coarse classification of a [`ChatError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The remote Session API could not be reached, answered with a
    /// non-success status, or returned a payload that failed validation.
    NetworkOrServerFailure,
    /// The request was refused locally before reaching the network.
    Rejected,
}

/// Errors produced by the session client and store.
#[derive(Debug, Error)]
pub enum ChatError {
    /// HTTP transport failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body, or the status reason.
        message: String,
    },

    /// The response payload did not match the expected schema.
    #[error("invalid response: {0}")]
    Validation(#[from] ValidationError),

    /// The configured API URL is not usable.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A message was sent with no active conversation.
    #[error("no active conversation")]
    NoActiveConversation,

    /// A message send is already outstanding.
    #[error("a message is already being sent")]
    SendInFlight,

    /// A conversation creation request is already outstanding.
    #[error("a conversation is already being created")]
    CreateInFlight,

    /// The store was disposed.
    #[error("session store has been disposed")]
    Disposed,
}

impl ChatError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Http(_) | Self::Status { .. } | Self::Validation(_) => {
                ErrorKind::NetworkOrServerFailure
            }
            Self::InvalidUrl(_)
            | Self::Config(_)
            | Self::NoActiveConversation
            | Self::SendInFlight
            | Self::CreateInFlight
            | Self::Disposed => ErrorKind::Rejected,
        }
    }

    /// Check if retrying the same operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::NetworkOrServerFailure)
    }
}

/// Convenience result alias for client operations.
pub type ChatResult<T> = Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_is_network_failure() {
        let err = ChatError::Status {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::NetworkOrServerFailure);
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "server returned 500: boom");
    }

    #[test]
    fn test_guards_are_not_retryable() {
        assert_eq!(ChatError::SendInFlight.kind(), ErrorKind::Rejected);
        assert!(!ChatError::CreateInFlight.is_retryable());
        assert!(!ChatError::NoActiveConversation.is_retryable());
    }

    #[test]
    fn test_validation_error_wraps() {
        let err: ChatError = ValidationError::MissingField {
            field: "session.id".to_string(),
        }
        .into();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("session.id"));
    }
}
