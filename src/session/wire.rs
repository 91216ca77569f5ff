//! Wire format of the remote Session API and its validation into domain types.
//!
//! Every payload is first decoded into permissive DTOs (all fields optional,
//! both key spellings accepted) and then validated field by field, so a
//! malformed response produces a [`ValidationError`] naming the offending
//! path instead of a half-populated conversation.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{Conversation, Message, RetrievedContext, Role};

/// Schema violations found in a Session API payload.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The body was not JSON of the expected overall shape.
    #[error("malformed body: {0}")]
    Malformed(String),
    /// A required field was absent or null.
    #[error("missing field `{field}`")]
    MissingField {
        /// Path of the field.
        field: String,
    },
    /// A role other than `user` or `assistant`.
    #[error("invalid role `{value}` at `{field}`")]
    InvalidRole {
        /// Path of the field.
        field: String,
        /// Value received.
        value: String,
    },
    /// A timestamp that is not an ISO date-time.
    #[error("invalid timestamp `{value}` at `{field}`")]
    InvalidTimestamp {
        /// Path of the field.
        field: String,
        /// Value received.
        value: String,
    },
}

/// Retrieved context as transmitted.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WireContext {
    /// Identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Passage text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Relevance score.
    #[serde(
        default,
        alias = "relevanceScore",
        skip_serializing_if = "Option::is_none"
    )]
    pub relevance_score: Option<f64>,
    /// Citation label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Message as transmitted.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WireMessage {
    /// Identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Raw content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// `user` or `assistant`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// ISO timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Supporting passages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contexts: Option<Vec<WireContext>>,
}

/// Session as transmitted.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WireSession {
    /// Identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display title; older backends call it `name`.
    #[serde(default, alias = "name", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Messages, absent on freshly created sessions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<WireMessage>>,
    /// ISO creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// ISO update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Body of `GET /sessions`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SessionListBody {
    /// All sessions in server order.
    #[serde(default)]
    pub sessions: Option<Vec<WireSession>>,
}

/// Body of `POST /sessions`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SessionBody {
    /// The created session.
    #[serde(default)]
    pub session: Option<WireSession>,
}

/// Body of `POST /sessions/{id}/messages`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MessagesBody {
    /// Newly appended messages, in order.
    #[serde(default)]
    pub messages: Option<Vec<WireMessage>>,
}

/// Request body of `POST /sessions/{id}/messages`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PostMessageRequest {
    /// The user's text.
    pub message: String,
}

/// Error body returned by the backend on failure.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Always `error` on failures.
    #[serde(default)]
    pub status: Option<String>,
    /// Human-readable reason.
    #[serde(default)]
    pub message: Option<String>,
}

/// Decode a JSON body into a DTO.
///
/// # Errors
/// Returns [`ValidationError::Malformed`] if the body is not valid JSON of
/// the expected shape.
pub fn decode<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, ValidationError> {
    serde_json::from_str(body).map_err(|e| ValidationError::Malformed(e.to_string()))
}

fn required<T>(value: Option<T>, field: impl FnOnce() -> String) -> Result<T, ValidationError> {
    value.ok_or_else(|| ValidationError::MissingField { field: field() })
}

/// Parse an ISO timestamp.
///
/// RFC 3339 strings keep their offset; naive date-times (as produced by
/// Python's `datetime.isoformat()`) are read in local time.
///
/// # Errors
/// Returns [`ValidationError::InvalidTimestamp`] if neither form parses.
pub fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, ValidationError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    let invalid = || ValidationError::InvalidTimestamp {
        field: field.to_string(),
        value: value.to_string(),
    };

    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .map_err(|_| invalid())?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(invalid)
}

impl WireContext {
    /// Validate into a [`RetrievedContext`].
    ///
    /// # Errors
    /// Returns an error if a required field is missing.
    pub fn validate(self, path: &str) -> Result<RetrievedContext, ValidationError> {
        Ok(RetrievedContext {
            id: required(self.id, || format!("{path}.id"))?,
            content: self.content.unwrap_or_default(),
            relevance_score: required(self.relevance_score, || {
                format!("{path}.relevance_score")
            })?,
            source: self.source.unwrap_or_default(),
        })
    }
}

impl WireMessage {
    /// Validate into a [`Message`].
    ///
    /// Contexts are only kept on assistant messages.
    ///
    /// # Errors
    /// Returns an error if a required field is missing, the role is unknown,
    /// or the timestamp does not parse.
    pub fn validate(self, path: &str) -> Result<Message, ValidationError> {
        let id = required(self.id, || format!("{path}.id"))?;
        let content = required(self.content, || format!("{path}.content"))?;
        let role_raw = required(self.role, || format!("{path}.role"))?;
        let role = match role_raw.as_str() {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            _ => {
                return Err(ValidationError::InvalidRole {
                    field: format!("{path}.role"),
                    value: role_raw,
                });
            }
        };
        let ts_field = format!("{path}.timestamp");
        let timestamp = parse_timestamp(&ts_field, &required(self.timestamp, || ts_field.clone())?)?;

        let contexts = match (role, self.contexts) {
            (Role::Assistant, Some(contexts)) => contexts
                .into_iter()
                .enumerate()
                .map(|(i, c)| c.validate(&format!("{path}.contexts[{i}]")))
                .collect::<Result<Vec<_>, _>>()?,
            _ => Vec::new(),
        };

        Ok(Message {
            id,
            role,
            content,
            timestamp,
            contexts,
        })
    }
}

impl WireSession {
    /// Validate into a [`Conversation`].
    ///
    /// # Errors
    /// Returns an error if a required field is missing or any nested message
    /// is invalid.
    pub fn validate(self, path: &str) -> Result<Conversation, ValidationError> {
        let id = required(self.id, || format!("{path}.id"))?;
        let created_field = format!("{path}.created_at");
        let created_at = parse_timestamp(
            &created_field,
            &required(self.created_at, || created_field.clone())?,
        )?;
        let updated_field = format!("{path}.updated_at");
        let updated_at = parse_timestamp(
            &updated_field,
            &required(self.updated_at, || updated_field.clone())?,
        )?;
        let messages = validate_messages(self.messages.unwrap_or_default(), &format!("{path}.messages"))?;

        Ok(Conversation {
            id,
            title: self.title.unwrap_or_default(),
            messages,
            created_at,
            updated_at,
        })
    }
}

/// Validate a list of messages, keeping their order.
///
/// # Errors
/// Returns the first validation error found.
pub fn validate_messages(
    messages: Vec<WireMessage>,
    path: &str,
) -> Result<Vec<Message>, ValidationError> {
    messages
        .into_iter()
        .enumerate()
        .map(|(i, m)| m.validate(&format!("{path}[{i}]")))
        .collect()
}

impl SessionListBody {
    /// Validate every session, keeping server order.
    ///
    /// # Errors
    /// Returns the first validation error found.
    pub fn validate(self) -> Result<Vec<Conversation>, ValidationError> {
        required(self.sessions, || "sessions".to_string())?
            .into_iter()
            .enumerate()
            .map(|(i, s)| s.validate(&format!("sessions[{i}]")))
            .collect()
    }
}

impl SessionBody {
    /// Validate the created session.
    ///
    /// # Errors
    /// Returns an error if the session is missing or invalid.
    pub fn validate(self) -> Result<Conversation, ValidationError> {
        required(self.session, || "session".to_string())?.validate("session")
    }
}

impl MessagesBody {
    /// Validate the appended messages.
    ///
    /// # Errors
    /// Returns the first validation error found.
    pub fn validate(self) -> Result<Vec<Message>, ValidationError> {
        validate_messages(required(self.messages, || "messages".to_string())?, "messages")
    }
}

impl From<&RetrievedContext> for WireContext {
    fn from(context: &RetrievedContext) -> Self {
        Self {
            id: Some(context.id.clone()),
            content: Some(context.content.clone()),
            relevance_score: Some(context.relevance_score),
            source: Some(context.source.clone()),
        }
    }
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self {
            id: Some(message.id.clone()),
            content: Some(message.content.clone()),
            role: Some(message.role.as_str().to_string()),
            timestamp: Some(message.timestamp.to_rfc3339()),
            contexts: (!message.contexts.is_empty())
                .then(|| message.contexts.iter().map(WireContext::from).collect()),
        }
    }
}

impl From<&Conversation> for WireSession {
    fn from(conversation: &Conversation) -> Self {
        Self {
            id: Some(conversation.id.clone()),
            title: Some(conversation.title.clone()),
            messages: Some(conversation.messages.iter().map(WireMessage::from).collect()),
            created_at: Some(conversation.created_at.to_rfc3339()),
            updated_at: Some(conversation.updated_at.to_rfc3339()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_list_validates() {
        let body = r#"{
            "status": "success",
            "sessions": [{
                "id": "s1",
                "name": "Chat 2025-01-01 10:00",
                "messages": [
                    {"id": "m1", "content": "hi", "role": "user", "timestamp": "2025-01-01T10:00:00Z"},
                    {"id": "m2", "content": "**hello**", "role": "assistant",
                     "timestamp": "2025-01-01T10:00:05+00:00",
                     "contexts": [{"id": "c1", "content": "Section 1", "relevance_score": 0.9,
                                   "source": "Part II"}]}
                ],
                "created_at": "2025-01-01T10:00:00Z",
                "updated_at": "2025-01-01T10:00:05Z"
            }]
        }"#;

        let sessions = decode::<SessionListBody>(body).and_then(SessionListBody::validate);
        let sessions = sessions.unwrap_or_default();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].title, "Chat 2025-01-01 10:00");
        assert_eq!(sessions[0].messages.len(), 2);
        assert_eq!(sessions[0].messages[1].role, Role::Assistant);
        assert_eq!(sessions[0].messages[1].contexts.len(), 1);
        assert!((sessions[0].messages[1].contexts[0].relevance_score - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_camel_case_relevance_accepted() {
        let body = r#"{"id": "c", "content": "x", "relevanceScore": 1.37, "source": "s"}"#;
        let ctx = decode::<WireContext>(body).and_then(|c| c.validate("ctx"));
        assert!(ctx.is_ok_and(|c| (c.relevance_score - 1.37).abs() < f64::EPSILON));
    }

    #[test]
    fn test_invalid_role_names_field() {
        let body = r#"{"messages": [
            {"id": "m1", "content": "x", "role": "system", "timestamp": "2025-01-01T00:00:00Z"}
        ]}"#;
        let err = decode::<MessagesBody>(body).and_then(MessagesBody::validate);
        assert_eq!(
            err,
            Err(ValidationError::InvalidRole {
                field: "messages[0].role".to_string(),
                value: "system".to_string(),
            })
        );
    }

    #[test]
    fn test_missing_id_names_field() {
        let body = r#"{"session": {"title": "t", "created_at": "2025-01-01T00:00:00Z",
                       "updated_at": "2025-01-01T00:00:00Z"}}"#;
        let err = decode::<SessionBody>(body).and_then(SessionBody::validate);
        assert_eq!(
            err,
            Err(ValidationError::MissingField {
                field: "session.id".to_string()
            })
        );
    }

    #[test]
    fn test_created_session_without_messages() {
        let body = r#"{"session": {"id": "s9", "title": "New",
                       "created_at": "2025-01-01T00:00:00Z", "updated_at": "2025-01-01T00:00:00Z"}}"#;
        let conv = decode::<SessionBody>(body).and_then(SessionBody::validate);
        assert!(conv.is_ok_and(|c| c.messages.is_empty() && c.id == "s9"));
    }

    #[test]
    fn test_naive_timestamp_is_local_time() {
        let parsed = parse_timestamp("t", "2025-03-04T05:06:07.123456");
        let naive = NaiveDateTime::parse_from_str("2025-03-04T05:06:07.123456", "%Y-%m-%dT%H:%M:%S%.f");
        let expected = naive
            .ok()
            .and_then(|n| Local.from_local_datetime(&n).earliest())
            .map(|l| l.with_timezone(&Utc));
        assert_eq!(parsed.ok(), expected);
    }

    #[test]
    fn test_garbage_timestamp_rejected() {
        let err = parse_timestamp("messages[0].timestamp", "yesterday");
        assert!(matches!(err, Err(ValidationError::InvalidTimestamp { .. })));
    }

    #[test]
    fn test_user_message_contexts_dropped() {
        let msg = WireMessage {
            id: Some("m".to_string()),
            content: Some("q".to_string()),
            role: Some("user".to_string()),
            timestamp: Some("2025-01-01T00:00:00Z".to_string()),
            contexts: Some(vec![WireContext::default()]),
        };
        assert!(msg.validate("m").is_ok_and(|m| m.contexts.is_empty()));
    }

    #[test]
    fn test_malformed_body() {
        let err = decode::<SessionListBody>("<html>");
        assert!(matches!(err, Err(ValidationError::Malformed(_))));
    }
}
