//! HTTP route handlers for the mock Session API.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::session::wire::{ErrorBody, WireMessage, WireSession};

use super::state::MockState;

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, message: &str) -> ApiError {
    (
        status,
        Json(ErrorBody {
            status: Some("error".to_string()),
            message: Some(message.to_string()),
        }),
    )
}

fn not_found() -> ApiError {
    api_error(StatusCode::NOT_FOUND, "Session not found")
}

/// Create the API router with all routes.
pub fn create_router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/sessions", get(list_sessions).post(create_session))
        .route("/api/sessions/{id}", delete(delete_session))
        .route("/api/sessions/{id}/messages", post(add_message))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "regassist-mock",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn list_sessions(State(state): State<Arc<MockState>>) -> Json<Value> {
    let sessions: Vec<WireSession> = state.list().iter().map(WireSession::from).collect();
    Json(json!({
        "status": "success",
        "sessions": sessions
    }))
}

async fn create_session(State(state): State<Arc<MockState>>) -> (StatusCode, Json<Value>) {
    let session = state.create();
    info!("Created session {}", session.id);
    (
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "session": WireSession::from(&session)
        })),
    )
}

async fn delete_session(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !state.delete(&id) {
        return Err(not_found());
    }
    info!("Deleted session {}", id);
    Ok(Json(json!({
        "status": "success",
        "message": "Session deleted successfully"
    })))
}

/// Body of a message post. The field is optional so a missing one maps to 400.
#[derive(Debug, Deserialize)]
struct AddMessageRequest {
    message: Option<String>,
}

async fn add_message(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    if !state.contains(&id) {
        return Err(not_found());
    }

    let text = serde_json::from_slice::<AddMessageRequest>(&body)
        .ok()
        .and_then(|request| request.message)
        .filter(|message| !message.trim().is_empty())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Message is required"))?;

    let appended = state.post(&id, &text).ok_or_else(not_found)?;
    let messages: Vec<WireMessage> = appended.iter().map(WireMessage::from).collect();
    Ok(Json(json!({
        "status": "success",
        "messages": messages
    })))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    use super::*;
    use crate::session::wire::{MessagesBody, SessionBody, SessionListBody, decode};

    async fn call(router: Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())));
        let Ok(request) = request else {
            return (StatusCode::IM_A_TEAPOT, String::new());
        };
        let Ok(response) = router.oneshot(request).await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn test_health() {
        let router = create_router(Arc::new(MockState::new(false)));
        let (status, body) = call(router, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("regassist-mock"));
    }

    #[tokio::test]
    async fn test_list_validates_as_sessions() {
        let router = create_router(Arc::new(MockState::new(true)));
        let (status, body) = call(router, Method::GET, "/api/sessions", None).await;
        assert_eq!(status, StatusCode::OK);

        let sessions = decode::<SessionListBody>(&body).and_then(SessionListBody::validate);
        let sessions = sessions.unwrap_or_default();
        assert_eq!(sessions.len(), 3);
        assert_eq!(sessions[0].title, "Uniform Regulations");
        assert!(!sessions[0].messages[1].contexts.is_empty());
    }

    #[tokio::test]
    async fn test_create_returns_201() {
        let state = Arc::new(MockState::new(false));
        let (status, body) = call(
            create_router(state.clone()),
            Method::POST,
            "/api/sessions",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let session = decode::<SessionBody>(&body).and_then(SessionBody::validate);
        assert!(session.is_ok_and(|s| s.messages.is_empty() && s.title.starts_with("Chat ")));
        assert_eq!(state.len(), 1);
    }

    #[tokio::test]
    async fn test_post_message_returns_echo_and_reply() {
        let state = Arc::new(MockState::new(false));
        let id = state.create().id;
        let (status, body) = call(
            create_router(state),
            Method::POST,
            &format!("/api/sessions/{id}/messages"),
            Some(r#"{"message": "Describe conduct expectations"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let messages = decode::<MessagesBody>(&body)
            .and_then(MessagesBody::validate)
            .unwrap_or_default();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "Describe conduct expectations");
        assert!(messages[1].content.starts_with("## Conduct Expectations"));
    }

    #[tokio::test]
    async fn test_missing_message_is_400() {
        let state = Arc::new(MockState::new(false));
        let id = state.create().id;
        let (status, body) = call(
            create_router(state),
            Method::POST,
            &format!("/api/sessions/{id}/messages"),
            Some("{}"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Message is required"));
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let router = create_router(Arc::new(MockState::new(false)));
        let (status, body) = call(router.clone(), Method::DELETE, "/api/sessions/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Session not found"));

        let (status, _) = call(
            router,
            Method::POST,
            "/api/sessions/nope/messages",
            Some(r#"{"message": "hi"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
