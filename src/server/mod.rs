//! Development mock of the remote Session API.
//!
//! Serves the four session routes under `/api` plus `/health`, backed by an
//! in-memory table and a keyword responder. Useful for running the client
//! without the retrieval backend.

pub mod fixtures;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::MockState;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::MockServerConfig;

/// Start the mock server.
///
/// # Errors
/// Returns an error if the port cannot be bound.
pub async fn run_server(config: &MockServerConfig) -> std::io::Result<()> {
    run_server_with_shutdown(config, std::future::pending()).await
}

/// Start the mock server with graceful shutdown support.
///
/// The server stops accepting connections when `shutdown_signal` completes.
///
/// # Errors
/// Returns an error if the port cannot be bound.
pub async fn run_server_with_shutdown<F>(
    config: &MockServerConfig,
    shutdown_signal: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = Arc::new(MockState::new(config.seed));
    tracing::info!("Mock session store holds {} sessions", state.len());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app: Router = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        "Mock Session API listening on http://{}/api",
        listener.local_addr()?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
}
