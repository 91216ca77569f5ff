//! Startup helpers for the two binaries.

use std::process::ExitCode;

use crate::config::{ClientConfig, MockServerConfig};
use crate::{app, init_tracing, server};

/// Run the interactive client (used by the `regassist` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on a normal exit, `1` on failure.
#[must_use]
pub fn run_client() -> ExitCode {
    init_tracing("warn");
    tracing::info!("Starting regassist v{}", env!("CARGO_PKG_VERSION"));

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(app::run(config)) {
        tracing::error!("Client error: {e:#}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Run the mock Session API (used by the `regassist-mock` binary) until
/// Ctrl-C.
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run_mock_server() -> ExitCode {
    init_tracing("info");
    tracing::info!("Starting regassist mock v{}", env!("CARGO_PKG_VERSION"));

    let config = match MockServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutting down");
    };

    if let Err(e) = rt.block_on(server::run_server_with_shutdown(&config, shutdown)) {
        tracing::error!("Server error: {e}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}
