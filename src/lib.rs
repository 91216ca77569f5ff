//! Terminal client for a question-answering assistant over a regulatory
//! document corpus.
//!
//! The crate renders conversation history, forwards questions to a remote
//! Session API and displays answers with the retrieved passages that
//! support them. Retrieval and generation live behind the API.
//!
//! - [`session`]: domain types, the typed API boundary and the session store
//! - [`markup`]: the message renderer
//! - [`display`]: terminal rendering of the list, transcript and context panel
//! - [`app`]: the interactive loop
//! - [`server`]: a development mock of the Session API

// Strict lint policy for the whole crate
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(unused_must_use)]
#![deny(nonstandard_style)]
#![deny(overflowing_literals)]
#![forbid(unsafe_op_in_unsafe_fn)]
// Clippy
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(clippy::unwrap_used)] // propagate errors instead
#![deny(clippy::expect_used)]
#![deny(clippy::print_stdout)] // output goes through explicit writers
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::redundant_clone)]
#![deny(clippy::cognitive_complexity)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]
#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used))]

/// Interactive terminal client.
#[allow(clippy::future_not_send)]
pub mod app;
/// Client and mock server configuration.
pub mod config;
/// Terminal rendering.
pub mod display;
/// Error types.
pub mod error;
/// Message renderer.
pub mod markup;
/// Development mock of the Session API.
pub mod server;
/// Sessions: types, API and store.
pub mod session;
/// Entry helpers for the binaries.
pub mod start;

pub use error::{ChatError, ChatResult, ErrorKind};

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` overrides `default_directive`. Calling this twice is a no-op.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
