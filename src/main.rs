//! Binary entrypoint for the interactive regulations assistant client.

use std::process::ExitCode;

use regassist::start;

/// Start the client against the configured Session API.
fn main() -> ExitCode {
    start::run_client()
}
