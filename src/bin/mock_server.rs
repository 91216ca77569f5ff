//! Development mock of the Session API.
//! Run with: cargo run --bin regassist-mock

use std::process::ExitCode;

use regassist::start;

fn main() -> ExitCode {
    start::run_mock_server()
}
