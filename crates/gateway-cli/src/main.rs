//! AI gateway CLI
//!
//! Operator tool around `gateway-core`:
//!
//! - `gateway generate "<prompt>"` sends one request and prints the JSON
//!   result, or SSE frames with `--mode stream`
//! - `gateway diagnostics` prints provider health, usage and cost
//! - `gateway encrypt-credential` seals an API key for the configuration store
//!
//! Logging goes to stderr. Set `RUST_LOG=debug` for verbose output.

mod args;
mod commands;
mod logging;
mod router;

use clap::Parser;

pub use args::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    router::route(cli).await
}
