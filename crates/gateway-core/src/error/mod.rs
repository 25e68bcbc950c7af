//! Error types for the gateway
//!
//! Provider-facing code raises the typed variants of [`GatewayError`]; the
//! fallback orchestrator classifies them with [`GatewayError::failure_kind`]
//! to decide where to retry.

mod classify;
mod constructors;
mod types;

pub use classify::FailureKind;
pub use types::{GatewayError, GatewayResult};
