//! Provider fallback
//!
//! Tries the requested provider first and falls through the configured
//! order, ending with the always-available Mock provider.

mod operation;
mod orchestrator;
mod policy;
mod state;
mod types;

#[cfg(test)]
mod tests;

pub use operation::{Operation, StreamGeneration, StructuredGeneration, SyncGeneration};
pub use orchestrator::FallbackOrchestrator;
pub use policy::FallbackPolicy;
pub use state::HealthRegistry;
pub use types::{Attempted, FallbackEvent, FallbackReason, ProviderHealthStatus};
