//! AI Gateway Core Library
//!
//! Routes generation requests across interchangeable LLM backends, streams
//! partial output as framed events, falls back when a backend fails or times
//! out, and tracks per-backend usage and cost.

pub mod analysis;
pub mod config;
pub mod cost;
pub mod credential;
pub mod error;
pub mod fallback;
pub mod gateway;
pub mod ledger;
pub mod providers;
pub mod rate_limiter;
pub mod streaming;
pub mod timeout;
pub mod types;

// Re-export commonly used types
pub use analysis::{Activity, AnalysisContext, AnalysisKind};
pub use config::{GatewayConfig, RuntimeEnvironment, load_config};
pub use credential::{
    ConfigurationResolver, CredentialKey, CredentialStore, InMemoryCredentialStore,
    JsonFileCredentialStore, ProviderConfiguration,
};
pub use error::{FailureKind, GatewayError, GatewayResult};
pub use fallback::{FallbackEvent, FallbackReason, ProviderHealthStatus};
pub use gateway::{Diagnostics, Gateway, GatewayBuilder, GatewayResponse};
pub use ledger::UsageLedger;
pub use streaming::{FrameStream, StreamFrame, StreamLimits};
pub use types::*;
