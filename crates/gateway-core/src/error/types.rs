//! Core error type for the gateway

use crate::timeout::OperationClass;
use crate::types::ProviderKind;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Main error type for the gateway
///
/// Provider errors never cross the `Gateway` boundary undecorated: the fallback
/// orchestrator catches every variant below and retries or degrades. Only
/// `InvalidRequest` is ever returned to the HTTP layer.
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    /// No usable active provider configuration
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        context: Option<String>,
    },

    /// Bad or missing credential
    #[error("Authentication error: {provider}: {message}")]
    Authentication {
        provider: ProviderKind,
        message: String,
    },

    /// Provider or local usage ceiling exceeded
    #[error("Rate limit exceeded for {provider}: {message}")]
    RateLimit {
        provider: ProviderKind,
        message: String,
        retry_after: Option<Duration>,
    },

    /// A deadline fired at some layer
    #[error("{operation} timed out after {}ms", elapsed.as_millis())]
    Timeout {
        operation: OperationClass,
        elapsed: Duration,
        provider: Option<ProviderKind>,
    },

    /// Structured output could not be coerced to the requested schema
    #[error("Schema validation failed: {message}")]
    SchemaValidation {
        message: String,
        errors: Vec<String>,
    },

    /// Opaque backend failure
    #[error("Upstream error from {provider}: {message}")]
    Upstream {
        provider: ProviderKind,
        message: String,
        status_code: Option<u16>,
    },

    /// The caller sent something no backend could serve
    #[error("Invalid request: {message}")]
    InvalidRequest {
        message: String,
        field: Option<String>,
    },

    /// JSON encoding/decoding failures outside provider calls
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// The caller stopped waiting for the result
    #[error("Cancelled by caller while reading from {provider}")]
    Cancelled { provider: ProviderKind },

    /// IO failures (config files, credential files)
    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<String>,
    },
}
