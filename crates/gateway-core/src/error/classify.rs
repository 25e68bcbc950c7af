//! Failure classification used by the fallback orchestrator

use super::types::GatewayError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse class of a provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Authentication,
    Timeout,
    RateLimit,
    Unknown,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "auth"),
            Self::Timeout => write!(f, "timeout"),
            Self::RateLimit => write!(f, "rate-limit"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl GatewayError {
    /// Classify this error into {auth, timeout, rate-limit, unknown}
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Authentication { .. } | Self::Configuration { .. } => {
                FailureKind::Authentication
            }
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::RateLimit { .. } => FailureKind::RateLimit,
            Self::Upstream {
                status_code: Some(401 | 403),
                ..
            } => FailureKind::Authentication,
            Self::Upstream {
                status_code: Some(429),
                ..
            } => FailureKind::RateLimit,
            Self::Upstream {
                status_code: Some(408 | 504),
                ..
            } => FailureKind::Timeout,
            _ => FailureKind::Unknown,
        }
    }

    /// Whether another provider could plausibly serve the same request.
    ///
    /// Everything a backend can raise is retryable against the next
    /// candidate; only malformed requests are not.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidRequest { .. })
    }

    /// Error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Authentication { .. } => "AUTHENTICATION_ERROR",
            Self::RateLimit { .. } => "RATE_LIMIT_ERROR",
            Self::Timeout { .. } => "TIMEOUT_ERROR",
            Self::SchemaValidation { .. } => "SCHEMA_VALIDATION_ERROR",
            Self::Upstream { .. } => "UPSTREAM_ERROR",
            Self::InvalidRequest { .. } => "INVALID_REQUEST",
            Self::Serialization { .. } => "SERIALIZATION_ERROR",
            Self::Io { .. } => "IO_ERROR",
            Self::Cancelled { .. } => "CANCELLED",
        }
    }
}
