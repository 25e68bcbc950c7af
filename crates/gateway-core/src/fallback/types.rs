//! Type definitions for the fallback orchestrator

use crate::credential::MissingReason;
use crate::error::{FailureKind, GatewayError};
use crate::types::ProviderKind;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Why a provider was passed over
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FallbackReason {
    /// No credential could be resolved; the adapter was never built
    MissingCredential(String),
    /// Credential rejected, or adapter construction failed
    Authentication,
    Timeout,
    RateLimited,
    /// Any other provider failure
    Error(String),
}

impl FallbackReason {
    pub fn from_error(error: &GatewayError) -> Self {
        match error.failure_kind() {
            FailureKind::Authentication => Self::Authentication,
            FailureKind::Timeout => Self::Timeout,
            FailureKind::RateLimit => Self::RateLimited,
            FailureKind::Unknown => Self::Error(error.error_code().to_string()),
        }
    }

    pub fn from_missing(reason: &MissingReason) -> Self {
        Self::MissingCredential(reason.to_string())
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCredential(reason) => write!(f, "missing credential: {}", reason),
            Self::Authentication => write!(f, "auth"),
            Self::Timeout => write!(f, "timeout"),
            Self::RateLimited => write!(f, "rate-limit"),
            Self::Error(code) => write!(f, "error: {}", code),
        }
    }
}

/// Record of one hop along the fallback chain
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackEvent {
    pub from: ProviderKind,
    /// `None` when no candidate was left
    pub to: Option<ProviderKind>,
    pub reason: FallbackReason,
    pub timestamp: DateTime<Utc>,
}

/// Health summary of one provider
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderHealthStatus {
    pub provider: ProviderKind,
    /// Not in failure cooldown
    pub available: bool,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub success_rate: f64,
    pub consecutive_failures: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_failure: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_failure_kind: Option<FailureKind>,
}

/// Output of a successful orchestrated call
#[derive(Debug)]
pub struct Attempted<T> {
    pub value: T,
    pub provider: ProviderKind,
    pub requested_provider: Option<ProviderKind>,
    pub used_fallback: bool,
    /// Reason attached to the last hop before `provider`
    pub fallback_reason: Option<FallbackReason>,
    /// Providers considered, including the one that served
    pub attempts: usize,
}
