//! Rate limit configuration and snapshot types

use crate::types::ProviderKind;
use serde::{Deserialize, Serialize};

/// Per-provider usage ceilings
///
/// `None` disables the corresponding dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default)]
    pub requests_per_minute: Option<u32>,
    #[serde(default)]
    pub tokens_per_minute: Option<u64>,
    /// USD
    #[serde(default)]
    pub cost_per_hour: Option<f64>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: Some(60),
            tokens_per_minute: Some(100_000),
            cost_per_hour: Some(2.0),
        }
    }
}

impl RateLimitConfig {
    pub fn new(requests_per_minute: u32, tokens_per_minute: u64, cost_per_hour: f64) -> Self {
        Self {
            requests_per_minute: Some(requests_per_minute),
            tokens_per_minute: Some(tokens_per_minute),
            cost_per_hour: Some(cost_per_hour),
        }
    }

    /// No ceilings at all
    pub fn unlimited() -> Self {
        Self {
            requests_per_minute: None,
            tokens_per_minute: None,
            cost_per_hour: None,
        }
    }

    /// Typical published limits per provider
    pub fn for_provider(provider: ProviderKind) -> Self {
        match provider {
            ProviderKind::Claude => Self::new(50, 80_000, 5.0),
            ProviderKind::Gemini => Self::new(60, 120_000, 2.0),
            ProviderKind::DeepSeek => Self::new(60, 100_000, 2.0),
            ProviderKind::Kimi => Self::new(30, 60_000, 2.0),
            ProviderKind::Mock => Self::unlimited(),
        }
    }
}

/// Which ceiling a check tripped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitDimension {
    RequestsPerMinute,
    TokensPerMinute,
    CostPerHour,
}

/// Result of a pre-flight check; advisory unless enforcement is enabled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatus {
    pub provider: ProviderKind,
    pub requests_this_minute: u32,
    pub tokens_this_minute: u64,
    pub cost_this_hour: f64,
    /// Utilization in percent, `None` when the dimension is unlimited
    pub requests_utilization: Option<f64>,
    pub tokens_utilization: Option<f64>,
    pub cost_utilization: Option<f64>,
    pub exceeded: Vec<LimitDimension>,
}

impl RateLimitStatus {
    pub fn is_exceeded(&self) -> bool {
        !self.exceeded.is_empty()
    }

    /// Highest utilization across dimensions
    pub fn peak_utilization(&self) -> f64 {
        [
            self.requests_utilization,
            self.tokens_utilization,
            self.cost_utilization,
        ]
        .into_iter()
        .flatten()
        .fold(0.0, f64::max)
    }
}
