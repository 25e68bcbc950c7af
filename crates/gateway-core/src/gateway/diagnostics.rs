//! Gateway diagnostics
//!
//! Snapshot of provider health, usage and cost for operators. Configuration
//! identifiers are masked; credentials never appear.

use crate::config::RuntimeEnvironment;
use crate::cost::CostAnalysis;
use crate::fallback::{FallbackEvent, ProviderHealthStatus};
use crate::rate_limiter::RateLimitStatus;
use crate::types::ProviderKind;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub generated_at: DateTime<Utc>,
    pub environment: RuntimeEnvironment,
    pub providers: Vec<ProviderDiagnostics>,
    /// Recent fallback hops, oldest first
    pub fallback_history: Vec<FallbackEvent>,
}

impl Diagnostics {
    pub fn provider(&self, provider: ProviderKind) -> Option<&ProviderDiagnostics> {
        self.providers.iter().find(|p| p.provider == provider)
    }
}

/// Diagnostics for one provider with an active configuration
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDiagnostics {
    pub provider: ProviderKind,
    pub model: String,
    /// Masked configuration id; absent for Mock
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<String>,
    /// Only for providers with context caching
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_statistics: Option<CacheStatistics>,
    pub health_status: ProviderHealthStatus,
    pub usage_statistics: UsageStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatistics {
    pub prompt_tokens: u64,
    pub cached_tokens: u64,
    /// Cached share of prompt tokens, 0.0..=1.0
    pub cache_hit_rate: f64,
    pub cache_savings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStatistics {
    pub rate_limiting: RateLimitStatus,
    pub cost_analysis: CostAnalysis,
}
