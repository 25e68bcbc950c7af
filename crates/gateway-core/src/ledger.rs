//! Usage ledger shared by gateways
//!
//! Owns the rate limiter and the cost accountant. Constructed explicitly and
//! handed to each [`crate::gateway::Gateway`] as an `Arc`, so several gateways
//! in one process can report against the same budgets.

use crate::cost::{CallCost, CostAccountant, CostAnalysis, PricingTable};
use crate::error::{GatewayError, GatewayResult};
use crate::rate_limiter::{RateLimitConfig, RateLimitStatus, RateLimiter};
use crate::types::{ProviderKind, TokenUsage};
use std::collections::HashMap;
use tracing::warn;

#[derive(Debug)]
pub struct UsageLedger {
    limiter: RateLimiter,
    accountant: CostAccountant,
}

impl UsageLedger {
    pub fn new(limits: HashMap<ProviderKind, RateLimitConfig>, pricing: PricingTable) -> Self {
        Self {
            limiter: RateLimiter::new(limits),
            accountant: CostAccountant::new(pricing),
        }
    }

    pub fn with_defaults() -> Self {
        Self {
            limiter: RateLimiter::with_defaults(),
            accountant: CostAccountant::new(PricingTable::with_defaults()),
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn accountant(&self) -> &CostAccountant {
        &self.accountant
    }

    /// Pre-flight check, counting the attempt
    ///
    /// With `enforce` set, a provider over any ceiling is refused with
    /// [`GatewayError::RateLimit`] and the attempt is not counted.
    pub fn admit(&self, provider: ProviderKind, enforce: bool) -> GatewayResult<RateLimitStatus> {
        let status = self.limiter.try_admit(provider, enforce);
        if status.is_exceeded() {
            warn!(
                provider = %provider,
                exceeded = ?status.exceeded,
                enforced = enforce,
                "provider over usage ceiling"
            );
            if enforce {
                return Err(GatewayError::rate_limited(
                    provider,
                    format!("local usage ceiling reached: {:?}", status.exceeded),
                ));
            }
        }
        Ok(status)
    }

    /// Record tokens and cost of a completed call
    pub fn record_completion(&self, provider: ProviderKind, usage: &TokenUsage) -> CallCost {
        let cost = self.accountant.record(provider, usage);
        self.limiter
            .record_completion(provider, usage.total(), cost.net());
        cost
    }

    pub fn rate_status(&self, provider: ProviderKind) -> RateLimitStatus {
        self.limiter.check(provider)
    }

    pub fn cost_analysis(&self, provider: ProviderKind) -> CostAnalysis {
        let status = self.limiter.check(provider);
        self.accountant.analysis(provider, status.cost_this_hour)
    }

    /// Clear every counter and total
    pub fn reset(&self) {
        self.limiter.reset();
        self.accountant.reset();
    }
}

impl Default for UsageLedger {
    fn default() -> Self {
        Self::with_defaults()
    }
}
