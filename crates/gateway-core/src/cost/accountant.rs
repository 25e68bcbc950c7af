//! Running cost totals per provider

use super::pricing::{CallCost, PricingTable};
use crate::types::{ProviderKind, TokenUsage};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Hours in the naive monthly projection (24 × 30)
pub const HOURS_PER_MONTH: f64 = 24.0 * 30.0;

/// Accumulated usage and cost for one provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCostStats {
    pub request_count: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub cached_tokens: u64,
    /// Cost before cache savings
    pub gross_cost: f64,
    pub cache_savings: f64,
}

impl ProviderCostStats {
    fn add(&mut self, usage: &TokenUsage, cost: &CallCost) {
        self.request_count += 1;
        self.prompt_tokens = self.prompt_tokens.saturating_add(usage.prompt_tokens);
        self.completion_tokens = self.completion_tokens.saturating_add(usage.completion_tokens);
        self.cached_tokens = self.cached_tokens.saturating_add(usage.cached_tokens);
        self.gross_cost += cost.gross;
        self.cache_savings += cost.cache_savings;
    }

    pub fn net_cost(&self) -> f64 {
        (self.gross_cost - self.cache_savings).max(0.0)
    }

    pub fn average_cost_per_request(&self) -> f64 {
        if self.request_count == 0 {
            0.0
        } else {
            self.net_cost() / self.request_count as f64
        }
    }

    /// Share of prompt tokens served from the context cache (0.0 - 1.0)
    pub fn cache_hit_rate(&self) -> f64 {
        if self.prompt_tokens == 0 {
            0.0
        } else {
            self.cached_tokens as f64 / self.prompt_tokens as f64
        }
    }
}

/// Cost analysis as exposed by diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostAnalysis {
    pub total_cost: f64,
    pub cache_savings: f64,
    pub net_cost: f64,
    pub request_count: u64,
    pub average_cost_per_request: f64,
    pub cost_this_hour: f64,
    /// `cost_this_hour × 24 × 30`; a linear extrapolation, not a forecast
    pub projected_monthly_cost: f64,
}

/// Tracks post-hoc cost per provider
#[derive(Debug)]
pub struct CostAccountant {
    pricing: PricingTable,
    stats: RwLock<HashMap<ProviderKind, ProviderCostStats>>,
}

impl CostAccountant {
    pub fn new(pricing: PricingTable) -> Self {
        Self {
            pricing,
            stats: RwLock::new(HashMap::new()),
        }
    }

    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    /// Price a completed call and add it to the running totals
    pub fn record(&self, provider: ProviderKind, usage: &TokenUsage) -> CallCost {
        let cost = self.pricing.calculate(provider, usage);
        self.stats
            .write()
            .entry(provider)
            .or_default()
            .add(usage, &cost);

        tracing::debug!(
            provider = %provider,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            cached_tokens = usage.cached_tokens,
            net_cost = cost.net(),
            "cost recorded"
        );
        cost
    }

    pub fn stats(&self, provider: ProviderKind) -> ProviderCostStats {
        self.stats.read().get(&provider).cloned().unwrap_or_default()
    }

    /// Build the diagnostics view, given the provider's current hourly cost
    pub fn analysis(&self, provider: ProviderKind, cost_this_hour: f64) -> CostAnalysis {
        let stats = self.stats(provider);
        CostAnalysis {
            total_cost: stats.gross_cost,
            cache_savings: stats.cache_savings,
            net_cost: stats.net_cost(),
            request_count: stats.request_count,
            average_cost_per_request: stats.average_cost_per_request(),
            cost_this_hour,
            projected_monthly_cost: cost_this_hour * HOURS_PER_MONTH,
        }
    }

    pub fn reset(&self) {
        self.stats.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::TokenPrice;

    fn accountant() -> CostAccountant {
        let mut pricing = PricingTable::with_defaults();
        pricing.set(
            ProviderKind::Claude,
            TokenPrice::new(1.0, 2.0).with_cached_input(0.5),
        );
        CostAccountant::new(pricing)
    }

    #[test]
    fn test_totals_and_average() {
        let accountant = accountant();
        accountant.record(ProviderKind::Claude, &TokenUsage::new(1_000_000, 0));
        accountant.record(ProviderKind::Claude, &TokenUsage::new(0, 1_000_000));

        let stats = accountant.stats(ProviderKind::Claude);
        assert_eq!(stats.request_count, 2);
        assert!((stats.net_cost() - 3.0).abs() < 1e-9);
        assert!((stats.average_cost_per_request() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_analysis_reports_net_cost_and_projection() {
        let accountant = accountant();
        let usage = TokenUsage::new(1_000_000, 0).with_cached(1_000_000);
        accountant.record(ProviderKind::Claude, &usage);

        let analysis = accountant.analysis(ProviderKind::Claude, 0.5);
        assert!((analysis.total_cost - 1.0).abs() < 1e-9);
        assert!((analysis.cache_savings - 0.5).abs() < 1e-9);
        assert!((analysis.net_cost - 0.5).abs() < 1e-9);
        assert!((analysis.projected_monthly_cost - 360.0).abs() < 1e-9);
    }

    #[test]
    fn test_cache_hit_rate() {
        let accountant = accountant();
        accountant.record(
            ProviderKind::Claude,
            &TokenUsage::new(400, 10).with_cached(100),
        );
        assert!((accountant.stats(ProviderKind::Claude).cache_hit_rate() - 0.25).abs() < 1e-9);
        assert_eq!(accountant.stats(ProviderKind::Gemini).cache_hit_rate(), 0.0);
    }

    #[test]
    fn test_reset() {
        let accountant = accountant();
        accountant.record(ProviderKind::Claude, &TokenUsage::new(10, 10));
        accountant.reset();
        assert_eq!(accountant.stats(ProviderKind::Claude).request_count, 0);
    }
}
