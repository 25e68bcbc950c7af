//! Provider pricing definitions

use crate::types::{ProviderKind, TokenUsage};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Price per 1M tokens (USD)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenPrice {
    pub input: f64,
    pub output: f64,
    /// Price for prompt tokens served from the context cache
    #[serde(default)]
    pub cached_input: Option<f64>,
}

/// Cost of one call, before and after cache savings
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CallCost {
    /// Cost had every prompt token been billed at the full input rate
    pub gross: f64,
    /// Amount saved by context cache hits
    pub cache_savings: f64,
}

impl CallCost {
    pub fn net(&self) -> f64 {
        (self.gross - self.cache_savings).max(0.0)
    }
}

impl TokenPrice {
    pub const fn new(input: f64, output: f64) -> Self {
        Self {
            input,
            output,
            cached_input: None,
        }
    }

    pub const fn with_cached_input(mut self, cached_input: f64) -> Self {
        self.cached_input = Some(cached_input);
        self
    }

    pub const fn free() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Calculate cost for the given usage
    pub fn calculate(&self, usage: &TokenUsage) -> CallCost {
        let per_token = |price: f64, tokens: u64| (tokens as f64 / 1_000_000.0) * price;

        let gross = per_token(self.input, usage.prompt_tokens)
            + per_token(self.output, usage.completion_tokens);
        let cache_savings = match self.cached_input {
            Some(cached) if cached < self.input => {
                per_token(self.input - cached, usage.cached_tokens)
            }
            _ => 0.0,
        };

        CallCost {
            gross,
            cache_savings,
        }
    }
}

/// Prices for every provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingTable {
    prices: HashMap<ProviderKind, TokenPrice>,
}

impl PricingTable {
    /// Published list prices at the time of writing
    pub fn with_defaults() -> Self {
        let mut prices = HashMap::new();
        prices.insert(
            ProviderKind::Claude,
            TokenPrice::new(3.0, 15.0).with_cached_input(0.30),
        );
        prices.insert(
            ProviderKind::Gemini,
            TokenPrice::new(0.075, 0.30).with_cached_input(0.01875),
        );
        prices.insert(
            ProviderKind::DeepSeek,
            TokenPrice::new(0.27, 1.10).with_cached_input(0.07),
        );
        prices.insert(ProviderKind::Kimi, TokenPrice::new(1.65, 1.65));
        prices.insert(ProviderKind::Mock, TokenPrice::free());
        Self { prices }
    }

    pub fn set(&mut self, provider: ProviderKind, price: TokenPrice) {
        self.prices.insert(provider, price);
    }

    /// Price for a provider; unknown providers are free
    pub fn get(&self, provider: ProviderKind) -> TokenPrice {
        self.prices
            .get(&provider)
            .copied()
            .unwrap_or_else(TokenPrice::free)
    }

    pub fn calculate(&self, provider: ProviderKind, usage: &TokenUsage) -> CallCost {
        self.get(provider).calculate(usage)
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}
