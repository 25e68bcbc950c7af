//! Cost tracking and pricing for provider usage
//!
//! # Features
//!
//! - **Pricing**: per-provider token prices, including cached-prompt rates
//! - **Accounting**: running totals, average per request, cache savings
//! - **Projection**: naive monthly projection from the current hourly cost
//!
//! # Example
//!
//! ```rust
//! use gateway_core::cost::{CostAccountant, PricingTable};
//! use gateway_core::types::{ProviderKind, TokenUsage};
//!
//! let accountant = CostAccountant::new(PricingTable::with_defaults());
//! let cost = accountant.record(ProviderKind::DeepSeek, &TokenUsage::new(1_000, 200));
//! assert!(cost.net() > 0.0);
//! ```

mod accountant;
mod pricing;

pub use accountant::{CostAccountant, CostAnalysis, HOURS_PER_MONTH, ProviderCostStats};
pub use pricing::{CallCost, PricingTable, TokenPrice};
