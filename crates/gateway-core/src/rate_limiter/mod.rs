//! Usage rate limiter
//!
//! Sliding per-provider counters for requests/minute, tokens/minute and
//! cost/hour. Checks are advisory: they report utilization for diagnostics
//! and only block a provider when the gateway enforces limits.

mod limiter;
mod types;
mod window;


pub use limiter::RateLimiter;
pub use types::{LimitDimension, RateLimitConfig, RateLimitStatus};
pub use window::{HOUR, MINUTE, UsageWindow};
