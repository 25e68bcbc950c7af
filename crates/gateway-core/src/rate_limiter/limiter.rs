//! Per-provider usage limiter

use super::types::{LimitDimension, RateLimitConfig, RateLimitStatus};
use super::window::UsageWindow;
use crate::types::ProviderKind;
use dashmap::DashMap;
use std::collections::HashMap;
use std::time::Instant;
use tracing::debug;

/// Tracks requests/minute, tokens/minute and cost/hour per provider
///
/// Each provider's window sits behind its own map shard lock, so concurrent
/// requests against the same provider serialize their read-modify-write while
/// requests against different providers proceed independently.
#[derive(Debug)]
pub struct RateLimiter {
    limits: HashMap<ProviderKind, RateLimitConfig>,
    windows: DashMap<ProviderKind, UsageWindow>,
}

impl RateLimiter {
    pub fn new(limits: HashMap<ProviderKind, RateLimitConfig>) -> Self {
        Self {
            limits,
            windows: DashMap::new(),
        }
    }

    /// Limiter with each provider's published defaults
    pub fn with_defaults() -> Self {
        let limits = ProviderKind::REMOTE
            .into_iter()
            .chain(std::iter::once(ProviderKind::Mock))
            .map(|p| (p, RateLimitConfig::for_provider(p)))
            .collect();
        Self::new(limits)
    }

    pub fn limits(&self, provider: ProviderKind) -> RateLimitConfig {
        self.limits
            .get(&provider)
            .copied()
            .unwrap_or_else(|| RateLimitConfig::for_provider(provider))
    }

    /// Count an attempted call
    pub fn record_attempt(&self, provider: ProviderKind) {
        self.record_attempt_at(provider, Instant::now());
    }

    pub fn record_attempt_at(&self, provider: ProviderKind, now: Instant) {
        self.windows
            .entry(provider)
            .or_insert_with(|| UsageWindow::new(now))
            .record_request(now);
    }

    /// Count the tokens and cost of a completed call
    pub fn record_completion(&self, provider: ProviderKind, tokens: u64, cost: f64) {
        self.record_completion_at(provider, tokens, cost, Instant::now());
    }

    pub fn record_completion_at(&self, provider: ProviderKind, tokens: u64, cost: f64, now: Instant) {
        let mut window = self
            .windows
            .entry(provider)
            .or_insert_with(|| UsageWindow::new(now));
        window.record_tokens(tokens, now);
        window.record_cost(cost, now);
    }

    /// Pre-flight check against the configured ceilings
    pub fn check(&self, provider: ProviderKind) -> RateLimitStatus {
        self.check_at(provider, Instant::now())
    }

    pub fn check_at(&self, provider: ProviderKind, now: Instant) -> RateLimitStatus {
        let mut window = self
            .windows
            .entry(provider)
            .or_insert_with(|| UsageWindow::new(now));
        self.status_of(provider, &mut window, now)
    }

    /// Check and count an attempt under one entry lock
    ///
    /// The returned status reflects the counters before this attempt. With
    /// `enforce` set, an attempt over any ceiling is not counted.
    pub fn try_admit(&self, provider: ProviderKind, enforce: bool) -> RateLimitStatus {
        self.try_admit_at(provider, Instant::now(), enforce)
    }

    pub fn try_admit_at(&self, provider: ProviderKind, now: Instant, enforce: bool) -> RateLimitStatus {
        let mut window = self
            .windows
            .entry(provider)
            .or_insert_with(|| UsageWindow::new(now));
        let status = self.status_of(provider, &mut window, now);
        if !(enforce && status.is_exceeded()) {
            window.record_request(now);
        }
        status
    }

    fn status_of(&self, provider: ProviderKind, window: &mut UsageWindow, now: Instant) -> RateLimitStatus {
        let requests = window.requests_this_minute(now);
        let tokens = window.tokens_this_minute(now);
        let cost = window.cost_this_hour(now);

        let limits = self.limits(provider);
        let mut exceeded = Vec::new();

        let requests_utilization = limits.requests_per_minute.map(|limit| {
            if requests >= limit {
                exceeded.push(LimitDimension::RequestsPerMinute);
            }
            percent(requests as f64, limit as f64)
        });
        let tokens_utilization = limits.tokens_per_minute.map(|limit| {
            if tokens >= limit {
                exceeded.push(LimitDimension::TokensPerMinute);
            }
            percent(tokens as f64, limit as f64)
        });
        let cost_utilization = limits.cost_per_hour.map(|limit| {
            if cost >= limit {
                exceeded.push(LimitDimension::CostPerHour);
            }
            percent(cost, limit)
        });

        if !exceeded.is_empty() {
            debug!(provider = %provider, exceeded = ?exceeded, "usage ceiling reached");
        }

        RateLimitStatus {
            provider,
            requests_this_minute: requests,
            tokens_this_minute: tokens,
            cost_this_hour: cost,
            requests_utilization,
            tokens_utilization,
            cost_utilization,
            exceeded,
        }
    }

    /// Drop every window
    pub fn reset(&self) {
        self.windows.clear();
    }
}

fn percent(value: f64, limit: f64) -> f64 {
    if limit <= 0.0 {
        100.0
    } else {
        value / limit * 100.0
    }
}
