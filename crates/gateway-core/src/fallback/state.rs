//! Per-provider health tracking

use super::types::ProviderHealthStatus;
use crate::error::FailureKind;
use crate::types::ProviderKind;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
pub(super) struct ProviderHealth {
    last_failure: Option<Instant>,
    last_failure_at: Option<DateTime<Utc>>,
    last_failure_kind: Option<FailureKind>,
    consecutive_failures: u32,
    total_requests: u64,
    successful_requests: u64,
}

impl ProviderHealth {
    fn is_available(&self, cooldown: Duration) -> bool {
        match self.last_failure {
            Some(time) => time.elapsed() > cooldown,
            None => true,
        }
    }

    fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.total_requests += 1;
        self.successful_requests += 1;
    }

    fn record_failure(&mut self, kind: FailureKind) {
        self.consecutive_failures += 1;
        self.total_requests += 1;
        self.last_failure = Some(Instant::now());
        self.last_failure_at = Some(Utc::now());
        self.last_failure_kind = Some(kind);
    }

    fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            1.0
        } else {
            self.successful_requests as f64 / self.total_requests as f64
        }
    }
}

/// Health of every provider, shared by concurrent requests
#[derive(Debug)]
pub struct HealthRegistry {
    providers: RwLock<HashMap<ProviderKind, ProviderHealth>>,
    cooldown: Duration,
}

impl HealthRegistry {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
            cooldown,
        }
    }

    /// Not cooling down after a recent failure
    pub fn is_available(&self, provider: ProviderKind) -> bool {
        self.providers
            .read()
            .get(&provider)
            .is_none_or(|h| h.is_available(self.cooldown))
    }

    pub fn record_success(&self, provider: ProviderKind) {
        self.providers
            .write()
            .entry(provider)
            .or_default()
            .record_success();
    }

    pub fn record_failure(&self, provider: ProviderKind, kind: FailureKind) {
        self.providers
            .write()
            .entry(provider)
            .or_default()
            .record_failure(kind);
    }

    pub fn status(&self, provider: ProviderKind) -> ProviderHealthStatus {
        let providers = self.providers.read();
        let health = providers.get(&provider).cloned().unwrap_or_default();
        ProviderHealthStatus {
            provider,
            available: health.is_available(self.cooldown),
            total_requests: health.total_requests,
            successful_requests: health.successful_requests,
            success_rate: health.success_rate(),
            consecutive_failures: health.consecutive_failures,
            last_failure: health.last_failure_at,
            last_failure_kind: health.last_failure_kind,
        }
    }

    /// Forget every failure
    pub fn reset(&self) {
        self.providers.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_is_healthy() {
        let registry = HealthRegistry::new(Duration::from_secs(60));
        assert!(registry.is_available(ProviderKind::Gemini));
        let status = registry.status(ProviderKind::Gemini);
        assert_eq!(status.success_rate, 1.0);
        assert_eq!(status.total_requests, 0);
    }

    #[test]
    fn test_failure_starts_cooldown() {
        let registry = HealthRegistry::new(Duration::from_secs(60));
        registry.record_failure(ProviderKind::Claude, FailureKind::Timeout);
        assert!(!registry.is_available(ProviderKind::Claude));

        let status = registry.status(ProviderKind::Claude);
        assert_eq!(status.consecutive_failures, 1);
        assert_eq!(status.last_failure_kind, Some(FailureKind::Timeout));
        assert!(status.last_failure.is_some());
    }

    #[test]
    fn test_zero_cooldown_recovers_immediately() {
        let registry = HealthRegistry::new(Duration::ZERO);
        registry.record_failure(ProviderKind::Kimi, FailureKind::Unknown);
        std::thread::sleep(Duration::from_millis(2));
        assert!(registry.is_available(ProviderKind::Kimi));
    }

    #[test]
    fn test_success_resets_consecutive_failures() {
        let registry = HealthRegistry::new(Duration::from_secs(60));
        registry.record_failure(ProviderKind::DeepSeek, FailureKind::RateLimit);
        registry.record_success(ProviderKind::DeepSeek);
        let status = registry.status(ProviderKind::DeepSeek);
        assert_eq!(status.consecutive_failures, 0);
        assert_eq!(status.success_rate, 0.5);

        registry.reset();
        assert_eq!(registry.status(ProviderKind::DeepSeek).total_requests, 0);
    }
}
