//! Deterministic candidate ordering

use super::state::HealthRegistry;
use crate::types::ProviderKind;

/// Orders the providers a request may be served by
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackPolicy {
    order: Vec<ProviderKind>,
}

impl FallbackPolicy {
    /// `order` lists remote providers; Mock is always appended last
    pub fn new(order: Vec<ProviderKind>) -> Self {
        let mut seen = Vec::with_capacity(order.len());
        for provider in order {
            if provider != ProviderKind::Mock && !seen.contains(&provider) {
                seen.push(provider);
            }
        }
        Self { order: seen }
    }

    pub fn order(&self) -> &[ProviderKind] {
        &self.order
    }

    /// Every provider a single request may touch, in the order they are tried
    ///
    /// The requested provider always comes first. The rest follow the
    /// configured order with providers in failure cooldown moved behind
    /// healthy ones, and Mock closes the list.
    pub fn candidates(
        &self,
        requested: Option<ProviderKind>,
        health: &HealthRegistry,
    ) -> Vec<ProviderKind> {
        let mut candidates = Vec::with_capacity(self.order.len() + 2);
        if let Some(requested) = requested {
            candidates.push(requested);
        }

        let remaining: Vec<ProviderKind> = self
            .order
            .iter()
            .copied()
            .filter(|p| !candidates.contains(p))
            .collect();
        let (healthy, cooling): (Vec<_>, Vec<_>) =
            remaining.into_iter().partition(|p| health.is_available(*p));
        candidates.extend(healthy);
        candidates.extend(cooling);

        if !candidates.contains(&ProviderKind::Mock) {
            candidates.push(ProviderKind::Mock);
        }
        candidates
    }
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self::new(ProviderKind::REMOTE.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use std::time::Duration;

    fn health() -> HealthRegistry {
        HealthRegistry::new(Duration::from_secs(60))
    }

    #[test]
    fn test_default_order_ends_with_mock() {
        let candidates = FallbackPolicy::default().candidates(None, &health());
        assert_eq!(
            candidates,
            vec![
                ProviderKind::Claude,
                ProviderKind::Gemini,
                ProviderKind::DeepSeek,
                ProviderKind::Kimi,
                ProviderKind::Mock,
            ]
        );
    }

    #[test]
    fn test_requested_provider_goes_first_once() {
        let candidates = FallbackPolicy::default().candidates(Some(ProviderKind::DeepSeek), &health());
        assert_eq!(candidates[0], ProviderKind::DeepSeek);
        assert_eq!(
            candidates.iter().filter(|p| **p == ProviderKind::DeepSeek).count(),
            1
        );
        assert_eq!(candidates.len(), 5);
    }

    #[test]
    fn test_cooling_providers_move_back() {
        let health = health();
        health.record_failure(ProviderKind::Claude, FailureKind::Timeout);
        let candidates = FallbackPolicy::default().candidates(None, &health);
        assert_eq!(
            candidates,
            vec![
                ProviderKind::Gemini,
                ProviderKind::DeepSeek,
                ProviderKind::Kimi,
                ProviderKind::Claude,
                ProviderKind::Mock,
            ]
        );
    }

    #[test]
    fn test_requested_mock_leads() {
        let policy = FallbackPolicy::new(vec![ProviderKind::Kimi, ProviderKind::Mock]);
        assert_eq!(policy.order(), &[ProviderKind::Kimi]);
        let candidates = policy.candidates(Some(ProviderKind::Mock), &health());
        assert_eq!(candidates, vec![ProviderKind::Mock, ProviderKind::Kimi]);
    }
}
