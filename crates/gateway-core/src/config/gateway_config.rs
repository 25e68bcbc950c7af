//! Gateway configuration model

use super::environment::RuntimeEnvironment;
use super::logging_config::LoggingConfig;
use super::timeouts::{TimeoutConfig, duration_millis};
use crate::cost::{PricingTable, TokenPrice};
use crate::credential::CredentialKey;
use crate::error::{GatewayError, GatewayResult};
use crate::rate_limiter::RateLimitConfig;
use crate::streaming::StreamLimits;
use crate::types::ProviderKind;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Default cooldown after a provider failure
pub const DEFAULT_FAILURE_COOLDOWN_MS: u64 = 60_000;

/// Default number of fallback events kept for diagnostics
pub const DEFAULT_MAX_FALLBACK_HISTORY: usize = 100;

/// Per-provider settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub base_url: String,
    pub model: String,
    pub rate_limits: RateLimitConfig,
    pub pricing: TokenPrice,
    /// Request provider-side prompt caching where supported
    pub context_caching: bool,
}

impl ProviderSettings {
    pub fn for_provider(provider: ProviderKind) -> Self {
        let (base_url, model) = match provider {
            ProviderKind::Claude => ("https://api.anthropic.com", "claude-sonnet-4-20250514"),
            ProviderKind::Gemini => (
                "https://generativelanguage.googleapis.com",
                "gemini-2.0-flash",
            ),
            ProviderKind::DeepSeek => ("https://api.deepseek.com/v1", "deepseek-chat"),
            ProviderKind::Kimi => ("https://api.moonshot.cn/v1", "moonshot-v1-8k"),
            ProviderKind::Mock => ("", "mock"),
        };
        Self {
            base_url: base_url.to_string(),
            model: model.to_string(),
            rate_limits: RateLimitConfig::for_provider(provider),
            pricing: PricingTable::with_defaults().get(provider),
            context_caching: provider.supports_context_caching(),
        }
    }
}

/// Complete gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub environment: RuntimeEnvironment,
    pub timeouts: TimeoutConfig,
    pub stream: StreamLimits,
    /// Providers tried in order when the requested one fails; Mock is implied last
    pub fallback_order: Vec<ProviderKind>,
    pub providers: HashMap<ProviderKind, ProviderSettings>,
    /// Refuse calls to providers over their usage ceilings
    pub enforce_rate_limits: bool,
    #[serde(with = "duration_millis")]
    pub failure_cooldown: Duration,
    pub max_fallback_history: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_key: Option<CredentialKey>,
    pub logging: LoggingConfig,
}

impl GatewayConfig {
    pub fn for_environment(environment: RuntimeEnvironment) -> Self {
        let providers = ProviderKind::REMOTE
            .into_iter()
            .chain(std::iter::once(ProviderKind::Mock))
            .map(|p| (p, ProviderSettings::for_provider(p)))
            .collect();

        Self {
            environment,
            timeouts: TimeoutConfig::for_environment(environment),
            stream: StreamLimits::for_environment(environment),
            fallback_order: ProviderKind::REMOTE.to_vec(),
            providers,
            enforce_rate_limits: false,
            failure_cooldown: Duration::from_millis(DEFAULT_FAILURE_COOLDOWN_MS),
            max_fallback_history: DEFAULT_MAX_FALLBACK_HISTORY,
            credential_key: None,
            logging: LoggingConfig::default(),
        }
    }

    pub fn provider(&self, provider: ProviderKind) -> ProviderSettings {
        self.providers
            .get(&provider)
            .cloned()
            .unwrap_or_else(|| ProviderSettings::for_provider(provider))
    }

    pub fn rate_limits(&self) -> HashMap<ProviderKind, RateLimitConfig> {
        self.providers
            .iter()
            .map(|(p, s)| (*p, s.rate_limits))
            .collect()
    }

    pub fn pricing(&self) -> PricingTable {
        let mut table = PricingTable::with_defaults();
        for (provider, settings) in &self.providers {
            table.set(*provider, settings.pricing);
        }
        table
    }

    pub fn with_credential_key(mut self, key: CredentialKey) -> Self {
        self.credential_key = Some(key);
        self
    }

    pub fn with_fallback_order(mut self, order: Vec<ProviderKind>) -> Self {
        self.fallback_order = order;
        self
    }

    pub fn with_base_url(mut self, provider: ProviderKind, base_url: impl Into<String>) -> Self {
        self.providers
            .entry(provider)
            .or_insert_with(|| ProviderSettings::for_provider(provider))
            .base_url = base_url.into();
        self
    }

    pub fn validate(&self) -> GatewayResult<()> {
        self.timeouts
            .validate()
            .map_err(|e| GatewayError::config_with_context(e, "Validating timeouts"))?;
        self.stream
            .validate()
            .map_err(|e| GatewayError::config_with_context(e, "Validating stream limits"))?;

        let mut seen = HashSet::new();
        for provider in &self.fallback_order {
            if *provider == ProviderKind::Mock {
                return Err(GatewayError::config_with_context(
                    "mock must not appear in the fallback order; it is always the last resort",
                    "Validating fallback order",
                ));
            }
            if !seen.insert(*provider) {
                return Err(GatewayError::config_with_context(
                    format!("{} appears twice in the fallback order", provider),
                    "Validating fallback order",
                ));
            }
        }

        if self.max_fallback_history == 0 {
            return Err(GatewayError::config_with_context(
                "max_fallback_history must be greater than 0",
                "Validating fallback settings",
            ));
        }

        for (provider, settings) in &self.providers {
            if *provider != ProviderKind::Mock && settings.base_url.trim().is_empty() {
                return Err(GatewayError::config_with_context(
                    format!("{} has an empty base_url", provider),
                    "Validating provider settings",
                ));
            }
            let prices = [settings.pricing.input, settings.pricing.output];
            if prices.iter().any(|p| !p.is_finite() || *p < 0.0) {
                return Err(GatewayError::config_with_context(
                    format!("{} has a negative or non-finite price", provider),
                    "Validating provider settings",
                ));
            }
        }

        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::for_environment(RuntimeEnvironment::default())
    }
}
