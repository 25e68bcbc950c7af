//! File-based configuration loading
//!
//! A config file only lists what it changes; everything else keeps the
//! environment's defaults.

use super::environment::RuntimeEnvironment;
use super::gateway_config::GatewayConfig;
use super::logging_config::LoggingConfig;
use crate::cost::TokenPrice;
use crate::credential::CredentialKey;
use crate::error::{GatewayError, GatewayResult};
use crate::rate_limiter::RateLimitConfig;
use crate::types::ProviderKind;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutOverlay {
    pub request_ms: Option<u64>,
    pub credential_lookup_ms: Option<u64>,
    pub generation_ms: Option<u64>,
    pub stream_idle_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreamOverlay {
    pub chunk_size: Option<usize>,
    pub max_chunks: Option<usize>,
    pub max_length: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderOverlay {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub rate_limits: Option<RateLimitConfig>,
    pub pricing: Option<TokenPrice>,
    pub context_caching: Option<bool>,
}

/// Partial configuration as read from a file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverlay {
    pub environment: Option<RuntimeEnvironment>,
    pub timeouts: TimeoutOverlay,
    pub stream: StreamOverlay,
    pub fallback_order: Option<Vec<ProviderKind>>,
    pub providers: HashMap<ProviderKind, ProviderOverlay>,
    pub enforce_rate_limits: Option<bool>,
    pub failure_cooldown_ms: Option<u64>,
    pub max_fallback_history: Option<usize>,
    pub credential_key: Option<CredentialKey>,
    pub logging: Option<LoggingConfig>,
}

impl ConfigOverlay {
    /// Write every present field onto `config`
    pub fn apply(self, config: &mut GatewayConfig) {
        let timeouts = &mut config.timeouts;
        if let Some(ms) = self.timeouts.request_ms {
            timeouts.request = Duration::from_millis(ms);
        }
        if let Some(ms) = self.timeouts.credential_lookup_ms {
            timeouts.credential_lookup = Duration::from_millis(ms);
        }
        if let Some(ms) = self.timeouts.generation_ms {
            timeouts.generation = Duration::from_millis(ms);
        }
        if let Some(ms) = self.timeouts.stream_idle_ms {
            timeouts.stream_idle = Duration::from_millis(ms);
        }

        if let Some(chunk_size) = self.stream.chunk_size {
            config.stream.chunk_size = chunk_size;
        }
        if let Some(max_chunks) = self.stream.max_chunks {
            config.stream.max_chunks = max_chunks;
        }
        if let Some(max_length) = self.stream.max_length {
            config.stream.max_length = max_length;
        }

        if let Some(order) = self.fallback_order {
            config.fallback_order = order;
        }

        for (provider, overlay) in self.providers {
            let settings = config
                .providers
                .entry(provider)
                .or_insert_with(|| super::ProviderSettings::for_provider(provider));
            if let Some(base_url) = overlay.base_url {
                settings.base_url = base_url;
            }
            if let Some(model) = overlay.model {
                settings.model = model;
            }
            if let Some(rate_limits) = overlay.rate_limits {
                settings.rate_limits = rate_limits;
            }
            if let Some(pricing) = overlay.pricing {
                settings.pricing = pricing;
            }
            if let Some(context_caching) = overlay.context_caching {
                settings.context_caching = context_caching;
            }
        }

        if let Some(enforce) = self.enforce_rate_limits {
            config.enforce_rate_limits = enforce;
        }
        if let Some(ms) = self.failure_cooldown_ms {
            config.failure_cooldown = Duration::from_millis(ms);
        }
        if let Some(max) = self.max_fallback_history {
            config.max_fallback_history = max;
        }
        if let Some(key) = self.credential_key {
            config.credential_key = Some(key);
        }
        if let Some(logging) = self.logging {
            config.logging.merge(logging);
        }
    }
}

/// Load a configuration overlay from a file
///
/// TOML when the extension is `.toml`, JSON otherwise. A missing file yields
/// an empty overlay.
pub fn load_from_file(path: &Path) -> GatewayResult<ConfigOverlay> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(ConfigOverlay::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        GatewayError::config_with_context(
            format!("Failed to read config file: {}", e),
            format!("Reading configuration from '{}'", path.display()),
        )
    })?;

    let overlay = match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|e| {
            GatewayError::config_with_context(
                format!("Failed to parse TOML config: {}", e),
                format!("Deserializing TOML configuration from '{}'", path.display()),
            )
        })?,
        _ => serde_json::from_str(&content).map_err(|e| {
            GatewayError::config_with_context(
                format!("Failed to parse JSON config: {}", e),
                format!("Deserializing JSON configuration from '{}'", path.display()),
            )
        })?,
    };

    Ok(overlay)
}
