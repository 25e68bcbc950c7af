//! Environment variable-based configuration overrides
//!
//! All variables carry the `GATEWAY_` prefix. Lookups go through a function
//! so callers (and tests) can supply their own environment.

use super::gateway_config::GatewayConfig;
use super::logging_config::LogFormat;
use crate::credential::CredentialKey;
use crate::error::{GatewayError, GatewayResult};
use crate::types::ProviderKind;
use std::str::FromStr;

pub const STREAM_CHUNK_SIZE: &str = crate::streaming::CHUNK_SIZE_ENV;
pub const STREAM_MAX_CHUNKS: &str = "GATEWAY_STREAM_MAX_CHUNKS";
pub const STREAM_MAX_LENGTH: &str = "GATEWAY_STREAM_MAX_LENGTH";
pub const FALLBACK_ORDER: &str = "GATEWAY_FALLBACK_ORDER";
pub const CREDENTIAL_KEY: &str = "GATEWAY_CREDENTIAL_KEY";
pub const ENFORCE_RATE_LIMITS: &str = "GATEWAY_ENFORCE_RATE_LIMITS";
pub const LOG_LEVEL: &str = "GATEWAY_LOG_LEVEL";
pub const LOG_FORMAT: &str = "GATEWAY_LOG_FORMAT";

/// Apply overrides from the process environment
pub fn load_from_env(config: &mut GatewayConfig) -> GatewayResult<()> {
    apply_env_overrides(config, |name| std::env::var(name).ok())
}

/// Apply `GATEWAY_*` overrides read through `lookup`
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> GatewayResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(value) = get(STREAM_CHUNK_SIZE) {
        config.stream.chunk_size = parse_var(STREAM_CHUNK_SIZE, &value)?;
    }
    if let Some(value) = get(STREAM_MAX_CHUNKS) {
        config.stream.max_chunks = parse_var(STREAM_MAX_CHUNKS, &value)?;
    }
    if let Some(value) = get(STREAM_MAX_LENGTH) {
        config.stream.max_length = parse_var(STREAM_MAX_LENGTH, &value)?;
    }

    if let Some(value) = get(FALLBACK_ORDER) {
        config.fallback_order = value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<ProviderKind>().map_err(|e| {
                    GatewayError::config_with_context(
                        format!("Invalid {} value: {}", FALLBACK_ORDER, e),
                        format!("Parsing provider list '{}'", value),
                    )
                })
            })
            .collect::<GatewayResult<Vec<_>>>()?;
    }

    if let Some(value) = get(CREDENTIAL_KEY) {
        config.credential_key = Some(CredentialKey::from_base64(&value)?);
    }

    if let Some(value) = get(ENFORCE_RATE_LIMITS) {
        config.enforce_rate_limits = parse_bool(ENFORCE_RATE_LIMITS, &value)?;
    }

    if let Some(value) = get(LOG_LEVEL) {
        config.logging.level = value.trim().to_lowercase();
    }
    if let Some(value) = get(LOG_FORMAT) {
        config.logging.format = value.parse::<LogFormat>().map_err(|e| {
            GatewayError::config_with_context(
                format!("Invalid {} value", LOG_FORMAT),
                e,
            )
        })?;
    }

    Ok(())
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> GatewayResult<T> {
    value.trim().parse().map_err(|_| {
        GatewayError::config_with_context(
            format!("Invalid {} value", name),
            format!("Parsing '{}'", value),
        )
    })
}

fn parse_bool(name: &str, value: &str) -> GatewayResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(GatewayError::config_with_context(
            format!("Invalid {} value", name),
            format!("Parsing '{}' as a boolean", value),
        )),
    }
}
