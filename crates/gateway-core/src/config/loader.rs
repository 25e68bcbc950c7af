//! Configuration loader
//!
//! Precedence, lowest to highest: environment defaults, config file,
//! `GATEWAY_*` environment variables.

use super::env_loader::apply_env_overrides;
use super::environment::RuntimeEnvironment;
use super::file_loader::{ConfigOverlay, load_from_file};
use super::gateway_config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    use_env: bool,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env(mut self) -> Self {
        self.use_env = true;
        self
    }

    /// Load against the process environment
    pub fn load(self) -> GatewayResult<GatewayConfig> {
        self.load_with(|name| std::env::var(name).ok())
    }

    /// Load with a caller-supplied environment lookup
    pub fn load_with<F>(self, lookup: F) -> GatewayResult<GatewayConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let overlay = match &self.file {
            Some(path) => load_from_file(path)?,
            None => ConfigOverlay::default(),
        };

        let env_override = if self.use_env {
            lookup(RuntimeEnvironment::ENV_VAR)
                .filter(|v| !v.trim().is_empty())
                .map(|value| {
                    value.parse::<RuntimeEnvironment>().map_err(|e| {
                        GatewayError::config_with_context(
                            format!("Invalid {} value", RuntimeEnvironment::ENV_VAR),
                            e,
                        )
                    })
                })
                .transpose()?
        } else {
            None
        };
        let environment = env_override
            .or(overlay.environment)
            .unwrap_or_default();
        tracing::debug!(environment = %environment, "loading gateway configuration");

        let mut config = GatewayConfig::for_environment(environment);
        overlay.apply(&mut config);
        if self.use_env {
            apply_env_overrides(&mut config, &lookup)?;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProviderKind;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_only() {
        let config = ConfigLoader::new().load_with(|_| None).unwrap();
        assert_eq!(config.environment, RuntimeEnvironment::Production);
        assert_eq!(config.timeouts.request, Duration::from_secs(10));
    }

    #[test]
    fn test_env_beats_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gateway.toml");
        std::fs::write(
            &path,
            "environment = \"production\"\nfallback_order = [\"kimi\"]\n",
        )
        .unwrap();

        let config = ConfigLoader::new()
            .with_file(&path)
            .with_env()
            .load_with(|name| match name {
                "GATEWAY_ENV" => Some("development".to_string()),
                "GATEWAY_FALLBACK_ORDER" => Some("gemini".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.environment, RuntimeEnvironment::Development);
        assert_eq!(config.timeouts.generation, Duration::from_secs(25));
        assert_eq!(config.fallback_order, vec![ProviderKind::Gemini]);
    }

    #[test]
    fn test_file_environment_used_without_env() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gateway.json");
        std::fs::write(&path, r#"{"environment": "development"}"#).unwrap();

        let config = ConfigLoader::new()
            .with_file(&path)
            .load_with(|_| Some("production".to_string()))
            .unwrap();
        assert_eq!(config.environment, RuntimeEnvironment::Development);
    }

    #[test]
    fn test_invalid_result_fails_validation() {
        let err = ConfigLoader::new()
            .with_env()
            .load_with(|name| (name == "GATEWAY_STREAM_CHUNK_SIZE").then(|| "0".to_string()))
            .unwrap_err();
        assert!(matches!(err, GatewayError::Configuration { .. }));
    }
}
