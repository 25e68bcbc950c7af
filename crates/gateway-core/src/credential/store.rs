//! Provider configuration stores
//!
//! The gateway only ever reads from a store. Rows are written by the
//! administration side of the application.

use crate::error::{GatewayError, GatewayResult};
use crate::types::ProviderKind;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// One stored provider configuration row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfiguration {
    pub id: String,
    pub provider: ProviderKind,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_default: bool,
    /// `base64(nonce || ciphertext)` of the API key
    pub encrypted_credential_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_true() -> bool {
    true
}

impl ProviderConfiguration {
    pub fn new(
        id: impl Into<String>,
        provider: ProviderKind,
        encrypted_credential_ref: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            provider,
            is_active: true,
            is_default: false,
            encrypted_credential_ref: encrypted_credential_ref.into(),
            model: None,
            base_url: None,
        }
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Reject data with more than one active default per provider
pub fn validate_configurations(configurations: &[ProviderConfiguration]) -> GatewayResult<()> {
    let mut defaults = HashSet::new();
    for configuration in configurations
        .iter()
        .filter(|c| c.is_active && c.is_default)
    {
        if !defaults.insert(configuration.provider) {
            return Err(GatewayError::config_with_context(
                format!(
                    "more than one active default configuration for {}",
                    configuration.provider
                ),
                "Validating provider configurations",
            ));
        }
    }
    Ok(())
}

/// Pick the configuration to use: the active default, else the first active row
pub fn select_configuration(
    configurations: &[ProviderConfiguration],
) -> Option<&ProviderConfiguration> {
    let active = || configurations.iter().filter(|c| c.is_active);
    active()
        .find(|c| c.is_default)
        .or_else(|| active().next())
}

/// Read-only source of provider configurations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Every configuration row stored for a provider, active or not
    async fn configurations(&self, provider: ProviderKind)
    -> GatewayResult<Vec<ProviderConfiguration>>;
}

/// Store held in memory, for embedding and tests
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    configurations: RwLock<Vec<ProviderConfiguration>>,
}

impl InMemoryCredentialStore {
    pub fn new(configurations: Vec<ProviderConfiguration>) -> GatewayResult<Self> {
        validate_configurations(&configurations)?;
        Ok(Self {
            configurations: RwLock::new(configurations),
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Swap the full configuration set
    pub fn replace(&self, configurations: Vec<ProviderConfiguration>) -> GatewayResult<()> {
        validate_configurations(&configurations)?;
        *self.configurations.write() = configurations;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn configurations(
        &self,
        provider: ProviderKind,
    ) -> GatewayResult<Vec<ProviderConfiguration>> {
        Ok(self
            .configurations
            .read()
            .iter()
            .filter(|c| c.provider == provider)
            .cloned()
            .collect())
    }
}

/// Store backed by a JSON array on disk
///
/// The file is read on every lookup so edits are picked up without restart.
#[derive(Debug, Clone)]
pub struct JsonFileCredentialStore {
    path: PathBuf,
}

impl JsonFileCredentialStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> GatewayResult<Vec<ProviderConfiguration>> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            GatewayError::io_at(
                format!("failed to read credential store: {}", e),
                self.path.display().to_string(),
            )
        })?;
        let configurations: Vec<ProviderConfiguration> =
            serde_json::from_str(&content).map_err(|e| {
                GatewayError::config_with_context(
                    format!("failed to parse credential store: {}", e),
                    format!("Reading '{}'", self.path.display()),
                )
            })?;
        validate_configurations(&configurations)?;
        Ok(configurations)
    }
}

#[async_trait]
impl CredentialStore for JsonFileCredentialStore {
    async fn configurations(
        &self,
        provider: ProviderKind,
    ) -> GatewayResult<Vec<ProviderConfiguration>> {
        Ok(self
            .load()
            .await?
            .into_iter()
            .filter(|c| c.provider == provider)
            .collect())
    }
}
