//! CLI commands

pub mod diagnostics;
pub mod encrypt_credential;
pub mod generate;

use anyhow::Context;
use gateway_core::{Gateway, GatewayConfig, InMemoryCredentialStore, JsonFileCredentialStore};
use std::path::Path;
use std::sync::Arc;

/// Build a gateway over the JSON store at `store`, or an empty one
pub(crate) fn build_gateway(config: GatewayConfig, store: Option<&Path>) -> anyhow::Result<Gateway> {
    let builder = Gateway::builder(config);
    let builder = match store {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Credential store not found: {}", path.display());
            }
            builder.store(Arc::new(JsonFileCredentialStore::new(path)))
        }
        None => {
            tracing::warn!("no credential store given; only the mock provider is available");
            builder.store(Arc::new(InMemoryCredentialStore::empty()))
        }
    };
    builder.build().context("Failed to build gateway")
}
