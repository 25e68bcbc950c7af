//! Builder for creating a gateway

use super::Gateway;
use crate::config::GatewayConfig;
use crate::credential::{ConfigurationResolver, CredentialStore, InMemoryCredentialStore};
use crate::error::GatewayResult;
use crate::fallback::FallbackOrchestrator;
use crate::ledger::UsageLedger;
use crate::providers::build_http_client;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Connect timeout of the shared HTTP client
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Builder for creating a [`Gateway`]
pub struct GatewayBuilder {
    config: GatewayConfig,
    store: Option<Arc<dyn CredentialStore>>,
    ledger: Option<Arc<UsageLedger>>,
    http_client: Option<Client>,
}

impl GatewayBuilder {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            store: None,
            ledger: None,
            http_client: None,
        }
    }

    /// Source of provider configurations; an empty store leaves only Mock
    pub fn store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Share a usage ledger between gateways
    pub fn ledger(mut self, ledger: Arc<UsageLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Validate the configuration and assemble the gateway
    pub fn build(self) -> GatewayResult<Gateway> {
        self.config.validate()?;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryCredentialStore::empty()));
        let ledger = self.ledger.unwrap_or_else(|| {
            Arc::new(UsageLedger::new(
                self.config.rate_limits(),
                self.config.pricing(),
            ))
        });
        let http_client = match self.http_client {
            Some(client) => client,
            None => build_http_client(DEFAULT_CONNECT_TIMEOUT)?,
        };

        let config = Arc::new(self.config);
        let resolver = ConfigurationResolver::new(
            store,
            config.credential_key.clone(),
            config.timeouts.credential_lookup,
        );
        let orchestrator = FallbackOrchestrator::new(
            resolver.clone(),
            Arc::clone(&config),
            http_client,
            Arc::clone(&ledger),
        );

        Ok(Gateway {
            config,
            resolver,
            orchestrator,
            ledger,
        })
    }
}
