//! Configuration resolver
//!
//! Finds the active configuration for a provider and opens its credential
//! within a bounded window. Every failure becomes
//! [`CredentialLookup::Missing`]; the caller decides what to do next.

use super::api_key::{ApiKey, Credential};
use super::cipher::{CredentialKey, decrypt_credential};
use super::store::{CredentialStore, select_configuration};
use crate::timeout::{Raced, first_of};
use crate::types::ProviderKind;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Why no credential could be produced
#[derive(Debug, Clone, PartialEq)]
pub enum MissingReason {
    /// No active configuration row for the provider
    NoActiveConfiguration,
    /// The gateway has no key to open stored credentials
    NoCredentialKey,
    /// The store did not answer inside the lookup deadline
    LookupTimedOut(Duration),
    /// The store raised an error
    StoreFailure(String),
    /// The stored reference could not be opened
    DecryptionFailed(String),
}

impl fmt::Display for MissingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoActiveConfiguration => write!(f, "no active configuration"),
            Self::NoCredentialKey => write!(f, "no credential key configured"),
            Self::LookupTimedOut(elapsed) => {
                write!(f, "credential lookup timed out after {}ms", elapsed.as_millis())
            }
            Self::StoreFailure(message) => write!(f, "credential store failure: {}", message),
            Self::DecryptionFailed(message) => write!(f, "credential decryption failed: {}", message),
        }
    }
}

/// Outcome of a lookup
#[derive(Debug, Clone)]
pub enum CredentialLookup {
    Resolved(Credential),
    Missing(MissingReason),
}

impl CredentialLookup {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

#[derive(Clone)]
pub struct ConfigurationResolver {
    store: Arc<dyn CredentialStore>,
    key: Option<CredentialKey>,
    timeout: Duration,
}

impl fmt::Debug for ConfigurationResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationResolver")
            .field("has_key", &self.key.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ConfigurationResolver {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        key: Option<CredentialKey>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            key,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve the credential for a provider
    #[instrument(skip(self), fields(provider = %provider))]
    pub async fn resolve(&self, provider: ProviderKind) -> CredentialLookup {
        let lookup = match first_of(self.lookup(provider), self.timeout).await {
            Raced::Completed(lookup) => lookup,
            Raced::TimedOut(elapsed) => {
                CredentialLookup::Missing(MissingReason::LookupTimedOut(elapsed))
            }
        };

        match &lookup {
            CredentialLookup::Resolved(credential) => debug!(
                configuration = %credential.masked_id(),
                api_key = %credential.api_key,
                "credential resolved"
            ),
            CredentialLookup::Missing(reason) => warn!(reason = %reason, "credential missing"),
        }
        lookup
    }

    async fn lookup(&self, provider: ProviderKind) -> CredentialLookup {
        let configurations = match self.store.configurations(provider).await {
            Ok(configurations) => configurations,
            Err(e) => return CredentialLookup::Missing(MissingReason::StoreFailure(e.to_string())),
        };

        let Some(configuration) = select_configuration(&configurations) else {
            return CredentialLookup::Missing(MissingReason::NoActiveConfiguration);
        };
        let Some(key) = &self.key else {
            return CredentialLookup::Missing(MissingReason::NoCredentialKey);
        };

        let plaintext = match decrypt_credential(key, &configuration.encrypted_credential_ref) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                return CredentialLookup::Missing(MissingReason::DecryptionFailed(e.to_string()));
            }
        };
        let api_key = ApiKey::new(plaintext);
        if api_key.is_empty() {
            return CredentialLookup::Missing(MissingReason::DecryptionFailed(
                "credential is empty".to_string(),
            ));
        }

        let mut credential =
            Credential::new(provider, api_key).with_configuration_id(configuration.id.clone());
        credential.model = configuration.model.clone();
        credential.base_url = configuration.base_url.clone();
        CredentialLookup::Resolved(credential)
    }
}
