//! Provider credentials
//!
//! Stored configurations carry an AES-256-GCM sealed API key. The
//! [`ConfigurationResolver`] opens it on demand; plaintext keys only live in
//! [`ApiKey`], whose formatting is always masked.

mod api_key;
mod cipher;
mod resolver;
mod store;

pub use api_key::{ApiKey, Credential, mask_secret};
pub use cipher::{CredentialKey, KEY_SIZE, decrypt_credential, encrypt_credential};
pub use resolver::{ConfigurationResolver, CredentialLookup, MissingReason};
pub use store::{
    CredentialStore, InMemoryCredentialStore, JsonFileCredentialStore, ProviderConfiguration,
    select_configuration, validate_configurations,
};
