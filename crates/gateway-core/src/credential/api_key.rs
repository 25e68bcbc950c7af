//! Decrypted provider credentials

use crate::types::ProviderKind;
use chrono::{DateTime, Utc};
use std::fmt;

/// A plaintext API key
///
/// `Debug` and `Display` only ever show the masked form.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw key, for building request headers only
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Masked version for display (e.g., "sk-...abc123")
    pub fn masked(&self) -> String {
        mask_secret(&self.0)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({})", self.masked())
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

/// Mask a secret or identifier for logs and diagnostics
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() > 8 {
        let prefix: String = chars[..3].iter().collect();
        let suffix: String = chars[chars.len() - 6..].iter().collect();
        format!("{}...{}", prefix, suffix)
    } else {
        "*".repeat(chars.len())
    }
}

/// A credential resolved from the configuration store
#[derive(Debug, Clone)]
pub struct Credential {
    pub provider: ProviderKind,
    pub api_key: ApiKey,
    /// Model override from the stored configuration
    pub model: Option<String>,
    /// Base URL override from the stored configuration
    pub base_url: Option<String>,
    /// Identifier of the configuration row it came from
    pub configuration_id: String,
    pub resolved_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(provider: ProviderKind, api_key: ApiKey) -> Self {
        Self {
            provider,
            api_key,
            model: None,
            base_url: None,
            configuration_id: String::new(),
            resolved_at: Utc::now(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_configuration_id(mut self, id: impl Into<String>) -> Self {
        self.configuration_id = id.into();
        self
    }

    pub fn masked_id(&self) -> String {
        mask_secret(&self.configuration_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_long_key() {
        let key = ApiKey::new("sk-ant-api03-abcdefabc123");
        assert_eq!(key.masked(), "sk-...abc123");
        assert_eq!(format!("{:?}", key), "ApiKey(sk-...abc123)");
        assert!(!format!("{}", key).contains("api03"));
    }

    #[test]
    fn test_mask_short_key() {
        assert_eq!(mask_secret("short"), "*****");
        assert_eq!(mask_secret(""), "");
    }

    #[test]
    fn test_mask_is_char_safe() {
        assert_eq!(mask_secret("ключ-очень-длинный"), "клю...линный");
    }

    #[test]
    fn test_credential_debug_does_not_leak() {
        let credential = Credential::new(ProviderKind::Claude, ApiKey::new("sk-secret-value-123456"))
            .with_configuration_id("cfg-0001-claude");
        let debug = format!("{:?}", credential);
        assert!(!debug.contains("secret-value"));
        assert_eq!(credential.masked_id(), "cfg...claude");
    }
}
