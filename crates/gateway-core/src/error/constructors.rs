//! Constructor methods for GatewayError

use super::types::GatewayError;
use crate::timeout::OperationClass;
use crate::types::ProviderKind;
use std::time::Duration;

impl GatewayError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            context: None,
        }
    }

    /// Create a configuration error with context
    pub fn config_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create an authentication error
    pub fn auth(provider: ProviderKind, message: impl Into<String>) -> Self {
        Self::Authentication {
            provider,
            message: message.into(),
        }
    }

    /// Create a rate limit error
    pub fn rate_limited(provider: ProviderKind, message: impl Into<String>) -> Self {
        Self::RateLimit {
            provider,
            message: message.into(),
            retry_after: None,
        }
    }

    /// Create a rate limit error carrying the provider's retry hint
    pub fn rate_limited_with_retry(
        provider: ProviderKind,
        message: impl Into<String>,
        retry_after: Option<Duration>,
    ) -> Self {
        Self::RateLimit {
            provider,
            message: message.into(),
            retry_after,
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: OperationClass, elapsed: Duration) -> Self {
        Self::Timeout {
            operation,
            elapsed,
            provider: None,
        }
    }

    /// Create a schema validation error
    pub fn schema(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self::SchemaValidation {
            message: message.into(),
            errors,
        }
    }

    /// Create an upstream error
    pub fn upstream(provider: ProviderKind, message: impl Into<String>) -> Self {
        Self::Upstream {
            provider,
            message: message.into(),
            status_code: None,
        }
    }

    /// Create an upstream error with HTTP status
    pub fn upstream_with_status(
        provider: ProviderKind,
        message: impl Into<String>,
        status_code: u16,
    ) -> Self {
        Self::Upstream {
            provider,
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn cancelled(provider: ProviderKind) -> Self {
        Self::Cancelled { provider }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create an IO error for a path
    pub fn io_at(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Attach the provider a timeout happened on
    pub fn for_provider(self, provider: ProviderKind) -> Self {
        match self {
            Self::Timeout {
                operation, elapsed, ..
            } => Self::Timeout {
                operation,
                elapsed,
                provider: Some(provider),
            },
            other => other,
        }
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
            path: None,
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization(error.to_string())
    }
}

impl From<toml::de::Error> for GatewayError {
    fn from(error: toml::de::Error) -> Self {
        Self::config_with_context(error.to_string(), "Parsing TOML configuration")
    }
}
