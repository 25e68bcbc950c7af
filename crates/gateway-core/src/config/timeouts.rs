//! Centralized timeout configuration
//!
//! Default deadlines per operation class and environment. All values can be
//! overridden via configuration.

use super::environment::RuntimeEnvironment;
use crate::timeout::OperationClass;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Production deadlines
pub mod production {
    pub const REQUEST_MS: u64 = 10_000;
    pub const CREDENTIAL_LOOKUP_MS: u64 = 2_000;
    pub const GENERATION_MS: u64 = 7_000;
    pub const STREAM_IDLE_MS: u64 = 6_000;
}

/// Development deadlines
pub mod development {
    pub const REQUEST_MS: u64 = 45_000;
    pub const CREDENTIAL_LOOKUP_MS: u64 = 5_000;
    pub const GENERATION_MS: u64 = 25_000;
    pub const STREAM_IDLE_MS: u64 = 30_000;
}

/// Deadline per operation class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeoutConfig {
    #[serde(with = "duration_millis")]
    pub request: Duration,
    #[serde(with = "duration_millis")]
    pub credential_lookup: Duration,
    #[serde(with = "duration_millis")]
    pub generation: Duration,
    #[serde(with = "duration_millis")]
    pub stream_idle: Duration,
}

impl TimeoutConfig {
    /// Defaults for the given environment
    pub fn for_environment(environment: RuntimeEnvironment) -> Self {
        match environment {
            RuntimeEnvironment::Production => Self {
                request: Duration::from_millis(production::REQUEST_MS),
                credential_lookup: Duration::from_millis(production::CREDENTIAL_LOOKUP_MS),
                generation: Duration::from_millis(production::GENERATION_MS),
                stream_idle: Duration::from_millis(production::STREAM_IDLE_MS),
            },
            RuntimeEnvironment::Development => Self {
                request: Duration::from_millis(development::REQUEST_MS),
                credential_lookup: Duration::from_millis(development::CREDENTIAL_LOOKUP_MS),
                generation: Duration::from_millis(development::GENERATION_MS),
                stream_idle: Duration::from_millis(development::STREAM_IDLE_MS),
            },
        }
    }

    /// Deadline for an operation class
    pub fn deadline(&self, operation: OperationClass) -> Duration {
        match operation {
            OperationClass::Request => self.request,
            OperationClass::CredentialLookup => self.credential_lookup,
            OperationClass::Generation => self.generation,
            OperationClass::StreamIdle => self.stream_idle,
        }
    }

    /// Validate timeout configuration
    ///
    /// Returns an error if any timeout is zero or if a nested deadline is
    /// longer than the request deadline that contains it.
    pub fn validate(&self) -> Result<(), String> {
        let all = [
            ("request", self.request),
            ("credentialLookup", self.credential_lookup),
            ("generation", self.generation),
            ("streamIdle", self.stream_idle),
        ];
        if let Some((name, _)) = all.iter().find(|(_, d)| d.is_zero()) {
            return Err(format!("{} timeout must be greater than 0", name));
        }
        if self.credential_lookup > self.request || self.generation > self.request {
            return Err(
                "Credential lookup and generation timeouts must not exceed the request timeout"
                    .to_string(),
            );
        }
        Ok(())
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self::for_environment(RuntimeEnvironment::default())
    }
}

/// Serde support for Duration as milliseconds
pub(crate) mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_deadlines() {
        let config = TimeoutConfig::for_environment(RuntimeEnvironment::Production);
        assert_eq!(config.deadline(OperationClass::Request), Duration::from_secs(10));
        assert_eq!(
            config.deadline(OperationClass::CredentialLookup),
            Duration::from_secs(2)
        );
        assert_eq!(config.deadline(OperationClass::Generation), Duration::from_secs(7));
        assert_eq!(config.deadline(OperationClass::StreamIdle), Duration::from_secs(6));
    }

    #[test]
    fn test_development_deadlines() {
        let config = TimeoutConfig::for_environment(RuntimeEnvironment::Development);
        assert_eq!(config.request, Duration::from_secs(45));
        assert_eq!(config.credential_lookup, Duration::from_secs(5));
        assert_eq!(config.generation, Duration::from_secs(25));
        assert_eq!(config.stream_idle, Duration::from_secs(30));
    }

    #[test]
    fn test_validate() {
        assert!(TimeoutConfig::default().validate().is_ok());

        let mut config = TimeoutConfig::default();
        config.stream_idle = Duration::ZERO;
        assert!(config.validate().unwrap_err().contains("streamIdle"));

        let mut config = TimeoutConfig::default();
        config.generation = Duration::from_secs(60);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serde_as_millis() {
        let json = serde_json::to_value(TimeoutConfig::default()).unwrap();
        assert_eq!(json["request"], 10_000);
        let parsed: TimeoutConfig = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, TimeoutConfig::default());
    }
}
