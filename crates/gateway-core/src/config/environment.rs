//! Runtime environment selection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Environment the gateway runs in; selects every default budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Production,
    Development,
}

impl RuntimeEnvironment {
    /// Name of the variable that selects the environment
    pub const ENV_VAR: &'static str = "GATEWAY_ENV";

    /// Read the environment from `GATEWAY_ENV`, defaulting to production
    pub fn from_env() -> Self {
        std::env::var(Self::ENV_VAR)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for RuntimeEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => write!(f, "production"),
            Self::Development => write!(f, "development"),
        }
    }
}

impl FromStr for RuntimeEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" | "local" | "test" => Ok(Self::Development),
            other => Err(format!("unknown environment '{}'", other)),
        }
    }
}
