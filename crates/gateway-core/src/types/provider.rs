//! Provider identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of backends the gateway can route to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Anthropic Claude (Messages API)
    Claude,
    /// Google Gemini
    Gemini,
    /// DeepSeek (OpenAI-compatible)
    DeepSeek,
    /// Moonshot Kimi (OpenAI-compatible)
    Kimi,
    /// Deterministic local backend, the terminal fallback
    Mock,
}

impl ProviderKind {
    /// Every backend that needs a credential, in default fallback order
    pub const REMOTE: [ProviderKind; 4] = [
        ProviderKind::Claude,
        ProviderKind::Gemini,
        ProviderKind::DeepSeek,
        ProviderKind::Kimi,
    ];

    /// Stable lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Gemini => "gemini",
            Self::DeepSeek => "deepseek",
            Self::Kimi => "kimi",
            Self::Mock => "mock",
        }
    }

    /// Whether the backend needs a decrypted credential to be constructed
    pub fn requires_credential(&self) -> bool {
        !matches!(self, Self::Mock)
    }

    /// Whether the backend bills cached prompt tokens at a reduced rate
    pub fn supports_context_caching(&self) -> bool {
        matches!(self, Self::Claude | Self::Gemini | Self::DeepSeek)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "claude" | "anthropic" => Ok(Self::Claude),
            "gemini" | "google" => Ok(Self::Gemini),
            "deepseek" => Ok(Self::DeepSeek),
            "kimi" | "moonshot" => Ok(Self::Kimi),
            "mock" => Ok(Self::Mock),
            other => Err(format!("unknown provider '{}'", other)),
        }
    }
}
