//! Generation result types

use super::provider::ProviderKind;
use serde::{Deserialize, Serialize};

/// Token accounting reported by a backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    /// Prompt tokens served from the provider's context cache
    #[serde(default)]
    pub cached_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            cached_tokens: 0,
        }
    }

    pub fn with_cached(mut self, cached_tokens: u64) -> Self {
        self.cached_tokens = cached_tokens.min(self.prompt_tokens);
        self
    }

    pub fn total(&self) -> u64 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }

    /// Rough token estimate for backends that report nothing (4 chars per token)
    pub fn estimate(prompt: &str, completion: &str) -> Self {
        let estimate = |s: &str| (s.chars().count() as u64).div_ceil(4);
        Self::new(estimate(prompt), estimate(completion))
    }
}

/// Final result of a non-streaming generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub text: String,
    pub usage: TokenUsage,
    pub provider_used: ProviderKind,
    /// Provider the caller asked for, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_provider: Option<ProviderKind>,
    pub used_fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_provider: Option<ProviderKind>,
    pub truncated: bool,
    /// Set when the top-level deadline fired and a canned answer was returned
    #[serde(default)]
    pub timeout: bool,
    /// Parsed output for structured requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured: Option<serde_json::Value>,
}

impl GenerationResult {
    /// Create an undecorated result as produced by an adapter
    pub fn new(text: impl Into<String>, usage: TokenUsage, provider: ProviderKind) -> Self {
        Self {
            text: text.into(),
            usage,
            provider_used: provider,
            requested_provider: None,
            used_fallback: false,
            fallback_provider: None,
            truncated: false,
            timeout: false,
            structured: None,
        }
    }

    /// Mark the result as truncated by the backend's token ceiling
    pub fn with_truncated(mut self, truncated: bool) -> Self {
        self.truncated = truncated;
        self
    }
}

/// Parsed structured output plus the usage it cost
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredContent {
    pub value: serde_json::Value,
    /// Raw text the value was parsed from
    pub raw_text: String,
    pub usage: TokenUsage,
}
