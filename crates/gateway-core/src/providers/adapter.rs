//! Adapter trait, the closed set of adapters and their factory

use super::anthropic::AnthropicProvider;
use super::gemini::GeminiProvider;
use super::mock::MockProvider;
use super::openai_compat::OpenAiCompatProvider;
use super::stream::ProviderStream;
use crate::config::ProviderSettings;
use crate::credential::{ApiKey, Credential};
use crate::error::{GatewayError, GatewayResult};
use crate::types::{
    ChatMessage, GenerationOptions, GenerationResult, ProviderKind, StructuredContent,
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Common interface of every backend
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Single-shot generation
    async fn generate_content(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> GatewayResult<GenerationResult>;

    /// Open a stream of raw UTF-8 byte pieces followed by one usage record
    async fn generate_content_stream(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> GatewayResult<ProviderStream>;

    /// Generation coerced to `schema`, failing with `SchemaValidation`
    async fn generate_structured_content(
        &self,
        messages: &[ChatMessage],
        schema: &Value,
        options: &GenerationOptions,
    ) -> GatewayResult<StructuredContent>;
}

/// Connection details an adapter owns
#[derive(Debug, Clone)]
pub struct AdapterSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: ApiKey,
    pub context_caching: bool,
}

impl AdapterSettings {
    /// Stored configuration overrides win over gateway defaults
    pub fn resolve(credential: &Credential, settings: &ProviderSettings) -> Self {
        Self {
            base_url: credential
                .base_url
                .clone()
                .unwrap_or_else(|| settings.base_url.clone()),
            model: credential
                .model
                .clone()
                .unwrap_or_else(|| settings.model.clone()),
            api_key: credential.api_key.clone(),
            context_caching: settings.context_caching,
        }
    }
}

/// One constructed adapter
pub enum ProviderInstance {
    Claude(AnthropicProvider),
    Gemini(GeminiProvider),
    DeepSeek(OpenAiCompatProvider),
    Kimi(OpenAiCompatProvider),
    Mock(MockProvider),
}

impl ProviderInstance {
    /// Build the adapter for `kind`
    ///
    /// Remote providers need a credential with a non-empty key; without one
    /// construction fails with a configuration error.
    pub fn create(
        kind: ProviderKind,
        credential: Option<&Credential>,
        settings: &ProviderSettings,
        http_client: Client,
    ) -> GatewayResult<Self> {
        if kind == ProviderKind::Mock {
            return Ok(Self::Mock(MockProvider::new()));
        }

        let credential = credential.ok_or_else(|| {
            GatewayError::config_with_context(
                format!("no credential available for {}", kind),
                "Constructing provider adapter",
            )
        })?;
        if credential.provider != kind {
            return Err(GatewayError::config(format!(
                "credential for {} cannot construct {}",
                credential.provider, kind
            )));
        }
        if credential.api_key.is_empty() {
            return Err(GatewayError::auth(kind, "stored API key is empty"));
        }

        let adapter_settings = AdapterSettings::resolve(credential, settings);
        debug!(
            provider = %kind,
            model = %adapter_settings.model,
            configuration = %credential.masked_id(),
            "constructing provider adapter"
        );

        Ok(match kind {
            ProviderKind::Claude => Self::Claude(AnthropicProvider::new(adapter_settings, http_client)),
            ProviderKind::Gemini => Self::Gemini(GeminiProvider::new(adapter_settings, http_client)),
            ProviderKind::DeepSeek => Self::DeepSeek(OpenAiCompatProvider::new(
                kind,
                adapter_settings,
                http_client,
            )),
            ProviderKind::Kimi => Self::Kimi(OpenAiCompatProvider::new(
                kind,
                adapter_settings,
                http_client,
            )),
            ProviderKind::Mock => Self::Mock(MockProvider::new()),
        })
    }
}

#[async_trait]
impl ProviderAdapter for ProviderInstance {
    fn kind(&self) -> ProviderKind {
        match self {
            Self::Claude(_) => ProviderKind::Claude,
            Self::Gemini(_) => ProviderKind::Gemini,
            Self::DeepSeek(_) => ProviderKind::DeepSeek,
            Self::Kimi(_) => ProviderKind::Kimi,
            Self::Mock(_) => ProviderKind::Mock,
        }
    }

    async fn generate_content(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> GatewayResult<GenerationResult> {
        match self {
            Self::Claude(p) => p.generate_content(messages, options).await,
            Self::Gemini(p) => p.generate_content(messages, options).await,
            Self::DeepSeek(p) | Self::Kimi(p) => p.generate_content(messages, options).await,
            Self::Mock(p) => p.generate_content(messages, options).await,
        }
    }

    async fn generate_content_stream(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> GatewayResult<ProviderStream> {
        match self {
            Self::Claude(p) => p.generate_content_stream(messages, options).await,
            Self::Gemini(p) => p.generate_content_stream(messages, options).await,
            Self::DeepSeek(p) | Self::Kimi(p) => {
                p.generate_content_stream(messages, options).await
            }
            Self::Mock(p) => p.generate_content_stream(messages, options).await,
        }
    }

    async fn generate_structured_content(
        &self,
        messages: &[ChatMessage],
        schema: &Value,
        options: &GenerationOptions,
    ) -> GatewayResult<StructuredContent> {
        match self {
            Self::Claude(p) => p.generate_structured_content(messages, schema, options).await,
            Self::Gemini(p) => p.generate_structured_content(messages, schema, options).await,
            Self::DeepSeek(p) | Self::Kimi(p) => {
                p.generate_structured_content(messages, schema, options).await
            }
            Self::Mock(p) => p.generate_structured_content(messages, schema, options).await,
        }
    }
}

/// Shared HTTP transport
///
/// Only connecting is bounded here; whole-call deadlines belong to the
/// timeout supervisor so streams are not cut off mid-response.
pub fn build_http_client(connect_timeout: Duration) -> GatewayResult<Client> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .build()
        .map_err(|e| {
            GatewayError::config_with_context(
                format!("Failed to create HTTP client: {}", e),
                "Building provider transport",
            )
        })
}
