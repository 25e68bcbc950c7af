//! Operation delegates run by the orchestrator
//!
//! Each delegate performs one kind of call against whatever adapter the
//! orchestrator hands it, so sync, stream and structured requests share the
//! same retry path.

use crate::error::GatewayResult;
use crate::providers::{ProviderAdapter, ProviderInstance, ProviderStream};
use crate::types::{
    ChatMessage, GenerationMode, GenerationOptions, GenerationResult, StructuredContent,
    TokenUsage,
};
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait Operation: Send + Sync {
    type Output: Send;

    fn mode(&self) -> GenerationMode;

    async fn call(&self, adapter: &ProviderInstance) -> GatewayResult<Self::Output>;

    /// Usage to book once the call returns; `None` when it is only known later
    fn usage(&self, output: &Self::Output) -> Option<TokenUsage>;
}

pub struct SyncGeneration<'a> {
    pub messages: &'a [ChatMessage],
    pub options: &'a GenerationOptions,
}

#[async_trait]
impl Operation for SyncGeneration<'_> {
    type Output = GenerationResult;

    fn mode(&self) -> GenerationMode {
        GenerationMode::Sync
    }

    async fn call(&self, adapter: &ProviderInstance) -> GatewayResult<GenerationResult> {
        adapter.generate_content(self.messages, self.options).await
    }

    fn usage(&self, output: &GenerationResult) -> Option<TokenUsage> {
        Some(output.usage)
    }
}

/// Opens the stream; usage is booked when the stream completes
pub struct StreamGeneration<'a> {
    pub messages: &'a [ChatMessage],
    pub options: &'a GenerationOptions,
}

#[async_trait]
impl Operation for StreamGeneration<'_> {
    type Output = ProviderStream;

    fn mode(&self) -> GenerationMode {
        GenerationMode::Stream
    }

    async fn call(&self, adapter: &ProviderInstance) -> GatewayResult<ProviderStream> {
        adapter.generate_content_stream(self.messages, self.options).await
    }

    fn usage(&self, _output: &ProviderStream) -> Option<TokenUsage> {
        None
    }
}

pub struct StructuredGeneration<'a> {
    pub messages: &'a [ChatMessage],
    pub schema: &'a Value,
    pub options: &'a GenerationOptions,
}

#[async_trait]
impl Operation for StructuredGeneration<'_> {
    type Output = StructuredContent;

    fn mode(&self) -> GenerationMode {
        GenerationMode::Structured
    }

    async fn call(&self, adapter: &ProviderInstance) -> GatewayResult<StructuredContent> {
        adapter
            .generate_structured_content(self.messages, self.schema, self.options)
            .await
    }

    fn usage(&self, output: &StructuredContent) -> Option<TokenUsage> {
        Some(output.usage)
    }
}
