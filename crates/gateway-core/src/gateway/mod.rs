//! Gateway facade
//!
//! The only entry point for the HTTP layer. A request is validated, routed
//! through the fallback orchestrator under the request deadline and returned
//! either as a complete result or as a frame stream.

mod builder;
mod degraded;
mod diagnostics;

#[cfg(test)]
mod tests;

pub use builder::{DEFAULT_CONNECT_TIMEOUT, GatewayBuilder};
use degraded::Degradation;
pub use diagnostics::{CacheStatistics, Diagnostics, ProviderDiagnostics, UsageStatistics};

use crate::config::GatewayConfig;
use crate::credential::{ConfigurationResolver, CredentialLookup};
use crate::error::{GatewayError, GatewayResult};
use crate::fallback::{
    Attempted, FallbackOrchestrator, FallbackReason, StreamGeneration, StructuredGeneration,
    SyncGeneration,
};
use crate::ledger::UsageLedger;
use crate::streaming::{FrameStream, FrameStreamOptions, StreamOrigin, frame_stream};
use crate::timeout::{Raced, first_of};
use crate::types::{
    ChatMessage, GenerationMode, GenerationRequest, GenerationResult, ProviderKind,
};
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

/// What a caller receives for a generation request
pub enum GatewayResponse {
    Complete(GenerationResult),
    Stream(FrameStream),
}

impl GatewayResponse {
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Stream(_))
    }

    /// The complete result, if this is not a stream
    pub fn into_result(self) -> Option<GenerationResult> {
        match self {
            Self::Complete(result) => Some(result),
            Self::Stream(_) => None,
        }
    }

    pub fn into_stream(self) -> Option<FrameStream> {
        match self {
            Self::Complete(_) => None,
            Self::Stream(stream) => Some(stream),
        }
    }
}

impl fmt::Debug for GatewayResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete(result) => f.debug_tuple("Complete").field(result).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

pub struct Gateway {
    config: Arc<GatewayConfig>,
    resolver: ConfigurationResolver,
    orchestrator: FallbackOrchestrator,
    ledger: Arc<UsageLedger>,
}

impl Gateway {
    pub fn builder(config: GatewayConfig) -> GatewayBuilder {
        GatewayBuilder::new(config)
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Arc<UsageLedger> {
        &self.ledger
    }

    /// Serve a generation request
    ///
    /// Only a malformed request is an error. Provider failures fall back,
    /// and a request that outlives its deadline gets a canned answer.
    pub async fn generate(&self, request: GenerationRequest) -> GatewayResult<GatewayResponse> {
        self.generate_with_cancel(request, CancellationToken::new())
            .await
    }

    /// Like [`Gateway::generate`]; firing `cancel` closes a returned stream
    pub async fn generate_with_cancel(
        &self,
        request: GenerationRequest,
        cancel: CancellationToken,
    ) -> GatewayResult<GatewayResponse> {
        request.validate()?;

        let request_id = Uuid::new_v4();
        let span = info_span!(
            "generate",
            request_id = %request_id,
            mode = %request.mode,
            requested = ?request.provider,
        );
        let messages = request.to_messages();
        let deadline = self.config.timeouts.request;

        let outcome = first_of(self.dispatch(&request, &messages, cancel.clone()), deadline)
            .instrument(span.clone())
            .await;

        match outcome {
            Raced::Completed(Ok(response)) => Ok(response),
            Raced::Completed(Err(e)) if !e.is_retryable() => Err(e),
            Raced::Completed(Err(e)) => {
                span.in_scope(|| warn!(error = %e, "no provider served the request"));
                let cause =
                    Degradation::Exhausted(FallbackReason::Error(e.error_code().to_string()));
                self.degrade(&request, &messages, cancel, cause)
                    .instrument(span)
                    .await
            }
            Raced::TimedOut(elapsed) => {
                span.in_scope(|| {
                    warn!(
                        elapsed_ms = elapsed.as_millis() as u64,
                        "request deadline reached, returning canned answer"
                    )
                });
                self.degrade(&request, &messages, cancel, Degradation::Deadline)
                    .instrument(span)
                    .await
            }
        }
    }

    async fn dispatch(
        &self,
        request: &GenerationRequest,
        messages: &[ChatMessage],
        cancel: CancellationToken,
    ) -> GatewayResult<GatewayResponse> {
        let options = &request.options;
        match request.mode {
            GenerationMode::Sync => {
                let operation = SyncGeneration { messages, options };
                let attempted = self.orchestrator.run(request.provider, &operation).await?;
                Ok(GatewayResponse::Complete(tag(attempted, |result| result)))
            }
            GenerationMode::Structured => {
                let schema = options.schema.as_ref().ok_or_else(|| {
                    GatewayError::invalid_request(
                        "structured mode requires a schema",
                        "options.schema",
                    )
                })?;
                let operation = StructuredGeneration {
                    messages,
                    schema,
                    options,
                };
                let attempted = self.orchestrator.run(request.provider, &operation).await?;
                Ok(GatewayResponse::Complete(tag(attempted, |content| {
                    let mut result = GenerationResult::new(
                        content.raw_text,
                        content.usage,
                        ProviderKind::Mock,
                    );
                    result.structured = Some(content.value);
                    result
                })))
            }
            GenerationMode::Stream => {
                let operation = StreamGeneration { messages, options };
                let attempted = self.orchestrator.run(request.provider, &operation).await?;
                let provider = attempted.provider;
                let origin = if attempted.used_fallback {
                    let reason = attempted
                        .fallback_reason
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_else(|| "fallback".to_string());
                    StreamOrigin::fallback(provider, request.provider, reason)
                } else {
                    StreamOrigin::direct(provider, request.provider)
                };

                let ledger = Arc::clone(&self.ledger);
                let stream_options = self
                    .stream_options(cancel)
                    .with_usage_sink(Box::new(move |usage| {
                        ledger.record_completion(provider, &usage);
                    }));
                info!(provider = %provider, used_fallback = origin.used_fallback(), "stream opened");
                Ok(GatewayResponse::Stream(frame_stream(
                    attempted.value,
                    origin,
                    stream_options,
                )))
            }
        }
    }

    async fn degrade(
        &self,
        request: &GenerationRequest,
        messages: &[ChatMessage],
        cancel: CancellationToken,
        cause: Degradation,
    ) -> GatewayResult<GatewayResponse> {
        if request.mode == GenerationMode::Stream {
            let options = self.stream_options(cancel);
            if let Some(stream) = degraded::degraded_stream(
                request,
                messages,
                Arc::clone(&self.ledger),
                options,
                &cause,
            )
            .await
            {
                return Ok(GatewayResponse::Stream(stream));
            }
        }
        Ok(GatewayResponse::Complete(
            degraded::degraded_result(request, messages, &self.ledger, &cause).await,
        ))
    }

    fn stream_options(&self, cancel: CancellationToken) -> FrameStreamOptions {
        FrameStreamOptions::new(self.config.stream, self.config.timeouts.stream_idle)
            .with_cancel(cancel)
    }

    /// Health, usage and cost of every provider with an active configuration
    ///
    /// Mock is always listed.
    pub async fn diagnostics(&self) -> Diagnostics {
        let mut candidates = self.orchestrator.policy().order().to_vec();
        candidates.push(ProviderKind::Mock);

        let mut providers = Vec::with_capacity(candidates.len());
        for provider in candidates {
            let settings = self.config.provider(provider);
            let mut model = settings.model.clone();
            let configuration = if provider.requires_credential() {
                match self.resolver.resolve(provider).await {
                    CredentialLookup::Resolved(credential) => {
                        if let Some(configured) = &credential.model {
                            model = configured.clone();
                        }
                        Some(credential.masked_id())
                    }
                    CredentialLookup::Missing(_) => continue,
                }
            } else {
                None
            };

            let stats = self.ledger.accountant().stats(provider);
            let cache_statistics = settings.context_caching.then(|| CacheStatistics {
                prompt_tokens: stats.prompt_tokens,
                cached_tokens: stats.cached_tokens,
                cache_hit_rate: stats.cache_hit_rate(),
                cache_savings: stats.cache_savings,
            });

            providers.push(ProviderDiagnostics {
                provider,
                model,
                configuration,
                cache_statistics,
                health_status: self.orchestrator.health_status(provider),
                usage_statistics: UsageStatistics {
                    rate_limiting: self.ledger.rate_status(provider),
                    cost_analysis: self.ledger.cost_analysis(provider),
                },
            });
        }

        Diagnostics {
            generated_at: Utc::now(),
            environment: self.config.environment,
            providers,
            fallback_history: self.orchestrator.history(),
        }
    }

    /// Forget provider health and fallback history; usage lives in the ledger
    pub fn reset_health(&self) {
        self.orchestrator.reset_health();
    }
}

/// Decorate an adapter output with the routing outcome
fn tag<T>(attempted: Attempted<T>, into_result: impl FnOnce(T) -> GenerationResult) -> GenerationResult {
    let mut result = into_result(attempted.value);
    result.provider_used = attempted.provider;
    result.requested_provider = attempted.requested_provider;
    result.used_fallback = attempted.used_fallback;
    result.fallback_provider = attempted.used_fallback.then_some(attempted.provider);
    result
}
