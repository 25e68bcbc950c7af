//! Answers given when no provider produced one in time
//!
//! The caller still gets a well-formed response: Mock output tagged with
//! `used_fallback = true`, and `timeout = true` when the request deadline
//! fired.

use crate::fallback::FallbackReason;
use crate::ledger::UsageLedger;
use crate::providers::MockProvider;
use crate::streaming::{FrameStream, FrameStreamOptions, StreamOrigin, frame_stream};
use crate::types::{ChatMessage, GenerationRequest, GenerationResult, ProviderKind, TokenUsage};
use std::sync::Arc;
use tracing::warn;

/// Why the gateway answers with canned output
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Degradation {
    /// The request deadline fired
    Deadline,
    /// Every candidate failed before the deadline
    Exhausted(FallbackReason),
}

impl Degradation {
    fn timed_out(&self) -> bool {
        matches!(self, Self::Deadline)
    }

    fn reason(&self) -> FallbackReason {
        match self {
            Self::Deadline => FallbackReason::Timeout,
            Self::Exhausted(reason) => reason.clone(),
        }
    }
}

/// Canned result for sync and structured requests
pub(super) async fn degraded_result(
    request: &GenerationRequest,
    messages: &[ChatMessage],
    ledger: &UsageLedger,
    cause: &Degradation,
) -> GenerationResult {
    let mock = MockProvider::new();
    let mut result = match mock.generate_content(messages, &request.options).await {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "canned generation failed");
            GenerationResult::new(String::new(), TokenUsage::default(), ProviderKind::Mock)
        }
    };
    if let Some(schema) = &request.options.schema {
        match mock
            .generate_structured_content(messages, schema, &request.options)
            .await
        {
            Ok(content) => result.structured = Some(content.value),
            Err(e) => warn!(error = %e, "canned structured output failed"),
        }
    }

    ledger.record_completion(ProviderKind::Mock, &result.usage);
    result.requested_provider = request.provider;
    result.used_fallback = true;
    result.fallback_provider = Some(ProviderKind::Mock);
    result.timeout = cause.timed_out();
    result
}

/// Canned frame stream for stream requests
pub(super) async fn degraded_stream(
    request: &GenerationRequest,
    messages: &[ChatMessage],
    ledger: Arc<UsageLedger>,
    options: FrameStreamOptions,
    cause: &Degradation,
) -> Option<FrameStream> {
    let upstream = match MockProvider::new()
        .generate_content_stream(messages, &request.options)
        .await
    {
        Ok(upstream) => upstream,
        Err(e) => {
            warn!(error = %e, "canned stream failed");
            return None;
        }
    };

    let origin = StreamOrigin::fallback(
        ProviderKind::Mock,
        request.provider,
        cause.reason().to_string(),
    );
    let options = options.with_usage_sink(Box::new(move |usage| {
        ledger.record_completion(ProviderKind::Mock, &usage);
    }));
    Some(frame_stream(upstream, origin, options))
}
