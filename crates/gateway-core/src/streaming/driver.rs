//! Pull-based frame stream over a provider stream
//!
//! The next upstream read happens only when the consumer polls for the next
//! frame. Every exit path (end of body, ceiling, error, idle timeout,
//! cancellation, or the consumer dropping the stream) drops the upstream
//! handle and with it the provider connection.

use super::frame::StreamFrame;
use super::limits::StreamLimits;
use super::reconstructor::ChunkReconstructor;
use crate::error::GatewayError;
use crate::providers::{ProviderStream, StreamPiece};
use crate::timeout::OperationClass;
use crate::types::{ProviderKind, TokenUsage};
use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Frames delivered to the caller
pub type FrameStream = Pin<Box<dyn Stream<Item = StreamFrame> + Send>>;

/// Receives the final token usage once, when the stream completes
pub type UsageSink = Box<dyn FnOnce(TokenUsage) + Send>;

/// Which provider is serving the stream and how it was chosen
#[derive(Debug, Clone, PartialEq)]
pub struct StreamOrigin {
    pub provider: ProviderKind,
    pub requested_provider: Option<ProviderKind>,
    /// Set when a fallback provider serves the stream
    pub fallback_reason: Option<String>,
}

impl StreamOrigin {
    pub fn direct(provider: ProviderKind, requested_provider: Option<ProviderKind>) -> Self {
        Self {
            provider,
            requested_provider,
            fallback_reason: None,
        }
    }

    pub fn fallback(
        provider: ProviderKind,
        requested_provider: Option<ProviderKind>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            requested_provider,
            fallback_reason: Some(reason.into()),
        }
    }

    pub fn used_fallback(&self) -> bool {
        self.fallback_reason.is_some()
    }

    fn opening_frame(&self) -> StreamFrame {
        match &self.fallback_reason {
            Some(reason) => {
                StreamFrame::fallback(self.provider, self.requested_provider, reason.clone())
            }
            None => StreamFrame::connected(self.provider, self.requested_provider),
        }
    }
}

/// Options for [`frame_stream`]
pub struct FrameStreamOptions {
    pub limits: StreamLimits,
    /// Longest gap allowed between two upstream reads
    pub idle_timeout: Duration,
    pub cancel: CancellationToken,
    pub on_usage: Option<UsageSink>,
}

impl FrameStreamOptions {
    pub fn new(limits: StreamLimits, idle_timeout: Duration) -> Self {
        Self {
            limits,
            idle_timeout,
            cancel: CancellationToken::new(),
            on_usage: None,
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_usage_sink(mut self, sink: UsageSink) -> Self {
        self.on_usage = Some(sink);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Opening,
    Reading,
    Done,
}

enum Read {
    Piece(StreamPiece),
    Failed(GatewayError),
    End,
    Idle,
    Cancelled,
}

struct DriverState {
    upstream: Option<ProviderStream>,
    reconstructor: ChunkReconstructor,
    origin: StreamOrigin,
    idle_timeout: Duration,
    cancel: CancellationToken,
    on_usage: Option<UsageSink>,
    usage: Option<TokenUsage>,
    pending: VecDeque<StreamFrame>,
    phase: Phase,
}

impl DriverState {
    async fn read(&mut self) -> Read {
        let Some(upstream) = self.upstream.as_mut() else {
            return Read::End;
        };
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Read::Cancelled,
            next = tokio::time::timeout(self.idle_timeout, upstream.next()) => match next {
                Ok(Some(Ok(piece))) => Read::Piece(piece),
                Ok(Some(Err(e))) => Read::Failed(e),
                Ok(None) => Read::End,
                Err(_) => Read::Idle,
            },
        }
    }

    fn close(&mut self) {
        self.upstream = None;
        self.phase = Phase::Done;
    }

    fn complete(&mut self) {
        self.close();
        let usage = self.usage.unwrap_or_default();
        if let Some(sink) = self.on_usage.take() {
            sink(usage);
        }
        self.pending.push_back(self.reconstructor.complete(
            self.origin.provider,
            self.origin.used_fallback(),
            usage,
        ));
    }

    fn fail(&mut self, error: GatewayError) {
        self.close();
        warn!(
            provider = %self.origin.provider,
            chunk_count = self.reconstructor.chunk_count(),
            error = %error,
            "stream failed"
        );
        self.pending
            .push_back(self.reconstructor.error(self.origin.provider, &error));
    }
}

/// Drive `upstream` through a [`ChunkReconstructor`]
///
/// The stream always ends with exactly one terminal frame: `complete`, or
/// `error` for upstream failures, idle timeouts and cancellation (code
/// `CANCELLED`).
pub fn frame_stream(
    upstream: ProviderStream,
    origin: StreamOrigin,
    options: FrameStreamOptions,
) -> FrameStream {
    let state = DriverState {
        upstream: Some(upstream),
        reconstructor: ChunkReconstructor::new(options.limits),
        origin,
        idle_timeout: options.idle_timeout,
        cancel: options.cancel,
        on_usage: options.on_usage,
        usage: None,
        pending: VecDeque::new(),
        phase: Phase::Opening,
    };

    Box::pin(futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(frame) = state.pending.pop_front() {
                return Some((frame, state));
            }
            match state.phase {
                Phase::Done => return None,
                Phase::Opening => {
                    state.pending.push_back(state.origin.opening_frame());
                    state.phase = Phase::Reading;
                }
                Phase::Reading => match state.read().await {
                    Read::Piece(StreamPiece::Data(bytes)) => {
                        let frames = state.reconstructor.push(&bytes);
                        state.pending.extend(frames);
                        if state.reconstructor.is_capped() {
                            state.complete();
                        }
                    }
                    Read::Piece(StreamPiece::Usage(usage)) => state.usage = Some(usage),
                    Read::End => {
                        let frames = state.reconstructor.finish();
                        state.pending.extend(frames);
                        state.complete();
                    }
                    Read::Failed(error) => state.fail(error),
                    Read::Idle => {
                        let error = GatewayError::timeout(OperationClass::StreamIdle, state.idle_timeout)
                            .for_provider(state.origin.provider);
                        state.fail(error);
                    }
                    Read::Cancelled => {
                        debug!(provider = %state.origin.provider, "stream cancelled by caller");
                        state.close();
                        let error = GatewayError::cancelled(state.origin.provider);
                        state
                            .pending
                            .push_back(state.reconstructor.error(state.origin.provider, &error));
                    }
                },
            }
        }
    }))
}
