//! Provider stream handle
//!
//! Adapters hand back raw UTF-8 byte pieces of generated text followed by one
//! trailing usage record. Bytes are not guaranteed to end on a character
//! boundary; the stream reconstructor stitches them back together.

use super::error_utils::from_transport;
use super::sse::{SseDecoder, SseEvent};
use crate::error::GatewayResult;
use crate::types::{ProviderKind, TokenUsage};
use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Instant;

/// One item read from a provider stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamPiece {
    Data(Vec<u8>),
    Usage(TokenUsage),
}

pub type ProviderStream = Pin<Box<dyn Stream<Item = GatewayResult<StreamPiece>> + Send>>;

/// What a single SSE event contributed
#[derive(Debug, Default)]
pub(crate) struct ParsedEvent {
    pub text: Option<String>,
    /// The provider signalled the end of the response
    pub done: bool,
}

impl ParsedEvent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            done: false,
        }
    }

    pub fn done() -> Self {
        Self {
            text: None,
            done: true,
        }
    }

    pub fn skip() -> Self {
        Self::default()
    }
}

/// Provider-specific interpretation of SSE events
pub(crate) trait EventParser: Send + 'static {
    fn on_event(&mut self, event: &SseEvent) -> GatewayResult<ParsedEvent>;

    /// Usage accumulated from the events seen so far
    fn usage(&self) -> TokenUsage;
}

struct SseState<S, P> {
    bytes: S,
    decoder: SseDecoder,
    parser: P,
    queue: VecDeque<GatewayResult<StreamPiece>>,
    finished: bool,
    provider: ProviderKind,
    started: Instant,
}

impl<S, P: EventParser> SseState<S, P> {
    fn handle(&mut self, event: SseEvent) {
        if self.finished {
            return;
        }
        match self.parser.on_event(&event) {
            Ok(parsed) => {
                if let Some(text) = parsed.text.filter(|t| !t.is_empty()) {
                    self.queue.push_back(Ok(StreamPiece::Data(text.into_bytes())));
                }
                if parsed.done {
                    self.finish();
                }
            }
            Err(e) => {
                self.queue.push_back(Err(e));
                self.finished = true;
            }
        }
    }

    fn finish(&mut self) {
        self.queue
            .push_back(Ok(StreamPiece::Usage(self.parser.usage())));
        self.finished = true;
    }
}

/// Turn an HTTP SSE body into a [`ProviderStream`]
///
/// Pull-based: the body is only read when the consumer asks for the next
/// piece. Reading stops at the provider's end marker, at the first error, or
/// at end of body.
pub(crate) fn sse_stream<S, B, P>(
    bytes: S,
    parser: P,
    provider: ProviderKind,
    started: Instant,
) -> ProviderStream
where
    S: Stream<Item = Result<B, reqwest::Error>> + Send + Unpin + 'static,
    B: AsRef<[u8]>,
    P: EventParser,
{
    let state = SseState {
        bytes,
        decoder: SseDecoder::new(),
        parser,
        queue: VecDeque::new(),
        finished: false,
        provider,
        started,
    };

    Box::pin(futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.queue.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    for event in state.decoder.feed(chunk.as_ref()) {
                        state.handle(event);
                    }
                }
                Some(Err(e)) => {
                    let error = from_transport(e, state.provider, state.started);
                    state.queue.push_back(Err(error));
                    state.finished = true;
                }
                None => {
                    if let Some(event) = state.decoder.finish() {
                        state.handle(event);
                    }
                    if !state.finished {
                        state.finish();
                    }
                }
            }
        }
    }))
}

/// Collect a provider stream into full text and usage
pub async fn collect_stream(mut stream: ProviderStream) -> GatewayResult<(String, TokenUsage)> {
    let mut bytes = Vec::new();
    let mut usage = TokenUsage::default();
    while let Some(piece) = stream.next().await {
        match piece? {
            StreamPiece::Data(data) => bytes.extend_from_slice(&data),
            StreamPiece::Usage(u) => usage = u,
        }
    }
    Ok((String::from_utf8_lossy(&bytes).into_owned(), usage))
}
