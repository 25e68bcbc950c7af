//! Stream chunk reconstructor
//!
//! Synchronous core of the streaming path: raw byte pieces go in, bounded
//! content frames come out. It performs no I/O, so the driver decides when to
//! read and the reconstructor only decides what to emit.

use super::breakpoint::find_breakpoint;
use super::frame::{CapReason, CompleteFrame, ContentFrame, ContinuationFrame, ErrorFrame, StreamFrame};
use super::limits::StreamLimits;
use super::utf8::Utf8Carry;
use crate::error::GatewayError;
use crate::types::{ProviderKind, TokenUsage};

#[derive(Debug)]
pub struct ChunkReconstructor {
    limits: StreamLimits,
    utf8: Utf8Carry,
    buffer: String,
    /// Concatenation of every emitted content payload
    emitted: String,
    /// Characters received (emitted plus buffered)
    total_length: usize,
    chunk_count: usize,
    capped: Option<CapReason>,
}

impl ChunkReconstructor {
    pub fn new(limits: StreamLimits) -> Self {
        Self {
            limits,
            utf8: Utf8Carry::new(),
            buffer: String::new(),
            emitted: String::new(),
            total_length: 0,
            chunk_count: 0,
            capped: None,
        }
    }

    /// Feed one raw read
    ///
    /// Once a ceiling is hit the returned frames end with a `continuation`
    /// and every later call returns nothing.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<StreamFrame> {
        if self.capped.is_some() {
            return Vec::new();
        }
        let text = self.utf8.decode(bytes);
        self.accept(&text)
    }

    /// The upstream is exhausted: flush the buffer
    pub fn finish(&mut self) -> Vec<StreamFrame> {
        if self.capped.is_some() {
            return Vec::new();
        }
        let mut frames = match self.utf8.finish() {
            Some(tail) => self.accept(&tail),
            None => Vec::new(),
        };
        if self.capped.is_none() && !self.buffer.is_empty() {
            if self.chunk_count < self.limits.max_chunks {
                let rest = std::mem::take(&mut self.buffer);
                frames.push(self.emit(rest));
            } else {
                frames.push(self.cap(CapReason::MaxChunks));
            }
        }
        frames
    }

    fn accept(&mut self, text: &str) -> Vec<StreamFrame> {
        let mut frames = Vec::new();
        if text.is_empty() {
            return frames;
        }

        let allowance = self.limits.max_length.saturating_sub(self.total_length);
        let incoming = text.chars().count();
        let over_length = incoming > allowance;
        if over_length {
            let cut = text
                .char_indices()
                .nth(allowance)
                .map_or(text.len(), |(idx, _)| idx);
            self.buffer.push_str(&text[..cut]);
            self.total_length += allowance;
        } else {
            self.buffer.push_str(text);
            self.total_length += incoming;
        }

        while self.buffer.chars().count() > self.limits.chunk_size {
            if self.chunk_count >= self.limits.max_chunks {
                frames.push(self.cap(CapReason::MaxChunks));
                return frames;
            }
            let at = find_breakpoint(&self.buffer);
            let rest = self.buffer.split_off(at);
            let chunk = std::mem::replace(&mut self.buffer, rest);
            frames.push(self.emit(chunk));
        }

        if over_length {
            // flush what still fits under the chunk ceiling, then stop
            if !self.buffer.is_empty() && self.chunk_count < self.limits.max_chunks {
                let rest = std::mem::take(&mut self.buffer);
                frames.push(self.emit(rest));
            }
            frames.push(self.cap(CapReason::MaxLength));
        }
        frames
    }

    fn emit(&mut self, chunk: String) -> StreamFrame {
        self.emitted.push_str(&chunk);
        let frame = ContentFrame {
            content: chunk,
            accumulated: self.emitted.clone(),
            chunk_index: self.chunk_count,
            total_length: self.total_length,
            buffer_remaining: self.buffer.chars().count(),
        };
        self.chunk_count += 1;
        StreamFrame::Content(frame)
    }

    fn cap(&mut self, reason: CapReason) -> StreamFrame {
        self.capped = Some(reason);
        tracing::info!(
            reason = ?reason,
            total_length = self.total_length,
            chunk_count = self.chunk_count,
            "stream capped"
        );
        StreamFrame::Continuation(ContinuationFrame {
            reason,
            message: format!("Output {}; request a continuation for more.", reason),
            total_length: self.emitted_length(),
            chunk_count: self.chunk_count,
        })
    }

    /// A ceiling stopped the stream
    pub fn is_capped(&self) -> bool {
        self.capped.is_some()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    pub fn emitted(&self) -> &str {
        &self.emitted
    }

    fn emitted_length(&self) -> usize {
        self.emitted.chars().count()
    }

    /// Terminal frame for a stream that ended normally or was capped
    pub fn complete(&self, provider: ProviderKind, used_fallback: bool, usage: TokenUsage) -> StreamFrame {
        StreamFrame::Complete(CompleteFrame {
            full_content: self.emitted.clone(),
            total_length: self.emitted_length(),
            chunk_count: self.chunk_count,
            truncated: self.is_capped(),
            provider,
            used_fallback,
            usage,
        })
    }

    /// Terminal frame for a stream that failed midway
    pub fn error(&self, provider: ProviderKind, error: &GatewayError) -> StreamFrame {
        StreamFrame::Error(ErrorFrame {
            message: error.to_string(),
            code: error.error_code().to_string(),
            provider,
            partial_content: self.emitted.clone(),
            total_length: self.total_length,
            chunk_count: self.chunk_count,
        })
    }
}
