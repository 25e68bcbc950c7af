//! SSE frames sent to the caller

use crate::types::{ProviderKind, TokenUsage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a stream was capped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapReason {
    MaxChunks,
    MaxLength,
}

impl fmt::Display for CapReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxChunks => write!(f, "chunk limit reached"),
            Self::MaxLength => write!(f, "length limit reached"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedFrame {
    pub provider: ProviderKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_provider: Option<ProviderKind>,
    pub timestamp: DateTime<Utc>,
}

/// First frame when the stream is served by a fallback provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackFrame {
    pub provider: ProviderKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_provider: Option<ProviderKind>,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentFrame {
    pub content: String,
    /// Every content payload emitted so far, this one included
    pub accumulated: String,
    pub chunk_index: usize,
    /// Characters received so far
    pub total_length: usize,
    /// Characters still held in the buffer
    pub buffer_remaining: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinuationFrame {
    pub reason: CapReason,
    pub message: String,
    pub total_length: usize,
    pub chunk_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteFrame {
    pub full_content: String,
    pub total_length: usize,
    pub chunk_count: usize,
    pub truncated: bool,
    pub provider: ProviderKind,
    pub used_fallback: bool,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorFrame {
    pub message: String,
    pub code: String,
    pub provider: ProviderKind,
    /// Content emitted before the failure
    pub partial_content: String,
    pub total_length: usize,
    pub chunk_count: usize,
}

/// One event of the caller-facing stream
///
/// A sequence starts with `connected` or `fallback` and ends with exactly one
/// `complete` or `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamFrame {
    Connected(ConnectedFrame),
    Fallback(FallbackFrame),
    Content(ContentFrame),
    Continuation(ContinuationFrame),
    Complete(CompleteFrame),
    Error(ErrorFrame),
}

impl StreamFrame {
    pub fn connected(provider: ProviderKind, requested_provider: Option<ProviderKind>) -> Self {
        Self::Connected(ConnectedFrame {
            provider,
            requested_provider,
            timestamp: Utc::now(),
        })
    }

    pub fn fallback(
        provider: ProviderKind,
        requested_provider: Option<ProviderKind>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Fallback(FallbackFrame {
            provider,
            requested_provider,
            reason: reason.into(),
            timestamp: Utc::now(),
        })
    }

    /// SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connected",
            Self::Fallback(_) => "fallback",
            Self::Content(_) => "content",
            Self::Continuation(_) => "continuation",
            Self::Complete(_) => "complete",
            Self::Error(_) => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete(_) | Self::Error(_))
    }

    /// The frame's payload without the type tag
    pub fn payload(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Self::Connected(f) => serde_json::to_value(f),
            Self::Fallback(f) => serde_json::to_value(f),
            Self::Content(f) => serde_json::to_value(f),
            Self::Continuation(f) => serde_json::to_value(f),
            Self::Complete(f) => serde_json::to_value(f),
            Self::Error(f) => serde_json::to_value(f),
        }
    }

    /// Wire form: `event: <type>\ndata: <json>\n\n`
    pub fn to_sse(&self) -> serde_json::Result<String> {
        Ok(format!(
            "event: {}\ndata: {}\n\n",
            self.event_type(),
            self.payload()?
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sse_wire_format() {
        let frame = StreamFrame::Content(ContentFrame {
            content: "Hello.".into(),
            accumulated: "Hello.".into(),
            chunk_index: 0,
            total_length: 9,
            buffer_remaining: 3,
        });
        let wire = frame.to_sse().unwrap();
        assert!(wire.starts_with("event: content\ndata: {"));
        assert!(wire.ends_with("}\n\n"));
        assert!(wire.contains("\"chunkIndex\":0"));
        assert!(wire.contains("\"bufferRemaining\":3"));
        assert!(!wire.contains("\"type\""));
    }

    #[test]
    fn test_tagged_json_round_trip() {
        let frame = StreamFrame::fallback(ProviderKind::Gemini, Some(ProviderKind::Claude), "timeout");
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "fallback");
        assert_eq!(json["requestedProvider"], "claude");
        let back: StreamFrame = serde_json::from_value(json).unwrap();
        assert_eq!(back, frame);
    }

    #[test]
    fn test_terminal_frames() {
        assert!(!StreamFrame::connected(ProviderKind::Mock, None).is_terminal());
        let complete = StreamFrame::Complete(CompleteFrame {
            full_content: String::new(),
            total_length: 0,
            chunk_count: 0,
            truncated: false,
            provider: ProviderKind::Mock,
            used_fallback: false,
            usage: TokenUsage::default(),
        });
        assert!(complete.is_terminal());
        assert_eq!(complete.event_type(), "complete");
    }
}
