//! Server-sent event framing for provider streams
//!
//! Network reads rarely line up with event boundaries, so bytes are
//! buffered until a blank line closes an event. Multi-byte characters
//! split between reads are carried over by [`Utf8Carry`].

use crate::streaming::Utf8Carry;

/// One event as sent by a provider
#[derive(Debug, Clone, PartialEq)]
pub struct SseEvent {
    /// `event:` field; Anthropic names every event, OpenAI-style APIs never do
    pub name: Option<String>,
    pub data: String,
}

impl SseEvent {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            name: None,
            data: data.into(),
        }
    }

    pub fn named(name: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            data: data.into(),
        }
    }

    /// Terminal sentinel of OpenAI-compatible streams
    pub fn is_done(&self) -> bool {
        self.data.trim() == "[DONE]"
    }
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: String,
    utf8: Utf8Carry,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `bytes` and drain every event they complete
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        let text = self.utf8.decode(bytes);
        self.pending.push_str(&text);

        let mut events = Vec::new();
        while let Some((block_end, separator)) = next_separator(&self.pending) {
            let block: String = self.pending.drain(..block_end + separator).collect();
            if let Some(event) = parse_block(&block[..block_end]) {
                events.push(event);
            }
        }
        events
    }

    /// Flush an event left open when the body ended without a blank line
    pub fn finish(&mut self) -> Option<SseEvent> {
        if let Some(tail) = self.utf8.finish() {
            self.pending.push_str(&tail);
        }
        parse_block(&std::mem::take(&mut self.pending))
    }

    pub fn has_remaining(&self) -> bool {
        self.utf8.pending_len() > 0 || !self.pending.trim().is_empty()
    }
}

/// Position and width of the earliest blank line in `text`
fn next_separator(text: &str) -> Option<(usize, usize)> {
    ["\r\n\r\n", "\n\n"]
        .iter()
        .filter_map(|sep| text.find(sep).map(|at| (at, sep.len())))
        .min_by_key(|(at, _)| *at)
}

fn parse_block(block: &str) -> Option<SseEvent> {
    let mut name = None;
    let mut data: Option<String> = None;

    for line in block.lines() {
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field.trim_start() {
            "event" => name = Some(value.trim().to_string()),
            "data" => match data.as_mut() {
                Some(existing) => {
                    existing.push('\n');
                    existing.push_str(value);
                }
                None => data = Some(value.to_string()),
            },
            // comments (": keep-alive"), id and retry
            _ => {}
        }
    }

    data.map(|data| SseEvent { name, data })
}
