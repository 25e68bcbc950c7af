//! Incremental UTF-8 decoding across read boundaries

/// Carries incomplete UTF-8 sequences from one read to the next
///
/// Invalid sequences in the middle of the input become U+FFFD; a sequence cut
/// off at the end of a read is held back until the following read completes it.
#[derive(Debug, Default)]
pub struct Utf8Carry {
    pending: Vec<u8>,
}

impl Utf8Carry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next read, returning all text that is complete so far
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let input = if self.pending.is_empty() {
            bytes.to_vec()
        } else {
            let mut combined = std::mem::take(&mut self.pending);
            combined.extend_from_slice(bytes);
            combined
        };

        let mut text = String::with_capacity(input.len());
        let mut rest = input.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    text.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            tracing::warn!(invalid_bytes = len, "invalid UTF-8 in stream");
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        text
    }

    /// Flush bytes still held back once the input has ended
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let pending = std::mem::take(&mut self.pending);
        Some(String::from_utf8_lossy(&pending).into_owned())
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_ascii() {
        let mut carry = Utf8Carry::new();
        assert_eq!(carry.decode(b"hello"), "hello");
        assert_eq!(carry.pending_len(), 0);
    }

    #[test]
    fn test_split_multibyte_char() {
        let bytes = "日本".as_bytes();
        let mut carry = Utf8Carry::new();

        assert_eq!(carry.decode(&bytes[..1]), "");
        assert_eq!(carry.pending_len(), 1);
        assert_eq!(carry.decode(&bytes[1..4]), "日");
        assert_eq!(carry.decode(&bytes[4..]), "本");
        assert!(carry.finish().is_none());
    }

    #[test]
    fn test_emoji_split_into_single_bytes() {
        let bytes = "a🦀b".as_bytes();
        let mut carry = Utf8Carry::new();
        let text: String = bytes.iter().map(|b| carry.decode(&[*b])).collect();
        assert_eq!(text, "a🦀b");
    }

    #[test]
    fn test_invalid_byte_replaced() {
        let mut carry = Utf8Carry::new();
        assert_eq!(carry.decode(b"ab\xffcd"), "ab\u{FFFD}cd");
    }

    #[test]
    fn test_truncated_tail_flushed_lossily() {
        let bytes = "é".as_bytes();
        let mut carry = Utf8Carry::new();
        assert_eq!(carry.decode(&bytes[..1]), "");
        assert_eq!(carry.finish().as_deref(), Some("\u{FFFD}"));
    }
}
