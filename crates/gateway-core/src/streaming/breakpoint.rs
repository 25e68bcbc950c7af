//! Where to cut an over-long buffer

/// Preferred split points, best first, with the width of the marker kept in
/// the emitted chunk
const BREAKPOINTS: [&str; 5] = ["\n\n", ". ", "!", "?", "\n"];

/// Share of the buffer emitted when no breakpoint exists
const FALLBACK_RATIO: f64 = 0.8;

/// Byte index splitting `buffer` into (chunk, remainder)
///
/// Picks the last occurrence of the highest-priority marker, splitting just
/// after it. Without any marker, cuts at 80% of the buffer's characters. The
/// chunk is never empty for a non-empty buffer, and the cut always lands on a
/// character boundary.
pub fn find_breakpoint(buffer: &str) -> usize {
    if buffer.is_empty() {
        return 0;
    }
    for marker in BREAKPOINTS {
        if let Some(pos) = buffer.rfind(marker) {
            return pos + marker.len();
        }
    }

    let chars = buffer.chars().count();
    let keep = ((chars as f64 * FALLBACK_RATIO) as usize).clamp(1, chars);
    buffer
        .char_indices()
        .nth(keep)
        .map_or(buffer.len(), |(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(buffer: &str) -> (&str, &str) {
        buffer.split_at(find_breakpoint(buffer))
    }

    #[test]
    fn test_paragraph_break_wins() {
        let (chunk, rest) = split("First. Second!\n\nThird. Fourth");
        assert_eq!(chunk, "First. Second!\n\n");
        assert_eq!(rest, "Third. Fourth");
    }

    #[test]
    fn test_sentence_end_before_exclamation() {
        let (chunk, rest) = split("Wow! That was it. And then");
        assert_eq!(chunk, "Wow! That was it. ");
        assert_eq!(rest, "And then");
    }

    #[test]
    fn test_question_and_line_break() {
        assert_eq!(split("Why? Because"), ("Why?", " Because"));
        assert_eq!(split("line one\nline two"), ("line one\n", "line two"));
    }

    #[test]
    fn test_eighty_percent_fallback() {
        let (chunk, rest) = split("abcdefghij");
        assert_eq!(chunk, "abcdefgh");
        assert_eq!(rest, "ij");
    }

    #[test]
    fn test_short_buffers_never_yield_empty_chunk() {
        assert_eq!(split("a"), ("a", ""));
        assert_eq!(split("ab"), ("a", "b"));
        assert_eq!(split("abc"), ("ab", "c"));
        assert_eq!(find_breakpoint(""), 0);
    }

    #[test]
    fn test_fallback_respects_char_boundaries() {
        let (chunk, rest) = split("ééééé");
        assert_eq!(chunk, "éééé");
        assert_eq!(rest, "é");
    }
}
