//! Text budgeting helpers: token estimation and UTF-8 safe slicing.
//!
//! Uses a character-based heuristic calibrated for LLM tokenizers:
//! English prose averages ~3.2 chars/token (conservative: overestimate is
//! safer). Used to log the cost of the injected document context.

/// Average characters per token for English prose.
const CHARS_PER_TOKEN: f64 = 3.2;

/// Per-message overhead (role label, formatting tokens).
const MESSAGE_OVERHEAD_TOKENS: u32 = 4;

/// Estimate the token count for a string of natural language text.
pub fn estimate_tokens(text: &str) -> u32 {
    let chars = text.chars().count() as f64;
    (chars / CHARS_PER_TOKEN).ceil() as u32
}

/// Estimate the token count of one message's content including overhead.
pub fn estimate_message_tokens(content: &str) -> u32 {
    MESSAGE_OVERHEAD_TOKENS + estimate_tokens(content)
}

/// Byte offset of the `char_index`-th character (or `s.len()` past the end).
fn byte_offset(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Slice `s` by character positions `[start, end)`. Out-of-range bounds clamp.
pub fn char_slice(s: &str, start: usize, end: usize) -> &str {
    if start >= end {
        return "";
    }
    let from = byte_offset(s, start);
    let to = byte_offset(s, end);
    &s[from..to]
}
