//! Grapheme cluster iteration, kept separate from the byte-indexed motion
//! primitives in `lib.rs`: UTF-8 continuation skipping is what the engine
//! relies on for correctness, grapheme boundaries are a display nicety for
//! callers that want to avoid splitting multi-codepoint clusters.

use unicode_segmentation::UnicodeSegmentation;

/// Iterate grapheme clusters in a line.
pub fn iter(line: &str) -> impl Iterator<Item = &str> {
    line.graphemes(true)
}

/// Previous grapheme boundary (returns 0 if already at or below the first boundary).
pub fn prev_boundary(line: &str, byte: usize) -> usize {
    if byte == 0 || byte > line.len() {
        return 0;
    }
    let mut last = 0;
    for (idx, _) in line.grapheme_indices(true) {
        if idx >= byte {
            break;
        }
        last = idx;
    }
    last
}

/// Next grapheme boundary (returns `line.len()` if at or beyond the end).
pub fn next_boundary(line: &str, byte: usize) -> usize {
    if byte >= line.len() {
        return line.len();
    }
    for (idx, _) in line.grapheme_indices(true) {
        if idx > byte {
            return idx;
        }
    }
    line.len()
}

/// Naive word classification: alphanumeric or underscore start.
pub fn is_word(g: &str) -> bool {
    g.chars().next().map(|c| c == '_' || c.is_alphanumeric()).unwrap_or(false)
}
