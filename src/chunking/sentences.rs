//! Punctuation-based sentence splitting
//!
//! A split happens after `.`, `!` or `?` whenever whitespace follows. There is
//! no abbreviation or decimal handling: `Dr. Smith` is two sentences.

use regex::Regex;
use std::sync::LazyLock;

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("valid sentence end pattern"));

/// Split normalized text into trimmed, non-empty sentences in document order.
///
/// The terminal punctuation stays with its sentence; the whitespace after it
/// is consumed as the split point.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in SENTENCE_END.find_iter(text) {
        // Punctuation is a single ASCII byte
        push_trimmed(&mut sentences, &text[start..m.start() + 1]);
        start = m.end();
    }
    push_trimmed(&mut sentences, &text[start..]);

    sentences
}

fn push_trimmed<'a>(sentences: &mut Vec<&'a str>, segment: &'a str) {
    let segment = segment.trim();
    if !segment.is_empty() {
        sentences.push(segment);
    }
}
