//! Overlap carry-over between consecutive chunks
//!
//! When a chunk closes, the tail of it seeds the next chunk so a retrieved
//! chunk keeps some of the context that preceded it. Two policies exist:
//! whole trailing sentences, or a trailing character window sized as a
//! fraction of `chunk_size`.

use serde::{Deserialize, Serialize};

/// Default number of sentences carried into the next chunk
pub const DEFAULT_OVERLAP_SENTENCES: usize = 2;

/// Default fraction of `chunk_size` carried when using the character policy
pub const DEFAULT_OVERLAP_RATIO: f64 = 0.15;

/// What a closed chunk hands to the next one
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum OverlapPolicy {
    /// Carry the last `count` sentences (0 disables overlap)
    SentenceCount { count: usize },
    /// Carry the last `floor(chunk_size * ratio)` characters, not sentence-aligned
    CharRatio { ratio: f64 },
}

impl Default for OverlapPolicy {
    fn default() -> Self {
        Self::SentenceCount {
            count: DEFAULT_OVERLAP_SENTENCES,
        }
    }
}

impl OverlapPolicy {
    /// Display name used in config and CLI output
    pub fn name(&self) -> &'static str {
        match self {
            Self::SentenceCount { .. } => "sentence-count",
            Self::CharRatio { .. } => "char-ratio",
        }
    }

    /// Byte offset in `chunk` where the carried suffix begins.
    ///
    /// `piece_starts` holds the byte offset of every sentence (or carried
    /// fragment) in `chunk`. The suffix never exceeds `budget` characters;
    /// returning `chunk.len()` means nothing is carried.
    pub(crate) fn carry_start(
        &self,
        chunk: &str,
        piece_starts: &[usize],
        chunk_size: usize,
        budget: usize,
    ) -> usize {
        if budget == 0 {
            return chunk.len();
        }

        match *self {
            Self::SentenceCount { count } => {
                let first = piece_starts.len().saturating_sub(count);
                // Oldest sentences go first when the full carry does not fit
                piece_starts[first..]
                    .iter()
                    .copied()
                    .find(|&start| chunk[start..].chars().count() <= budget)
                    .unwrap_or(chunk.len())
            }
            Self::CharRatio { ratio } => {
                let wanted = (chunk_size as f64 * ratio).floor() as usize;
                let take = wanted.min(budget);
                if take == 0 {
                    return chunk.len();
                }
                let start = char_suffix_start(chunk, take);
                let suffix = &chunk[start..];
                start + (suffix.len() - suffix.trim_start().len())
            }
        }
    }
}

/// Byte offset of the last `n` characters of `text` (0 when `text` is shorter).
fn char_suffix_start(text: &str, n: usize) -> usize {
    text.char_indices()
        .rev()
        .nth(n - 1)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    // "One. Two. Three." with piece offsets
    const CHUNK: &str = "One. Two. Three.";
    const STARTS: [usize; 3] = [0, 5, 10];

    #[test]
    fn test_sentence_count_carries_last_sentences() {
        let policy = OverlapPolicy::SentenceCount { count: 2 };
        let start = policy.carry_start(CHUNK, &STARTS, 100, 100);
        assert_eq!(&CHUNK[start..], "Two. Three.");
    }

    #[test]
    fn test_sentence_count_drops_oldest_when_over_budget() {
        let policy = OverlapPolicy::SentenceCount { count: 2 };
        let start = policy.carry_start(CHUNK, &STARTS, 100, 8);
        assert_eq!(&CHUNK[start..], "Three.");
    }

    #[test]
    fn test_sentence_count_nothing_fits() {
        let policy = OverlapPolicy::SentenceCount { count: 2 };
        assert_eq!(policy.carry_start(CHUNK, &STARTS, 100, 3), CHUNK.len());
    }

    #[test]
    fn test_sentence_count_zero_disables_overlap() {
        let policy = OverlapPolicy::SentenceCount { count: 0 };
        assert_eq!(policy.carry_start(CHUNK, &STARTS, 100, 100), CHUNK.len());
    }

    #[test]
    fn test_sentence_count_larger_than_chunk() {
        let policy = OverlapPolicy::SentenceCount { count: 10 };
        assert_eq!(policy.carry_start(CHUNK, &STARTS, 100, 100), 0);
    }

    #[test]
    fn test_char_ratio_takes_suffix() {
        // floor(24 * 0.25) = 6 characters: "Three."
        let policy = OverlapPolicy::CharRatio { ratio: 0.25 };
        let start = policy.carry_start(CHUNK, &STARTS, 24, 100);
        assert_eq!(&CHUNK[start..], "Three.");
    }

    #[test]
    fn test_char_ratio_trims_leading_whitespace() {
        // 7 characters: " Three." -> "Three."
        let policy = OverlapPolicy::CharRatio { ratio: 0.5 };
        let start = policy.carry_start(CHUNK, &STARTS, 14, 100);
        assert_eq!(&CHUNK[start..], "Three.");
    }

    #[test]
    fn test_char_ratio_not_sentence_aligned() {
        let policy = OverlapPolicy::CharRatio { ratio: 0.5 };
        let start = policy.carry_start(CHUNK, &STARTS, 20, 100);
        assert_eq!(&CHUNK[start..], "wo. Three.");
    }

    #[test]
    fn test_char_ratio_clamped_by_budget() {
        let policy = OverlapPolicy::CharRatio { ratio: 0.5 };
        let start = policy.carry_start(CHUNK, &STARTS, 20, 3);
        assert_eq!(&CHUNK[start..], "ee.");
    }

    #[test]
    fn test_char_ratio_zero() {
        let policy = OverlapPolicy::CharRatio { ratio: 0.0 };
        assert_eq!(policy.carry_start(CHUNK, &STARTS, 100, 100), CHUNK.len());
    }

    #[test]
    fn test_char_suffix_respects_char_boundaries() {
        let text = "naïve café";
        let start = char_suffix_start(text, 4);
        assert_eq!(&text[start..], "café");
    }

    #[test]
    fn test_policy_names() {
        assert_eq!(OverlapPolicy::default().name(), "sentence-count");
        assert_eq!(OverlapPolicy::CharRatio { ratio: 0.1 }.name(), "char-ratio");
    }
}
