//! Sentence-based chunking
//!
//! Document text is split into sentences, and sentences are packed greedily
//! into chunks of at most `chunk_size` characters. When a chunk closes, part
//! of its tail is carried into the next one (see [`OverlapPolicy`]).
//!
//! Sentences are never split. A sentence longer than `chunk_size` becomes a
//! chunk of its own, which is the only way a chunk can exceed the bound.

pub mod normalize;
pub mod overlap;
pub mod sentences;

pub use overlap::{OverlapPolicy, DEFAULT_OVERLAP_RATIO, DEFAULT_OVERLAP_SENTENCES};

use crate::error::ChunkError;
use serde::{Deserialize, Serialize};

/// Default target chunk length in characters
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Chunking configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkConfig {
    /// Target maximum chunk length in characters (inclusive)
    pub chunk_size: usize,
    /// How much of a closed chunk is carried into the next
    pub overlap: OverlapPolicy,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: OverlapPolicy::default(),
        }
    }
}

impl ChunkConfig {
    pub fn new(chunk_size: usize, overlap: OverlapPolicy) -> Self {
        Self { chunk_size, overlap }
    }

    /// Reject a zero chunk size and ratios outside `[0, 1)`
    pub fn validate(&self) -> Result<(), ChunkError> {
        if self.chunk_size == 0 {
            return Err(ChunkError::InvalidConfiguration(
                "chunk_size must be greater than zero".to_string(),
            ));
        }

        if let OverlapPolicy::CharRatio { ratio } = self.overlap {
            if !ratio.is_finite() || !(0.0..1.0).contains(&ratio) {
                return Err(ChunkError::InvalidConfiguration(format!(
                    "overlap ratio must be in [0, 1), got {}",
                    ratio
                )));
            }
        }

        Ok(())
    }
}

/// A chunk of document text, the unit of retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position within the document's chunk sequence
    pub index: usize,
    /// Trimmed, non-empty chunk text
    pub text: String,
}

impl Chunk {
    /// Length in characters (the unit `chunk_size` is measured in)
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Greedy sentence packer with overlap
#[derive(Debug, Clone)]
pub struct SentenceChunker {
    config: ChunkConfig,
}

impl SentenceChunker {
    /// Create a chunker, failing with `InvalidConfiguration` on a bad config
    pub fn new(config: ChunkConfig) -> Result<Self, ChunkError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Split already-normalized text into sentences, then chunk them
    pub fn chunk_text(&self, text: &str) -> Vec<Chunk> {
        let sentences = sentences::split_sentences(text);
        self.chunk_sentences(&sentences)
    }

    /// Pack sentences into chunks in a single pass
    pub fn chunk_sentences<S: AsRef<str>>(&self, sentences: &[S]) -> Vec<Chunk> {
        let chunk_size = self.config.chunk_size;
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut current = Accumulator::default();

        for sentence in sentences {
            let sentence = sentence.as_ref().trim();
            if sentence.is_empty() {
                continue;
            }
            let sentence_len = sentence.chars().count();

            if !current.fits(sentence_len, chunk_size) {
                // Room left for the carry once the separator and sentence are in
                let budget = chunk_size.saturating_sub(sentence_len + 1);
                let cut = self
                    .config
                    .overlap
                    .carry_start(&current.text, &current.starts, chunk_size, budget);

                let next = current.carry_from(cut);
                chunks.push(Chunk {
                    index: chunks.len(),
                    text: current.text.trim().to_string(),
                });
                current = next;
            }

            current.push(sentence, sentence_len);
        }

        if !current.text.is_empty() {
            chunks.push(Chunk {
                index: chunks.len(),
                text: current.text.trim().to_string(),
            });
        }

        chunks
    }
}

/// The chunk under construction
#[derive(Debug, Default)]
struct Accumulator {
    text: String,
    /// Length of `text` in characters
    len: usize,
    /// Byte offset of each sentence (or carried fragment) in `text`
    starts: Vec<usize>,
}

impl Accumulator {
    fn fits(&self, sentence_len: usize, chunk_size: usize) -> bool {
        self.text.is_empty() || self.len + 1 + sentence_len <= chunk_size
    }

    fn push(&mut self, sentence: &str, sentence_len: usize) {
        if !self.text.is_empty() {
            self.text.push(' ');
            self.len += 1;
        }
        self.starts.push(self.text.len());
        self.text.push_str(sentence);
        self.len += sentence_len;
    }

    /// A new accumulator seeded with `text[cut..]`
    fn carry_from(&self, cut: usize) -> Self {
        let text = self.text[cut..].to_string();
        if text.is_empty() {
            return Self::default();
        }

        let mut starts: Vec<usize> = self
            .starts
            .iter()
            .filter(|&&start| start >= cut)
            .map(|&start| start - cut)
            .collect();
        // A character carry can begin mid-sentence
        if starts.first() != Some(&0) {
            starts.insert(0, 0);
        }

        Self {
            len: text.chars().count(),
            text,
            starts,
        }
    }
}
