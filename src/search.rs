//! Turning index hits into ranked chunk results
//!
//! The index only knows vector positions; this maps them back to chunk text
//! and applies an optional distance cutoff.

use crate::chunking::Chunk;
use crate::index::Neighbor;
use serde::Serialize;

/// A retrieved chunk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    /// Chunk position in the document
    pub chunk_index: usize,
    pub content: String,
    /// Squared L2 distance to the question embedding (lower is closer)
    pub distance: f32,
}

/// Search result filtering
#[derive(Debug, Clone, Default)]
pub struct SearchEngine {
    /// Hits farther than this are dropped
    pub max_distance: Option<f32>,
}

impl SearchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_distance(max_distance: f32) -> Self {
        Self {
            max_distance: Some(max_distance),
        }
    }

    /// Resolve hits to chunks, keeping index order (closest first)
    pub fn resolve(&self, hits: &[Neighbor], chunks: &[Chunk]) -> Vec<SearchResult> {
        hits.iter()
            .filter(|hit| self.max_distance.map_or(true, |max| hit.distance <= max))
            .filter_map(|hit| {
                let chunk = chunks.get(hit.index)?;
                Some(SearchResult {
                    chunk_index: chunk.index,
                    content: chunk.text.clone(),
                    distance: hit.distance,
                })
            })
            .collect()
    }
}
