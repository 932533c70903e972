//! Exact nearest-neighbor index
//!
//! Brute-force squared-L2 search over every stored vector. A single PDF
//! yields a few hundred chunks at most, so a flat scan is fast enough and
//! returns exact results.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One search hit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Position of the vector in insertion order
    pub index: usize,
    /// Squared Euclidean distance to the query
    pub distance: f32,
}

/// Flat vector index with fixed dimension
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimensions: usize,
    /// Row-major storage, `dimensions` floats per vector
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            data: Vec::new(),
        }
    }

    /// Append vectors; their indices continue from the current length
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        for (i, vector) in vectors.iter().enumerate() {
            if vector.len() != self.dimensions {
                anyhow::bail!(
                    "Vector dimension mismatch at row {}: expected {}, got {}",
                    i,
                    self.dimensions,
                    vector.len()
                );
            }
        }

        self.data.reserve(vectors.len() * self.dimensions);
        for vector in vectors {
            self.data.extend_from_slice(vector);
        }
        Ok(())
    }

    /// The `k` nearest vectors, closest first. Ties go to the lower index.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimensions {
            anyhow::bail!(
                "Query dimension mismatch: expected {}, got {}",
                self.dimensions,
                query.len()
            );
        }
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimensions)
            .enumerate()
            .map(|(index, row)| Neighbor {
                index,
                distance: squared_l2(row, query),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.index.cmp(&b.index))
        });
        hits.truncate(k);
        Ok(hits)
    }

    pub fn len(&self) -> usize {
        if self.dimensions == 0 {
            0
        } else {
            self.data.len() / self.dimensions
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dimension(&self) -> usize {
        self.dimensions
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
