//! Vector index implementations and the neighbor result they produce.

mod flat;
mod traits;

pub use flat::{ExecutionBackend, FlatIndex};
pub use traits::VectorIndex;

use lt_core::{Result, TransferError};

/// Q x K neighbor table for one query batch.
///
/// Row `q` lists reference positions closest-first together with the raw
/// metric value for each (squared distance for L2, dot product for IP).
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborResult {
    k: usize,
    indices: Vec<usize>,
    distances: Vec<f32>,
}

impl NeighborResult {
    pub fn empty(k: usize) -> Self {
        Self { k, indices: vec![], distances: vec![] }
    }

    /// Build from per-query rows. Every row must have the same length, and
    /// `indices` and `distances` must have the same shape.
    pub fn from_rows(indices: Vec<Vec<usize>>, distances: Vec<Vec<f32>>) -> Result<Self> {
        if indices.len() != distances.len() {
            return Err(TransferError::InvalidDimension {
                expected: indices.len(),
                got: distances.len(),
            });
        }
        let k = indices.first().map(|r| r.len()).unwrap_or(0);
        let mut out = Self {
            k,
            indices: Vec::with_capacity(k * indices.len()),
            distances: Vec::with_capacity(k * indices.len()),
        };
        for (ind, dist) in indices.into_iter().zip(distances) {
            if ind.len() != k {
                return Err(TransferError::InvalidDimension { expected: k, got: ind.len() });
            }
            if dist.len() != k {
                return Err(TransferError::InvalidDimension { expected: k, got: dist.len() });
            }
            out.indices.extend(ind);
            out.distances.extend(dist);
        }
        Ok(out)
    }

    pub(crate) fn push_row(&mut self, hits: &[(usize, f32)]) {
        debug_assert_eq!(hits.len(), self.k);
        self.indices.extend(hits.iter().map(|h| h.0));
        self.distances.extend(hits.iter().map(|h| h.1));
    }

    /// Neighbors requested per query.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of query rows.
    pub fn len(&self) -> usize {
        if self.k == 0 { 0 } else { self.indices.len() / self.k }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self, q: usize) -> &[usize] {
        &self.indices[q * self.k..(q + 1) * self.k]
    }

    pub fn distances(&self, q: usize) -> &[f32] {
        &self.distances[q * self.k..(q + 1) * self.k]
    }

    /// `(reference position, value)` pairs for query `q`, closest first.
    pub fn row(&self, q: usize) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.indices(q).iter().copied().zip(self.distances(q).iter().copied())
    }

    /// Reference position of the closest neighbor of query `q`.
    pub fn nearest(&self, q: usize) -> Option<usize> {
        self.indices(q).first().copied()
    }
}
