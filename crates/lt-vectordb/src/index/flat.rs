use std::collections::BinaryHeap;
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use lt_core::{EmbeddingMatrix, MatrixView, Result, TransferError};
use crate::distance::DistanceMetric;
use super::{NeighborResult, traits::VectorIndex};

/// Where query rows are scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionBackend {
    /// One row after another on the calling thread.
    #[default]
    Serial,
    /// Rows fanned out over the rayon thread pool.
    Parallel,
}

impl ExecutionBackend {
    pub fn from_accelerator_flag(use_accelerator: bool) -> Self {
        if use_accelerator { Self::Parallel } else { Self::Serial }
    }
}

/// Brute-force (flat) vector index.
/// Exact nearest-neighbor search by scanning all reference vectors.
///
/// Holds its own copy of the reference matrix and is read-only after
/// `build`, so it can be shared freely between threads.
pub struct FlatIndex {
    metric: DistanceMetric,
    backend: ExecutionBackend,
    reference: EmbeddingMatrix,
}

impl FlatIndex {
    pub fn build(reference: EmbeddingMatrix, metric: DistanceMetric) -> Result<Self> {
        Self::build_with_backend(reference, metric, ExecutionBackend::Serial)
    }

    pub fn build_with_backend(
        reference: EmbeddingMatrix,
        metric: DistanceMetric,
        backend: ExecutionBackend,
    ) -> Result<Self> {
        if reference.is_empty() {
            return Err(TransferError::EmptyReference);
        }
        tracing::debug!(
            rows = reference.len(),
            dim = reference.dim(),
            %metric,
            ?backend,
            "built flat index"
        );
        Ok(Self { metric, backend, reference })
    }

    /// Build from per-row vectors; ragged rows fail with `InvalidDimension`.
    pub fn from_rows(rows: Vec<Vec<f32>>, metric: DistanceMetric) -> Result<Self> {
        Self::build(EmbeddingMatrix::from_rows(rows)?, metric)
    }

    pub fn backend(&self) -> ExecutionBackend {
        self.backend
    }

    pub fn reference(&self) -> &EmbeddingMatrix {
        &self.reference
    }

    /// Keep the `k` best `(rank key, position)` pairs in a bounded max-heap.
    /// Equal keys keep the smaller position, so ties resolve in reference order.
    fn top_k(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        let mut heap: BinaryHeap<(OrderedFloat<f32>, usize)> = BinaryHeap::with_capacity(k + 1);
        for (pos, row) in self.reference.rows().enumerate() {
            let key = (OrderedFloat(self.metric.rank_key(self.metric.distance(query, row))), pos);
            if heap.len() < k {
                heap.push(key);
            } else if heap.peek().is_some_and(|worst| key < *worst) {
                heap.pop();
                heap.push(key);
            }
        }
        heap.into_sorted_vec()
            .into_iter()
            .map(|(key, pos)| (pos, self.metric.rank_key(key.0)))
            .collect()
    }
}

impl VectorIndex for FlatIndex {
    fn search(&self, queries: MatrixView<'_>, k: usize) -> Result<NeighborResult> {
        self.check_query(queries, k)?;
        let mut result = NeighborResult::empty(k);

        match self.backend {
            ExecutionBackend::Serial => {
                for query in queries.rows() {
                    result.push_row(&self.top_k(query, k));
                }
            }
            ExecutionBackend::Parallel => {
                let rows: Vec<Vec<(usize, f32)>> = (0..queries.len())
                    .into_par_iter()
                    .map(|q| self.top_k(queries.row(q), k))
                    .collect();
                for hits in &rows {
                    result.push_row(hits);
                }
            }
        }

        Ok(result)
    }

    fn len(&self) -> usize {
        self.reference.len()
    }

    fn dimension(&self) -> usize {
        self.reference.dim()
    }

    fn metric(&self) -> DistanceMetric {
        self.metric
    }
}
