//! Per-label centroids and nearest-centroid assignment.

use std::collections::BTreeMap;
use std::sync::Arc;
use parking_lot::Mutex;

use lt_core::{EmbeddingMatrix, Label, MatrixView, Result, TransferError};
use lt_vectordb::distance;

/// Componentwise mean of the reference embeddings carrying each label.
///
/// Keyed by label in sorted order, which is also the tie-break order when
/// two centroids are equally close to a query.
#[derive(Debug, Clone, PartialEq)]
pub struct CentroidMap {
    dim: usize,
    centroids: BTreeMap<Label, Vec<f32>>,
}

impl CentroidMap {
    pub fn compute(reference: &EmbeddingMatrix, labels: &[Label]) -> Result<Self> {
        if reference.len() != labels.len() {
            return Err(TransferError::LengthMismatch {
                embeddings: reference.len(),
                labels: labels.len(),
            });
        }
        if reference.is_empty() {
            return Err(TransferError::EmptyReference);
        }

        let dim = reference.dim();
        // Accumulate in f64 so large label groups don't lose precision.
        let mut sums: BTreeMap<&Label, (Vec<f64>, usize)> = BTreeMap::new();
        for (row, label) in reference.rows().zip(labels) {
            let (sum, count) = sums.entry(label).or_insert_with(|| (vec![0.0; dim], 0));
            for (acc, &x) in sum.iter_mut().zip(row) {
                *acc += x as f64;
            }
            *count += 1;
        }

        let centroids = sums
            .into_iter()
            .map(|(label, (sum, count))| {
                let n = count as f64;
                (label.clone(), sum.into_iter().map(|x| (x / n) as f32).collect())
            })
            .collect::<BTreeMap<_, _>>();

        tracing::debug!(labels = centroids.len(), dim, "computed label centroids");
        Ok(Self { dim, centroids })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.centroids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }

    pub fn get(&self, label: &Label) -> Option<&[f32]> {
        self.centroids.get(label).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Label, &[f32])> {
        self.centroids.iter().map(|(l, c)| (l, c.as_slice()))
    }

    /// Label whose centroid has the smallest Euclidean distance to `query`.
    pub fn nearest(&self, query: &[f32]) -> Result<&Label> {
        if query.len() != self.dim {
            return Err(TransferError::InvalidDimension { expected: self.dim, got: query.len() });
        }
        let mut best: Option<(&Label, f32)> = None;
        for (label, centroid) in &self.centroids {
            let d = distance::euclidean(query, centroid);
            let better = match best {
                Some((_, top)) => d < top,
                None => true,
            };
            if better {
                best = Some((label, d));
            }
        }
        best.map(|(label, _)| label).ok_or(TransferError::EmptyReference)
    }

    /// Nearest-centroid label for every row of `queries`, in order.
    pub fn assign(&self, queries: MatrixView<'_>) -> Result<Vec<Label>> {
        queries.rows().map(|row| self.nearest(row).cloned()).collect()
    }
}

/// Centroid map built on first use and shared for the rest of a run.
///
/// The mutex makes the first build exclusive, so concurrent callers never
/// compute it twice.
pub struct LazyCentroids<'a> {
    reference: &'a EmbeddingMatrix,
    labels: &'a [Label],
    cell: Mutex<Option<Arc<CentroidMap>>>,
}

impl<'a> LazyCentroids<'a> {
    pub fn new(reference: &'a EmbeddingMatrix, labels: &'a [Label]) -> Self {
        Self { reference, labels, cell: Mutex::new(None) }
    }

    pub fn get(&self) -> Result<Arc<CentroidMap>> {
        let mut cell = self.cell.lock();
        if let Some(map) = cell.as_ref() {
            return Ok(Arc::clone(map));
        }
        let map = Arc::new(CentroidMap::compute(self.reference, self.labels)?);
        *cell = Some(Arc::clone(&map));
        Ok(map)
    }

    pub fn is_built(&self) -> bool {
        self.cell.lock().is_some()
    }
}
