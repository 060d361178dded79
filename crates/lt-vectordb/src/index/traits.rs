use lt_core::{MatrixView, Result, TransferError};
use crate::distance::DistanceMetric;
use super::NeighborResult;

/// Core trait for nearest-neighbor indexes over an immutable reference set.
///
/// Consensus code only sees this trait, so an approximate index can replace
/// the exact one without touching it.
pub trait VectorIndex: Send + Sync {
    /// Return the `k` closest reference rows for every query row,
    /// closest first.
    fn search(&self, queries: MatrixView<'_>, k: usize) -> Result<NeighborResult>;

    /// Number of reference vectors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimension of vectors in this index.
    fn dimension(&self) -> usize;

    fn metric(&self) -> DistanceMetric;

    /// Shared argument checks for `search`.
    fn check_query(&self, queries: MatrixView<'_>, k: usize) -> Result<()> {
        if k == 0 || k > self.len() {
            return Err(TransferError::InvalidK { k, available: self.len() });
        }
        if !queries.is_empty() && queries.dim() != self.dimension() {
            return Err(TransferError::InvalidDimension {
                expected: self.dimension(),
                got: queries.dim(),
            });
        }
        Ok(())
    }
}
