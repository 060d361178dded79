//! Exact k-nearest-neighbor search over a fixed reference embedding set.
//!
//! Provides the distance metrics, the `VectorIndex` seam that consensus code
//! is written against, and a brute-force `FlatIndex` behind it.

pub mod distance;
pub mod index;

pub use distance::DistanceMetric;
pub use index::{ExecutionBackend, FlatIndex, NeighborResult, VectorIndex};
