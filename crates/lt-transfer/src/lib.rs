//! Label transfer: propagate categorical labels from an annotated reference
//! embedding set to an unlabeled query set via k-nearest-neighbor consensus.

pub mod centroid;
pub mod consensus;
pub mod harmonize;
pub mod transfer;

pub use centroid::{CentroidMap, LazyCentroids};
pub use consensus::ConsensusStrategy;
pub use harmonize::CategoryMap;
pub use transfer::{transfer_labels, LabelTransfer, TransferOutcome};

#[cfg(test)]
mod tests;
