pub mod config;
pub mod error;
pub mod types;

pub use config::{TimeUnit, TransferConfig};
pub use error::{Result, TransferError};
pub use types::{EmbeddingMatrix, Label, MatrixView};
