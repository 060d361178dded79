use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    InvalidDimension { expected: usize, got: usize },
    #[error("Reference collection is empty")]
    EmptyReference,
    #[error("Invalid k: {k} (reference holds {available} points)")]
    InvalidK { k: usize, available: usize },
    #[error("Length mismatch: {embeddings} reference embeddings but {labels} labels")]
    LengthMismatch { embeddings: usize, labels: usize },
    #[error("Unknown consensus strategy: {0}")]
    UnknownConsensusStrategy(String),
    #[error("Unknown distance metric: {0}")]
    UnknownMetric(String),
    #[error("Invalid batch size: {0}")]
    InvalidBatchSize(usize),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, TransferError>;
