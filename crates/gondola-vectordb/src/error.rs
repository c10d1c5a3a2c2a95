use thiserror::Error;

#[derive(Error, Debug)]
pub enum VectorDbError {
    #[error("Vector store not found at {0}")]
    StoreNotFound(String),
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("No documents to index")]
    Empty,
    #[error("Embedding error: {0}")]
    Embedding(String),
    #[error("Embedding backend unreachable: {0}")]
    EmbeddingUnavailable(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VectorDbError>;
