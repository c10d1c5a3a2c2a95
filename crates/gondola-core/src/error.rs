use thiserror::Error;

#[derive(Error, Debug)]
pub enum GondolaError {
    #[error("Invalid document {filename}: {reason}")]
    InvalidDocument { filename: String, reason: String },
    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),
    #[error("No documents to index")]
    NoDocuments,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, GondolaError>;
