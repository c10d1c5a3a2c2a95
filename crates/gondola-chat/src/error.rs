use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Why a retrieval attempt produced no usable context.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RetrievalFailure {
    #[error("vector store not initialized")]
    NotInitialized,
    #[error("embedding failed: {0}")]
    Embedding(String),
    #[error("similarity search failed: {0}")]
    Search(String),
    #[error("retrieval timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

/// Why a generation call produced no text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationFailure {
    #[error("generation backend unreachable: {0}")]
    Unreachable(String),
    #[error("generation timed out")]
    Timeout,
    #[error("generation backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed generation response: {0}")]
    MalformedBody(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Request input rejected before any backend call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid request: {}", summary(.details))]
pub struct ValidationError {
    pub details: Vec<FieldError>,
}

fn summary(details: &[FieldError]) -> String {
    details
        .iter()
        .map(|d| format!("{}: {}", d.field, d.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            details: vec![FieldError {
                field,
                message: message.into(),
            }],
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChatError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("generation unavailable (primary: {primary}; fallback: {fallback})")]
    GenerationUnavailable {
        primary: GenerationFailure,
        fallback: GenerationFailure,
    },
}

/// Failure of a direct document search; unlike chat, retrieval errors surface.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Retrieval(#[from] RetrievalFailure),
}
