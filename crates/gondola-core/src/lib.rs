//! Shared configuration, errors and records for the Gondola chatbot backend.

pub mod config;
pub mod document;
pub mod error;
pub mod types;

pub use config::{ConfigError, GondolaConfig, MAX_SESSION_AGE_SECS};
pub use document::{DocumentChunk, DocumentType};
pub use error::{GondolaError, Result};
pub use types::{ChatResult, Metadata, RetrievedDocument};
