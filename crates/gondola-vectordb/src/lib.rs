//! Gondola vector store.
//!
//! A flat cosine index over embedded document chunks, the collection that
//! keeps chunk text and metadata next to the vectors, a JSON on-disk format,
//! and the `Embedder` seam with an Ollama implementation.

pub mod collection;
pub mod distance;
pub mod embedder;
pub mod error;
pub mod index;
pub mod store;

pub use collection::{CollectionConfig, DocumentCollection, SearchHit};
pub use embedder::{Embedder, OllamaEmbedder};
pub use error::{Result, VectorDbError};
pub use index::{FlatIndex, VectorIndex};
pub use store::VectorStore;
