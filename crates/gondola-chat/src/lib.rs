//! Hybrid RAG chat pipeline for Gondola.
//!
//! A request flows through [`HybridChatOrchestrator`]: session history is
//! loaded, the vector store is consulted through a [`Retriever`], a prompt
//! is built by [`PromptComposer`] and sent to a [`Generator`]. Retrieval
//! problems degrade the answer instead of failing it; generation problems
//! get one context-free retry.

pub mod diagnostics;
pub mod error;
pub mod generation;
pub mod knowledge;
pub mod orchestrator;
pub mod prompt;
pub mod retrieval;
pub mod validate;

pub use diagnostics::{Components, DiagnosisReport, DiagnosticCheck};
pub use error::{ChatError, FieldError, GenerationFailure, RetrievalFailure, SearchError, ValidationError};
pub use generation::{BackendStatus, Generator, OllamaGenerator};
pub use knowledge::{IngestSummary, KnowledgeBase, KnowledgeError, KnowledgeStatus};
pub use orchestrator::{ChatSettings, HybridChatOrchestrator};
pub use prompt::{PromptComposer, PromptMode};
pub use retrieval::{Retrieval, Retriever, VectorStoreHandle, VectorStoreRetriever};
