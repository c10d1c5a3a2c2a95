//! Similarity search as seen by the chat pipeline.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use gondola_core::RetrievedDocument;
use gondola_vectordb::{Embedder, VectorDbError, VectorStore};

use crate::error::RetrievalFailure;

/// Successful retrieval outcome. Zero matches is not a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Retrieval {
    Documents(Vec<RetrievedDocument>),
    NoMatches,
}

impl Retrieval {
    pub fn into_documents(self) -> Vec<RetrievedDocument> {
        match self {
            Retrieval::Documents(docs) => docs,
            Retrieval::NoMatches => Vec::new(),
        }
    }
}

#[async_trait]
pub trait Retriever: Send + Sync {
    /// The `k` most relevant snippets for `query`.
    async fn retrieve(&self, query: &str, k: usize) -> Result<Retrieval, RetrievalFailure>;

    /// Embed a fixed probe string; returns the vector dimension.
    async fn embedding_probe(&self) -> Result<usize, RetrievalFailure>;

    /// Whether a vector store is loaded.
    fn is_ready(&self) -> bool;
}

/// Shared slot holding the live vector store.
///
/// Replacing the store never blocks searches already running on the old one:
/// readers clone the inner `Arc` and release the lock before searching.
#[derive(Clone, Default)]
pub struct VectorStoreHandle {
    inner: Arc<RwLock<Option<Arc<VectorStore>>>>,
}

impl VectorStoreHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Arc<VectorStore>> {
        self.inner.read().clone()
    }

    /// Swap in a new store (or `None` to unload), returning the previous one.
    pub fn replace(&self, store: Option<Arc<VectorStore>>) -> Option<Arc<VectorStore>> {
        std::mem::replace(&mut *self.inner.write(), store)
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.read().is_some()
    }

    pub fn document_count(&self) -> usize {
        self.inner.read().as_ref().map(|s| s.count()).unwrap_or(0)
    }
}

fn classify(err: VectorDbError) -> RetrievalFailure {
    match err {
        VectorDbError::Embedding(msg) | VectorDbError::EmbeddingUnavailable(msg) => {
            RetrievalFailure::Embedding(msg)
        }
        other => RetrievalFailure::Search(other.to_string()),
    }
}

/// [`Retriever`] over the live [`VectorStoreHandle`], bounded by a timeout.
pub struct VectorStoreRetriever {
    handle: VectorStoreHandle,
    embedder: Arc<dyn Embedder>,
    timeout: Duration,
}

impl VectorStoreRetriever {
    pub fn new(handle: VectorStoreHandle, embedder: Arc<dyn Embedder>, timeout: Duration) -> Self {
        Self {
            handle,
            embedder,
            timeout,
        }
    }
}

#[async_trait]
impl Retriever for VectorStoreRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Retrieval, RetrievalFailure> {
        let store = self.handle.get().ok_or(RetrievalFailure::NotInitialized)?;
        let docs = tokio::time::timeout(self.timeout, store.similarity_search(query, k))
            .await
            .map_err(|_| RetrievalFailure::Timeout(self.timeout))?
            .map_err(classify)?;

        debug!(k, found = docs.len(), "similarity search finished");
        if docs.is_empty() {
            Ok(Retrieval::NoMatches)
        } else {
            Ok(Retrieval::Documents(docs))
        }
    }

    async fn embedding_probe(&self) -> Result<usize, RetrievalFailure> {
        let vector = tokio::time::timeout(self.timeout, self.embedder.embed_query("test query"))
            .await
            .map_err(|_| RetrievalFailure::Timeout(self.timeout))?
            .map_err(classify)?;
        Ok(vector.len())
    }

    fn is_ready(&self) -> bool {
        self.handle.is_loaded()
    }
}
