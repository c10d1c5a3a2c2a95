//! Embedding-aware vector store: the surface the chat service searches.

use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use gondola_core::{DocumentChunk, RetrievedDocument};

use crate::collection::{CollectionConfig, DocumentCollection};
use crate::embedder::Embedder;
use crate::error::{Result, VectorDbError};

pub struct VectorStore {
    collection: DocumentCollection,
    embedder: Arc<dyn Embedder>,
}

impl VectorStore {
    /// Embed `chunks` and index them in a fresh collection.
    pub async fn from_chunks(chunks: Vec<DocumentChunk>, embedder: Arc<dyn Embedder>) -> Result<Self> {
        if chunks.is_empty() {
            return Err(VectorDbError::Empty);
        }
        let texts: Vec<String> = chunks.iter().map(|c| c.page_content.clone()).collect();
        let vectors = embedder.embed_documents(&texts).await?;
        let dimension = vectors.first().map(Vec::len).unwrap_or(0);
        if dimension == 0 {
            return Err(VectorDbError::Embedding("embedding backend returned empty vectors".into()));
        }

        let collection = DocumentCollection::new(CollectionConfig {
            dimension,
            embedding_model: embedder.model().to_string(),
        });
        for (chunk, vector) in chunks.into_iter().zip(vectors) {
            collection.add(chunk, vector)?;
        }
        info!(documents = collection.count(), dimension, "vector store built");
        Ok(Self { collection, embedder })
    }

    /// Open a store written by [`save`](Self::save).
    pub fn load(dir: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let collection = DocumentCollection::open(dir)?;
        let stored_model = &collection.config().embedding_model;
        if !stored_model.is_empty() && stored_model != embedder.model() {
            warn!(
                stored = %stored_model,
                current = %embedder.model(),
                "vector store was built with a different embedding model"
            );
        }
        info!(path = %dir.display(), documents = collection.count(), "vector store loaded");
        Ok(Self { collection, embedder })
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        self.collection.persist(dir)?;
        info!(path = %dir.display(), documents = self.collection.count(), "vector store saved");
        Ok(())
    }

    pub fn exists(dir: &Path) -> bool {
        DocumentCollection::exists(dir)
    }

    /// Delete a persisted store. Returns whether anything was removed.
    pub fn remove(dir: &Path) -> Result<bool> {
        if !dir.exists() {
            return Ok(false);
        }
        std::fs::remove_dir_all(dir)?;
        Ok(true)
    }

    /// Embed the query and return the `k` closest chunks, best first.
    pub async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<RetrievedDocument>> {
        let vector = self.embedder.embed_query(query).await?;
        let hits = self.collection.search(&vector, k)?;
        Ok(hits.into_iter().map(RetrievedDocument::from).collect())
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub fn collection(&self) -> &DocumentCollection {
        &self.collection
    }

    pub fn count(&self) -> usize {
        self.collection.count()
    }
}
