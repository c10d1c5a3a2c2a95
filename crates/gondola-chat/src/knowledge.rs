//! Lifecycle of the document index: load, ingest, reset.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::{self, JoinError};
use tracing::{info, warn};

use gondola_core::GondolaError;
use gondola_parser::{DocumentProcessor, SourceFile};
use gondola_vectordb::{Embedder, VectorDbError, VectorStore};

use crate::retrieval::VectorStoreHandle;

#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error(transparent)]
    Document(#[from] GondolaError),
    #[error(transparent)]
    Store(#[from] VectorDbError),
    #[error("blocking task failed: {0}")]
    Blocking(#[from] JoinError),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSummary {
    pub files_processed: Vec<String>,
    pub documents_created: usize,
    pub vector_store_path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeStatus {
    pub vector_store_exists: bool,
    pub loaded: bool,
    pub indexed_chunks: usize,
    pub vector_store_path: PathBuf,
    pub pdfs_folder: PathBuf,
    pub available_files: Vec<String>,
}

/// Owns the on-disk vector store and keeps the live handle in sync with it.
pub struct KnowledgeBase {
    handle: VectorStoreHandle,
    embedder: Arc<dyn Embedder>,
    processor: Arc<DocumentProcessor>,
    store_path: PathBuf,
    pdfs_folder: PathBuf,
}

impl KnowledgeBase {
    pub fn new(
        handle: VectorStoreHandle,
        embedder: Arc<dyn Embedder>,
        processor: DocumentProcessor,
        store_path: impl Into<PathBuf>,
        pdfs_folder: impl Into<PathBuf>,
    ) -> Self {
        Self {
            handle,
            embedder,
            processor: Arc::new(processor),
            store_path: store_path.into(),
            pdfs_folder: pdfs_folder.into(),
        }
    }

    pub fn handle(&self) -> &VectorStoreHandle {
        &self.handle
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    pub fn processor(&self) -> &DocumentProcessor {
        &self.processor
    }

    /// (Re)load the persisted store into the live handle. Returns whether a
    /// store was found; when none is, the handle is left empty.
    pub async fn load_from_disk(&self) -> Result<bool, KnowledgeError> {
        let path = self.store_path.clone();
        let embedder = self.embedder.clone();
        let loaded = task::spawn_blocking(move || {
            if !VectorStore::exists(&path) {
                return Ok(None);
            }
            VectorStore::load(&path, embedder).map(Some)
        })
        .await??;

        let found = loaded.is_some();
        if !found {
            warn!(path = %self.store_path.display(), "no vector store on disk, retrieval disabled");
        }
        self.handle.replace(loaded.map(Arc::new));
        Ok(found)
    }

    /// Chunk, embed and index `files`, persist the result and make it live.
    /// The new index replaces any previous one.
    ///
    /// Extraction and the disk write run on the blocking pool; only embedding
    /// stays on the async runtime.
    pub async fn ingest(&self, files: Vec<SourceFile>) -> Result<IngestSummary, KnowledgeError> {
        if files.is_empty() {
            return Err(GondolaError::NoDocuments.into());
        }
        let files_processed: Vec<String> = files.iter().map(|f| f.filename.clone()).collect();

        let processor = Arc::clone(&self.processor);
        let chunks = task::spawn_blocking(move || processor.process_files(&files)).await??;
        let documents_created = chunks.len();

        let store = Arc::new(VectorStore::from_chunks(chunks, self.embedder.clone()).await?);
        let path = self.store_path.clone();
        let persisted = Arc::clone(&store);
        task::spawn_blocking(move || persisted.save(&path)).await??;
        self.handle.replace(Some(store));

        info!(files = files_processed.len(), documents_created, "knowledge base rebuilt");
        Ok(IngestSummary {
            files_processed,
            documents_created,
            vector_store_path: self.store_path.clone(),
        })
    }

    /// Index everything in the default documents folder.
    pub async fn setup_default(&self) -> Result<IngestSummary, KnowledgeError> {
        let files = self.processor.load_folder(&self.pdfs_folder).await?;
        self.ingest(files).await
    }

    /// Delete the persisted store and unload it. Returns whether one existed.
    pub async fn reset(&self) -> Result<bool, KnowledgeError> {
        let path = self.store_path.clone();
        let removed = task::spawn_blocking(move || VectorStore::remove(&path)).await??;
        self.handle.replace(None);
        info!(path = %self.store_path.display(), removed, "vector store reset");
        Ok(removed)
    }

    pub async fn status(&self) -> KnowledgeStatus {
        let available_files = match self.processor.list_folder(&self.pdfs_folder).await {
            Ok(files) => files,
            Err(e) => {
                warn!(folder = %self.pdfs_folder.display(), error = %e, "documents folder not readable");
                Vec::new()
            }
        };
        KnowledgeStatus {
            vector_store_exists: VectorStore::exists(&self.store_path),
            loaded: self.handle.is_loaded(),
            indexed_chunks: self.handle.document_count(),
            vector_store_path: self.store_path.clone(),
            pdfs_folder: self.pdfs_folder.clone(),
            available_files,
        }
    }
}
