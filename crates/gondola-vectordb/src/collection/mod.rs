//! Document collection: chunk text and metadata kept next to an index.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use gondola_core::{DocumentChunk, Metadata, RetrievedDocument};

use crate::error::{Result, VectorDbError};
use crate::index::{FlatIndex, VectorIndex};

const COLLECTION_FILE: &str = "collection.json";

/// Collection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub dimension: usize,
    /// Embedding model the vectors came from; a different query model would
    /// produce meaningless scores.
    #[serde(default)]
    pub embedding_model: String,
}

/// Search hit with the stored chunk.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub label: u64,
    pub score: f32,
    pub content: String,
    pub metadata: Metadata,
}

impl From<SearchHit> for RetrievedDocument {
    fn from(hit: SearchHit) -> Self {
        RetrievedDocument {
            content: hit.content,
            metadata: hit.metadata,
            score: Some(hit.score),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Record {
    label: u64,
    content: String,
    metadata: Metadata,
    vector: Vec<f32>,
}

#[derive(Serialize, Deserialize)]
struct PersistedCollection {
    config: CollectionConfig,
    records: Vec<Record>,
}

/// Chunks and their vectors with index-backed search.
pub struct DocumentCollection {
    config: CollectionConfig,
    records: RwLock<HashMap<u64, Record>>,
    index: FlatIndex,
    next_label: RwLock<u64>,
}

impl DocumentCollection {
    pub fn new(config: CollectionConfig) -> Self {
        let index = FlatIndex::new(config.dimension);
        Self {
            config,
            records: RwLock::new(HashMap::new()),
            index,
            next_label: RwLock::new(1),
        }
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    /// Add a chunk with its embedding. Returns the assigned label.
    pub fn add(&self, chunk: DocumentChunk, vector: Vec<f32>) -> Result<u64> {
        if vector.len() != self.config.dimension {
            return Err(VectorDbError::DimensionMismatch {
                expected: self.config.dimension,
                got: vector.len(),
            });
        }
        let label = {
            let mut next = self.next_label.write();
            let label = *next;
            *next += 1;
            label
        };
        self.index.insert(label, &vector)?;
        self.records.write().insert(
            label,
            Record {
                label,
                content: chunk.page_content,
                metadata: chunk.metadata,
                vector,
            },
        );
        Ok(label)
    }

    /// Top-k chunks closest to the query vector.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        let result = self.index.search(query, top_k)?;
        let records = self.records.read();
        Ok(result
            .hits
            .into_iter()
            .filter_map(|(label, score)| {
                records.get(&label).map(|r| SearchHit {
                    label,
                    score,
                    content: r.content.clone(),
                    metadata: r.metadata.clone(),
                })
            })
            .collect())
    }

    pub fn count(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Write the collection to `dir/collection.json`.
    pub fn persist(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let records = self.records.read();
        let mut list: Vec<Record> = records.values().cloned().collect();
        list.sort_by_key(|r| r.label);
        let persisted = PersistedCollection {
            config: self.config.clone(),
            records: list,
        };
        let bytes = serde_json::to_vec(&persisted)
            .map_err(|e| VectorDbError::Serialization(e.to_string()))?;
        // readers only ever see a complete file
        let tmp = dir.join(format!("{COLLECTION_FILE}.tmp"));
        std::fs::write(&tmp, &bytes)?;
        std::fs::rename(&tmp, dir.join(COLLECTION_FILE))?;
        Ok(())
    }

    /// Load a collection previously written by [`persist`](Self::persist).
    pub fn open(dir: &Path) -> Result<Self> {
        let path = dir.join(COLLECTION_FILE);
        if !path.exists() {
            return Err(VectorDbError::StoreNotFound(dir.display().to_string()));
        }
        let data = std::fs::read(&path)?;
        let persisted: PersistedCollection = serde_json::from_slice(&data)
            .map_err(|e| VectorDbError::Serialization(e.to_string()))?;

        let coll = Self::new(persisted.config);
        let mut max_label = 0u64;
        {
            let mut records = coll.records.write();
            for r in persisted.records {
                coll.index.insert(r.label, &r.vector)?;
                max_label = max_label.max(r.label);
                records.insert(r.label, r);
            }
        }
        *coll.next_label.write() = max_label + 1;
        Ok(coll)
    }

    pub fn exists(dir: &Path) -> bool {
        dir.join(COLLECTION_FILE).exists()
    }
}
