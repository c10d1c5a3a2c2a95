use parking_lot::RwLock;
use std::cmp::Ordering;

use super::{traits::VectorIndex, SearchResult};
use crate::distance;
use crate::error::{Result, VectorDbError};

/// Exact cosine search by scanning every stored embedding.
///
/// A supermarket knowledge base is a handful of PDFs, a few thousand chunks
/// at most, so a scan stays well under the retrieval timeout.
pub struct FlatIndex {
    dimension: usize,
    entries: RwLock<Vec<(u64, Vec<f32>)>>,
}

impl FlatIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            entries: RwLock::new(Vec::new()),
        }
    }

    fn check_dimension(&self, got: usize) -> Result<()> {
        if got != self.dimension {
            return Err(VectorDbError::DimensionMismatch {
                expected: self.dimension,
                got,
            });
        }
        Ok(())
    }
}

impl VectorIndex for FlatIndex {
    fn insert(&self, label: u64, vector: &[f32]) -> Result<()> {
        self.check_dimension(vector.len())?;
        self.entries.write().push((label, distance::normalized(vector)));
        Ok(())
    }

    fn search(&self, query: &[f32], top_k: usize) -> Result<SearchResult> {
        self.check_dimension(query.len())?;
        let entries = self.entries.read();
        if entries.is_empty() || top_k == 0 {
            return Ok(SearchResult::default());
        }

        let query = distance::normalized(query);
        let mut hits: Vec<(u64, f32)> = entries
            .iter()
            .map(|(label, vec)| (*label, distance::cosine(&query, vec)))
            .collect();
        hits.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        hits.truncate(top_k);
        Ok(SearchResult { hits })
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
