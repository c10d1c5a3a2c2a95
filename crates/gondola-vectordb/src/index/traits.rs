use super::SearchResult;
use crate::error::Result;

/// Nearest-neighbour lookup over chunk embeddings, keyed by collection label.
pub trait VectorIndex: Send + Sync {
    /// Add the embedding for `label`. Labels are unique per index.
    fn insert(&self, label: u64, vector: &[f32]) -> Result<()>;

    /// Top-k labels by cosine similarity, best first.
    fn search(&self, query: &[f32], top_k: usize) -> Result<SearchResult>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn dimension(&self) -> usize;
}
