//! Vector index over chunk embeddings.

mod flat;
mod traits;

pub use flat::FlatIndex;
pub use traits::VectorIndex;

/// (label, cosine score) pairs sorted by descending score.
#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    pub hits: Vec<(u64, f32)>,
}

impl SearchResult {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}
