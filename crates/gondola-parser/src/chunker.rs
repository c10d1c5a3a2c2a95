//! Recursive character splitting with overlap.

use gondola_core::{DocumentChunk, GondolaError, Metadata, Result};
use text_splitter::{Characters, ChunkConfig, TextSplitter};

/// Splits extracted text into overlapping chunks sized in characters.
///
/// The splitter prefers the largest semantic boundary that fits: paragraphs,
/// then lines, sentences, words, and finally graphemes.
pub struct TextChunker {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    splitter: TextSplitter<Characters>,
}

impl TextChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        let config = ChunkConfig::new(chunk_size)
            .with_overlap(chunk_overlap)
            .map_err(|e| GondolaError::Other(anyhow::anyhow!("invalid chunk configuration: {e}")))?;
        Ok(Self {
            chunk_size,
            chunk_overlap,
            splitter: TextSplitter::new(config),
        })
    }

    /// Raw chunk strings, in document order.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.splitter
            .chunks(text)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Chunks carrying `base` metadata plus `chunkIndex` and `chunkSize`.
    pub fn chunk_with_metadata(&self, text: &str, base: &Metadata) -> Vec<DocumentChunk> {
        self.split(text)
            .into_iter()
            .enumerate()
            .map(|(index, chunk)| {
                let size = chunk.chars().count();
                let mut metadata = base.clone();
                metadata.insert("chunkIndex".into(), index.into());
                metadata.insert("chunkSize".into(), size.into());
                DocumentChunk {
                    page_content: chunk,
                    metadata,
                }
            })
            .collect()
    }
}
