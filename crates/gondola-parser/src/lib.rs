//! Document ingestion for Gondola: text extraction, chunking, folder loading.

pub mod chunker;
pub mod pdf;
pub mod processor;
pub mod text;
pub mod traits;

pub use chunker::TextChunker;
pub use pdf::PdfParser;
pub use processor::DocumentProcessor;
pub use text::TextParser;
pub use traits::DocumentParser;

/// Raw file handed to the ingestion pipeline (upload or folder entry).
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Text pulled out of a source file.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub filename: String,
    pub text: String,
    pub num_pages: Option<usize>,
}
