use gondola_core::Result;

use crate::{ExtractedText, SourceFile};

/// Trait for document text extractors.
pub trait DocumentParser: Send + Sync {
    /// Extract plain text from a file.
    fn extract(&self, file: &SourceFile) -> Result<ExtractedText>;

    /// Supported file extensions, with leading dot.
    fn supported_extensions(&self) -> Vec<String>;

    /// Check if a file can be parsed.
    fn can_parse(&self, path: &str) -> bool {
        let ext = std::path::Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        let ext_with_dot = format!(".{}", ext);
        self.supported_extensions().contains(&ext_with_dot)
    }
}
