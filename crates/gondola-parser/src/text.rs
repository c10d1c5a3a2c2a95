//! Plain text and markdown files.

use gondola_core::{GondolaError, Result};

use crate::{traits::DocumentParser, ExtractedText, SourceFile};

/// Plain text parser: the bytes are the text.
pub struct TextParser;

impl TextParser {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentParser for TextParser {
    fn extract(&self, file: &SourceFile) -> Result<ExtractedText> {
        let text = String::from_utf8(file.bytes.clone()).map_err(|e| GondolaError::InvalidDocument {
            filename: file.filename.clone(),
            reason: format!("not valid UTF-8: {e}"),
        })?;
        if text.trim().is_empty() {
            return Err(GondolaError::InvalidDocument {
                filename: file.filename.clone(),
                reason: "file is empty".into(),
            });
        }
        Ok(ExtractedText {
            filename: file.filename.clone(),
            text,
            num_pages: None,
        })
    }

    fn supported_extensions(&self) -> Vec<String> {
        vec![".txt".into(), ".text".into(), ".md".into()]
    }
}

impl Default for TextParser {
    fn default() -> Self {
        Self::new()
    }
}
