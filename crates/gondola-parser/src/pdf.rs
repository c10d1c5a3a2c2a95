//! PDF text extraction.

use gondola_core::{GondolaError, Result};
use tracing::info;

use crate::{traits::DocumentParser, ExtractedText, SourceFile};

pub struct PdfParser;

impl PdfParser {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentParser for PdfParser {
    fn extract(&self, file: &SourceFile) -> Result<ExtractedText> {
        info!(filename = %file.filename, bytes = file.size(), "extracting text from PDF");
        // the extractor panics on some malformed inputs
        let extracted = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(&file.bytes));
        let (text, num_pages) = match extracted {
            Ok(Ok(pages)) => join_pages(pages),
            Ok(Err(e)) => {
                return Err(GondolaError::InvalidDocument {
                    filename: file.filename.clone(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(GondolaError::InvalidDocument {
                    filename: file.filename.clone(),
                    reason: "PDF could not be decoded".into(),
                })
            }
        };

        if text.trim().is_empty() {
            return Err(GondolaError::InvalidDocument {
                filename: file.filename.clone(),
                reason: "PDF contains no extractable text".into(),
            });
        }

        info!(filename = %file.filename, pages = num_pages, chars = text.len(), "PDF text extracted");
        Ok(ExtractedText {
            filename: file.filename.clone(),
            text,
            num_pages: Some(num_pages),
        })
    }

    fn supported_extensions(&self) -> Vec<String> {
        vec![".pdf".into()]
    }
}

/// Page texts joined by blank lines, plus the page count. Form feeds left by
/// the extractor become paragraph breaks.
pub(crate) fn join_pages(pages: Vec<String>) -> (String, usize) {
    let count = pages.len();
    let text = pages
        .iter()
        .map(|page| page.replace('\u{c}', "\n\n"))
        .collect::<Vec<_>>()
        .join("\n\n");
    (text, count)
}

impl Default for PdfParser {
    fn default() -> Self {
        Self::new()
    }
}
