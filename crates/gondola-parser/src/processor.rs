//! Ingestion pipeline: files in, metadata-tagged chunks out.

use chrono::Utc;
use std::path::Path;
use tracing::{info, warn};

use gondola_core::{DocumentChunk, DocumentType, GondolaError, Metadata, Result};

use crate::{chunker::TextChunker, pdf::PdfParser, text::TextParser, traits::DocumentParser, SourceFile};

pub struct DocumentProcessor {
    chunker: TextChunker,
    parsers: Vec<Box<dyn DocumentParser>>,
}

impl DocumentProcessor {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        Ok(Self {
            chunker: TextChunker::new(chunk_size, chunk_overlap)?,
            parsers: vec![Box::new(PdfParser::new()), Box::new(TextParser::new())],
        })
    }

    pub fn chunker(&self) -> &TextChunker {
        &self.chunker
    }

    pub fn can_parse(&self, filename: &str) -> bool {
        self.parsers.iter().any(|p| p.can_parse(filename))
    }

    /// Extract, classify and chunk one file.
    pub fn process_file(&self, file: &SourceFile) -> Result<Vec<DocumentChunk>> {
        let parser = self
            .parsers
            .iter()
            .find(|p| p.can_parse(&file.filename))
            .ok_or_else(|| GondolaError::UnsupportedFile(file.filename.clone()))?;

        let extracted = parser.extract(file)?;
        let doc_type = DocumentType::from_filename(&file.filename);

        let mut base = Metadata::new();
        base.insert("source".into(), file.filename.clone().into());
        base.insert("type".into(), doc_type.as_str().into());
        if let Some(pages) = extracted.num_pages {
            base.insert("numPages".into(), pages.into());
        }
        base.insert("processedAt".into(), Utc::now().to_rfc3339().into());

        let chunks = self.chunker.chunk_with_metadata(&extracted.text, &base);
        info!(filename = %file.filename, doc_type = %doc_type, chunks = chunks.len(), "document chunked");
        Ok(chunks)
    }

    /// Process a batch; the first failing file aborts the batch.
    pub fn process_files(&self, files: &[SourceFile]) -> Result<Vec<DocumentChunk>> {
        info!(files = files.len(), "processing documents");
        let mut all = Vec::new();
        for file in files {
            all.extend(self.process_file(file)?);
        }
        info!(chunks = all.len(), "documents processed");
        Ok(all)
    }

    /// Read every parseable file in `folder`. A missing folder yields nothing.
    pub async fn load_folder(&self, folder: &Path) -> Result<Vec<SourceFile>> {
        let names = match self.list_folder(folder).await {
            Ok(names) => names,
            Err(GondolaError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(folder = %folder.display(), "documents folder not found");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let mut files = Vec::with_capacity(names.len());
        for name in names {
            let bytes = tokio::fs::read(folder.join(&name)).await?;
            files.push(SourceFile::new(name, bytes));
        }
        if files.is_empty() {
            warn!(folder = %folder.display(), "no documents found in folder");
        } else {
            info!(count = files.len(), folder = %folder.display(), "loaded default documents");
        }
        Ok(files)
    }

    /// Parseable file names in `folder`, sorted.
    pub async fn list_folder(&self, folder: &Path) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(folder).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if self.can_parse(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}
