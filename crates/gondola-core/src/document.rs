use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::types::Metadata;

/// Kind of store document, derived from the uploaded file name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Catalog,
    Location,
    StoreInfo,
    General,
}

impl DocumentType {
    /// Classify a document by keywords in its file name.
    pub fn from_filename(filename: &str) -> Self {
        let lower = filename.to_lowercase();
        if lower.contains("catalogo") || lower.contains("producto") {
            Self::Catalog
        } else if lower.contains("ubicacion") || lower.contains("gondola") {
            Self::Location
        } else if lower.contains("sucursal") || lower.contains("local") {
            Self::StoreInfo
        } else {
            Self::General
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::Location => "location",
            Self::StoreInfo => "store_info",
            Self::General => "general",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A piece of an ingested document, ready to be embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub page_content: String,
    pub metadata: Metadata,
}

impl DocumentChunk {
    pub fn new(page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").and_then(Value::as_str)
    }
}
