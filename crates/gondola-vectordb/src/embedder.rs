//! Text embedding backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Result, VectorDbError};

/// Turns text into dense vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single query string.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_documents(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| VectorDbError::Embedding("empty embedding response".into()))
    }

    /// Embed a batch; output order matches input order.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Model identifier recorded alongside stored vectors.
    fn model(&self) -> &str;
}

const EMBED_BATCH: usize = 32;

/// Embeddings served by an Ollama instance (`POST /api/embed`).
#[derive(Clone)]
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VectorDbError::Embedding(format!("http client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    async fn request(&self, input: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/api/embed", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&EmbedRequest { model: &self.model, input })
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    VectorDbError::EmbeddingUnavailable(e.to_string())
                } else {
                    VectorDbError::Embedding(format!("Ollama HTTP error: {e}"))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(%status, model = %self.model, "embedding request rejected");
            return Err(VectorDbError::Embedding(format!("Ollama returned {status}: {body}")));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| VectorDbError::Embedding(format!("Ollama JSON parse error: {e}")))?;

        if parsed.embeddings.len() != input.len() {
            return Err(VectorDbError::Embedding(format!(
                "expected {} embeddings, got {}",
                input.len(),
                parsed.embeddings.len()
            )));
        }
        Ok(parsed.embeddings)
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBED_BATCH) {
            out.extend(self.request(batch).await?);
        }
        debug!(count = out.len(), model = %self.model, "embedded texts");
        Ok(out)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
