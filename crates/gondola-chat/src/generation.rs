//! Text generation backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::GenerationFailure;

/// Reachability report from [`Generator::probe`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendStatus {
    pub model: String,
    pub version: String,
}

#[async_trait]
pub trait Generator: Send + Sync {
    /// One completion call. No retries.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationFailure>;

    async fn probe(&self) -> Result<BackendStatus, GenerationFailure>;

    fn model(&self) -> &str;
}

/// Completions from an Ollama instance (`POST /api/generate`).
#[derive(Clone)]
pub struct OllamaGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct VersionResponse {
    version: String,
}

fn transport(err: reqwest::Error) -> GenerationFailure {
    if err.is_timeout() {
        GenerationFailure::Timeout
    } else if err.is_decode() {
        GenerationFailure::MalformedBody(err.to_string())
    } else {
        GenerationFailure::Unreachable(err.to_string())
    }
}

impl OllamaGenerator {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self, GenerationFailure> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationFailure::Unreachable(format!("http client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, GenerationFailure> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(GenerationFailure::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationFailure> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };
        debug!(model = %self.model, prompt_chars = prompt.chars().count(), "sending prompt");
        let resp = self.client.post(&url).json(&request).send().await.map_err(transport)?;
        let body: GenerateResponse = Self::check_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| GenerationFailure::MalformedBody(e.to_string()))?;
        Ok(body.response)
    }

    async fn probe(&self) -> Result<BackendStatus, GenerationFailure> {
        let url = format!("{}/api/version", self.base_url);
        let resp = self.client.get(&url).send().await.map_err(transport)?;
        let body: VersionResponse = Self::check_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| GenerationFailure::MalformedBody(e.to_string()))?;
        Ok(BackendStatus {
            model: self.model.clone(),
            version: body.version,
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}
