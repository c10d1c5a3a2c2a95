use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Longest accepted session idle lifetime (one week).
pub const MAX_SESSION_AGE_SECS: u64 = 7 * 24 * 60 * 60;

/// Headroom over the chat worst case before the HTTP layer gives up.
const REQUEST_TIMEOUT_SLACK: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GondolaConfig {
    pub server: ServerConfig,
    pub ollama: OllamaConfig,
    pub storage: StorageConfig,
    pub chunking: ChunkingConfig,
    pub session: SessionConfig,
    pub retrieval: RetrievalConfig,
    /// Brand name used in prompts.
    pub store_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub embedding_model: String,
    pub temperature: f32,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub vector_store_path: PathBuf,
    pub pdfs_folder: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub max_age_secs: u64,
    pub max_turns: usize,
    pub context_turns: usize,
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Documents pulled into a chat prompt.
    pub chat_top_k: usize,
    /// Default result count for the search endpoint.
    pub search_top_k: usize,
    pub max_top_k: usize,
    pub timeout_ms: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid integer in env var {key}: {value}")]
    ParseInt { key: String, value: String },
    #[error("invalid number in env var {key}: {value}")]
    ParseFloat { key: String, value: String },
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl Default for GondolaConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".into(),
                port: 3001,
                cors_origins: vec![
                    "http://localhost:3000".into(),
                    "http://localhost:5173".into(),
                    "http://localhost:8080".into(),
                ],
                environment: "development".into(),
            },
            ollama: OllamaConfig {
                base_url: "http://127.0.0.1:11434".into(),
                model: "llama3.2:1b".into(),
                embedding_model: "nomic-embed-text".into(),
                temperature: 0.7,
                timeout_ms: 60_000,
            },
            storage: StorageConfig {
                vector_store_path: PathBuf::from("./data/vector-store"),
                pdfs_folder: PathBuf::from("./data/pdfs"),
            },
            chunking: ChunkingConfig {
                chunk_size: 1000,
                chunk_overlap: 200,
            },
            session: SessionConfig {
                max_age_secs: 30 * 60,
                max_turns: 20,
                context_turns: 10,
                sweep_interval_secs: 5 * 60,
            },
            retrieval: RetrievalConfig {
                chat_top_k: 3,
                search_top_k: 5,
                max_top_k: 20,
                timeout_ms: 15_000,
            },
            store_name: "Tienda Alemana".into(),
        }
    }
}

impl GondolaConfig {
    /// Build the configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let d = Self::default();

        let base_url = optional_trimmed_env("OLLAMA_BASE_URL").unwrap_or(d.ollama.base_url);
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidConfiguration(
                "OLLAMA_BASE_URL must start with http:// or https://".into(),
            ));
        }

        let chunking = ChunkingConfig {
            chunk_size: parse_env("CHUNK_SIZE", d.chunking.chunk_size)?,
            chunk_overlap: parse_env("CHUNK_OVERLAP", d.chunking.chunk_overlap)?,
        };
        if chunking.chunk_size == 0 || chunking.chunk_overlap >= chunking.chunk_size {
            return Err(ConfigError::InvalidConfiguration(format!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                chunking.chunk_overlap, chunking.chunk_size
            )));
        }

        let session = SessionConfig {
            max_age_secs: parse_env("SESSION_MAX_AGE_SECS", d.session.max_age_secs)?,
            max_turns: parse_env("SESSION_MAX_TURNS", d.session.max_turns)?,
            context_turns: parse_env("SESSION_CONTEXT_TURNS", d.session.context_turns)?,
            sweep_interval_secs: parse_env("SESSION_SWEEP_INTERVAL_SECS", d.session.sweep_interval_secs)?,
        };
        if session.max_age_secs > MAX_SESSION_AGE_SECS {
            return Err(ConfigError::InvalidConfiguration(format!(
                "SESSION_MAX_AGE_SECS ({}) must not exceed {MAX_SESSION_AGE_SECS}",
                session.max_age_secs
            )));
        }
        if session.max_turns == 0 || session.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidConfiguration(
                "SESSION_MAX_TURNS and SESSION_SWEEP_INTERVAL_SECS must be positive".into(),
            ));
        }

        Ok(Self {
            server: ServerConfig {
                host: optional_trimmed_env("HOST").unwrap_or(d.server.host),
                port: parse_env("PORT", d.server.port)?,
                cors_origins: parse_list_env("CORS_ORIGINS", d.server.cors_origins),
                environment: optional_trimmed_env("APP_ENV").unwrap_or(d.server.environment),
            },
            ollama: OllamaConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                model: optional_trimmed_env("OLLAMA_MODEL").unwrap_or(d.ollama.model),
                embedding_model: optional_trimmed_env("OLLAMA_EMBEDDING_MODEL")
                    .unwrap_or(d.ollama.embedding_model),
                temperature: parse_f32_env("OLLAMA_TEMPERATURE", d.ollama.temperature)?,
                timeout_ms: parse_env("OLLAMA_TIMEOUT_MS", d.ollama.timeout_ms)?,
            },
            storage: StorageConfig {
                vector_store_path: optional_trimmed_env("VECTOR_STORE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(d.storage.vector_store_path),
                pdfs_folder: optional_trimmed_env("PDFS_FOLDER")
                    .map(PathBuf::from)
                    .unwrap_or(d.storage.pdfs_folder),
            },
            chunking,
            session,
            retrieval: RetrievalConfig {
                timeout_ms: parse_env("RETRIEVAL_TIMEOUT_MS", d.retrieval.timeout_ms)?,
                ..d.retrieval
            },
            store_name: optional_trimmed_env("STORE_NAME").unwrap_or(d.store_name),
        })
    }

    /// Whole-request deadline. A chat may spend the retrieval timeout plus two
    /// generation attempts (primary and bare retry) before it answers, so the
    /// deadline sits above that sum.
    pub fn request_timeout(&self) -> Duration {
        let generation = Duration::from_millis(self.ollama.timeout_ms);
        Duration::from_millis(self.retrieval.timeout_ms)
            .saturating_add(generation.saturating_mul(2))
            .saturating_add(REQUEST_TIMEOUT_SLACK)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match optional_trimmed_env(key) {
        Some(raw) => raw.parse::<T>().map_err(|_| ConfigError::ParseInt {
            key: key.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}

fn parse_f32_env(key: &str, default: f32) -> Result<f32, ConfigError> {
    match optional_trimmed_env(key) {
        Some(raw) => raw.parse::<f32>().map_err(|_| ConfigError::ParseFloat {
            key: key.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}

fn parse_list_env(key: &str, default: Vec<String>) -> Vec<String> {
    match optional_trimmed_env(key) {
        Some(raw) => {
            let parsed: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(ToString::to_string)
                .collect();
            if parsed.is_empty() {
                default
            } else {
                parsed
            }
        }
        None => default,
    }
}

fn optional_trimmed_env(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
