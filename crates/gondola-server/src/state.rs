//! Application state shared across all handlers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use gondola_chat::{
    ChatSettings, HybridChatOrchestrator, KnowledgeBase, OllamaGenerator, PromptComposer, VectorStoreHandle,
    VectorStoreRetriever,
};
use gondola_core::GondolaConfig;
use gondola_parser::DocumentProcessor;
use gondola_session::{SessionStore, SessionStoreConfig};
use gondola_vectordb::{Embedder, OllamaEmbedder};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GondolaConfig>,
    pub chat: Arc<HybridChatOrchestrator>,
    pub knowledge: Arc<KnowledgeBase>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: GondolaConfig, chat: HybridChatOrchestrator, knowledge: KnowledgeBase) -> Self {
        Self {
            config: Arc::new(config),
            chat: Arc::new(chat),
            knowledge: Arc::new(knowledge),
            start_time: Instant::now(),
        }
    }

    /// Wire the Ollama-backed pipeline described by `config`. Nothing is
    /// contacted or loaded here.
    pub fn from_config(config: GondolaConfig) -> anyhow::Result<Self> {
        let timeout = Duration::from_millis(config.ollama.timeout_ms);
        let embedder: Arc<dyn Embedder> = Arc::new(OllamaEmbedder::new(
            &config.ollama.base_url,
            &config.ollama.embedding_model,
            timeout,
        )?);
        let generator = OllamaGenerator::new(
            &config.ollama.base_url,
            &config.ollama.model,
            config.ollama.temperature,
            timeout,
        )?;

        let handle = VectorStoreHandle::new();
        let retriever = VectorStoreRetriever::new(
            handle.clone(),
            embedder.clone(),
            Duration::from_millis(config.retrieval.timeout_ms),
        );
        let sessions = SessionStore::new(SessionStoreConfig {
            max_age: chrono::Duration::from_std(Duration::from_secs(config.session.max_age_secs))?,
            max_turns: config.session.max_turns,
            context_turns: config.session.context_turns,
        });
        let chat = HybridChatOrchestrator::new(
            Arc::new(sessions),
            Arc::new(retriever),
            Arc::new(generator),
            PromptComposer::new(&config.store_name),
            ChatSettings {
                chat_top_k: config.retrieval.chat_top_k,
                search_top_k: config.retrieval.search_top_k,
                max_top_k: config.retrieval.max_top_k,
            },
        );
        let knowledge = KnowledgeBase::new(
            handle,
            embedder,
            DocumentProcessor::new(config.chunking.chunk_size, config.chunking.chunk_overlap)?,
            &config.storage.vector_store_path,
            &config.storage.pdfs_folder,
        );
        Ok(Self::new(config, chat, knowledge))
    }

    pub fn uptime_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }
}
