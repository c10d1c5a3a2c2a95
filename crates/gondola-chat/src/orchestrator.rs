//! The per-request chat state machine.

use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use gondola_core::{ChatResult, RetrievedDocument};
use gondola_session::{ConversationStore, Role, SessionStats};

use crate::error::{ChatError, SearchError};
use crate::generation::Generator;
use crate::prompt::{PromptComposer, PromptMode};
use crate::retrieval::{Retrieval, Retriever};
use crate::validate;

pub(crate) const NO_MATCHES_CONTEXT: &str = "No se encontraron documentos específicos para esta consulta.";
pub(crate) const UNAVAILABLE_CONTEXT: &str =
    "Información específica de documentos no disponible en este momento.";

const LOG_PREVIEW_CHARS: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Start,
    HistoryLoaded,
    RetrievalAttempted,
    PromptComposed,
    Generated,
    Done,
    Error,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::HistoryLoaded => "history_loaded",
            Stage::RetrievalAttempted => "retrieval_attempted",
            Stage::PromptComposed => "prompt_composed",
            Stage::Generated => "generated",
            Stage::Done => "done",
            Stage::Error => "error",
        };
        f.write_str(name)
    }
}

/// Retrieval knobs for chat and search.
#[derive(Debug, Clone, Copy)]
pub struct ChatSettings {
    pub chat_top_k: usize,
    pub search_top_k: usize,
    pub max_top_k: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            chat_top_k: 3,
            search_top_k: 5,
            max_top_k: 20,
        }
    }
}

/// Context text plus whether any document made it in.
struct GroundingContext {
    text: String,
    used_retrieval: bool,
}

pub(crate) fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(LOG_PREVIEW_CHARS).collect();
    if text.chars().count() > LOG_PREVIEW_CHARS {
        out.push('…');
    }
    out
}

/// `user_` followed by 16 hex chars from the OS random source.
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; 8];
    OsRng.fill_bytes(&mut bytes);
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("user_{hex}")
}

pub struct HybridChatOrchestrator {
    pub(crate) sessions: Arc<dyn ConversationStore>,
    pub(crate) retriever: Arc<dyn Retriever>,
    pub(crate) generator: Arc<dyn Generator>,
    composer: PromptComposer,
    settings: ChatSettings,
}

impl HybridChatOrchestrator {
    pub fn new(
        sessions: Arc<dyn ConversationStore>,
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn Generator>,
        composer: PromptComposer,
        settings: ChatSettings,
    ) -> Self {
        Self {
            sessions,
            retriever,
            generator,
            composer,
            settings,
        }
    }

    pub fn sessions(&self) -> &Arc<dyn ConversationStore> {
        &self.sessions
    }

    pub fn retriever(&self) -> &Arc<dyn Retriever> {
        &self.retriever
    }

    pub fn generator(&self) -> &Arc<dyn Generator> {
        &self.generator
    }

    pub fn settings(&self) -> ChatSettings {
        self.settings
    }

    /// Answer `message` in the conversation keyed by `user_id` (a fresh
    /// anonymous id when absent).
    pub async fn chat(&self, message: &str, user_id: Option<&str>) -> Result<ChatResult, ChatError> {
        let message = validate::chat_request(message, user_id)?;
        let session_id = user_id.map(str::to_string).unwrap_or_else(generate_session_id);
        debug!(stage = %Stage::Start, user_id = %session_id, message = %preview(&message), "chat request");

        self.sessions.append(&session_id, Role::User, &message);
        let history = self.sessions.format_context(&session_id);
        debug!(stage = %Stage::HistoryLoaded, user_id = %session_id, history_chars = history.len(), "history loaded");

        let grounding = self.ground(&session_id, &message).await;
        debug!(
            stage = %Stage::RetrievalAttempted,
            user_id = %session_id,
            used_retrieval = grounding.used_retrieval,
            "retrieval attempted"
        );

        let prompt = self.composer.compose(&message, &history, &grounding.text, PromptMode::Hybrid);
        debug!(stage = %Stage::PromptComposed, user_id = %session_id, prompt_chars = prompt.len(), "prompt composed");

        let (text, degraded) = match self.generator.generate(&prompt).await {
            Ok(text) => (text, false),
            Err(primary) => {
                warn!(
                    stage = %Stage::PromptComposed,
                    user_id = %session_id,
                    error = %primary,
                    "generation failed, retrying without context"
                );
                let bare = self.composer.compose(&message, "", "", PromptMode::Bare);
                match self.generator.generate(&bare).await {
                    Ok(text) => (text, true),
                    Err(fallback) => {
                        error!(
                            stage = %Stage::Error,
                            user_id = %session_id,
                            message = %preview(&message),
                            primary = %primary,
                            fallback = %fallback,
                            "generation unavailable"
                        );
                        return Err(ChatError::GenerationUnavailable { primary, fallback });
                    }
                }
            }
        };
        debug!(stage = %Stage::Generated, user_id = %session_id, degraded, "response generated");

        let text = text.trim().to_string();
        self.sessions.append(&session_id, Role::Assistant, &text);
        info!(
            stage = %Stage::Done,
            user_id = %session_id,
            used_retrieval = grounding.used_retrieval,
            degraded,
            "chat answered"
        );

        Ok(ChatResult {
            text,
            session_id,
            used_retrieval: grounding.used_retrieval,
            degraded,
            timestamp: Utc::now(),
        })
    }

    async fn ground(&self, session_id: &str, message: &str) -> GroundingContext {
        match self.retriever.retrieve(message, self.settings.chat_top_k).await {
            Ok(Retrieval::Documents(docs)) => GroundingContext {
                text: docs
                    .iter()
                    .map(|d| d.content.as_str())
                    .collect::<Vec<_>>()
                    .join("\n\n"),
                used_retrieval: true,
            },
            Ok(Retrieval::NoMatches) => GroundingContext {
                text: NO_MATCHES_CONTEXT.to_string(),
                used_retrieval: false,
            },
            Err(failure) => {
                warn!(
                    stage = %Stage::RetrievalAttempted,
                    user_id = %session_id,
                    message = %preview(message),
                    error = %failure,
                    "retrieval failed, continuing without documents"
                );
                GroundingContext {
                    text: UNAVAILABLE_CONTEXT.to_string(),
                    used_retrieval: false,
                }
            }
        }
    }

    /// Direct similarity search. `limit` defaults to the search top-k.
    pub async fn search(&self, query: &str, limit: Option<i64>) -> Result<Vec<RetrievedDocument>, SearchError> {
        let (query, limit) = validate::search_request(query, limit, self.settings.search_top_k)?;
        let k = limit.clamp(1, self.settings.max_top_k);
        info!(query = %preview(&query), k, "document search");
        Ok(self.retriever.retrieve(&query, k).await?.into_documents())
    }

    pub fn clear_session(&self, user_id: &str) -> bool {
        let existed = self.sessions.clear(user_id);
        info!(user_id, existed, "session cleared");
        existed
    }

    pub fn session_stats(&self) -> SessionStats {
        self.sessions.stats()
    }
}
