use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::{error::ApiError, state::AppState};

pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/chat/search", post(search))
        .route("/api/chat/health", get(chat_health))
        .route("/api/chat/diagnose", get(diagnose))
        .route("/api/chat/reinitialize", post(reinitialize))
        .route("/api/chat/sessions", get(session_stats))
        .route("/api/chat/sessions/{user_id}", delete(clear_session))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub message: String,
    pub limit: Option<i64>,
}

async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = body?;
    let result = state.chat.chat(&req.message, req.user_id.as_deref()).await?;
    Ok(Json(json!({
        "success": true,
        "data": {
            "response": result.text,
            "userId": result.session_id,
            "usedRetrieval": result.used_retrieval,
            "degraded": result.degraded,
            "timestamp": result.timestamp,
        },
    })))
}

async fn search(
    State(state): State<AppState>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = body?;
    let documents = state.chat.search(&req.message, req.limit).await?;
    Ok(Json(json!({
        "success": true,
        "data": {
            "query": req.message.trim(),
            "count": documents.len(),
            "documents": documents,
            "timestamp": Utc::now(),
        },
    })))
}

async fn chat_health(State(state): State<AppState>) -> Json<Value> {
    let backend = match state.chat.generator().probe().await {
        Ok(status) => json!({
            "status": "connected",
            "model": status.model,
            "version": status.version,
        }),
        Err(e) => {
            warn!(error = %e, "generation backend probe failed");
            json!({ "status": "disconnected", "error": e.to_string() })
        }
    };
    let initialized = state.chat.retriever().is_ready();
    Json(json!({
        "success": true,
        "data": {
            "chatService": if initialized { "initialized" } else { "not_initialized" },
            "ollama": backend,
            "timestamp": Utc::now(),
        },
    }))
}

async fn diagnose(State(state): State<AppState>) -> Json<Value> {
    let diagnosis = state.chat.diagnose().await;
    Json(json!({
        "success": true,
        "data": {
            "diagnosis": diagnosis,
            "timestamp": Utc::now(),
        },
    }))
}

async fn reinitialize(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    info!("reinitializing chat service");
    let loaded = state
        .knowledge
        .load_from_disk()
        .await
        .map_err(|e| ApiError::knowledge("Error reinicializando servicio de chat", e))?;
    let backend = match state.chat.generator().probe().await {
        Ok(status) => json!({ "status": "connected", "version": status.version }),
        Err(e) => json!({ "status": "disconnected", "error": e.to_string() }),
    };
    Ok(Json(json!({
        "success": true,
        "data": {
            "message": "Servicio de chat reinicializado correctamente",
            "vectorStoreLoaded": loaded,
            "ollama": backend,
            "timestamp": Utc::now(),
        },
    })))
}

async fn session_stats(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "sessionStats": state.chat.session_stats(),
            "timestamp": Utc::now(),
        },
    }))
}

async fn clear_session(State(state): State<AppState>, Path(user_id): Path<String>) -> Json<Value> {
    let deleted = state.chat.clear_session(&user_id);
    let message = if deleted {
        "Sesión eliminada correctamente"
    } else {
        "Sesión no encontrada"
    };
    Json(json!({
        "success": true,
        "data": {
            "message": message,
            "deleted": deleted,
            "userId": user_id,
            "timestamp": Utc::now(),
        },
    }))
}
