use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde_json::{json, Value};

use crate::state::AppState;

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(banner))
        .route("/api/health", get(health))
        .route("/api/health/detailed", get(health_detailed))
}

async fn banner(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": format!("{} Chatbot Backend API", state.config.store_name),
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "health": "/api/health",
            "chat": "/api/chat",
            "documents": "/api/documents",
        },
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "status": "healthy",
            "timestamp": Utc::now(),
            "uptime": state.uptime_secs(),
            "environment": state.config.server.environment,
            "version": env!("CARGO_PKG_VERSION"),
            "services": {
                "ollama": state.config.ollama.base_url,
                "model": state.config.ollama.model,
            },
        },
    }))
}

async fn health_detailed(State(state): State<AppState>) -> Json<Value> {
    let config = &state.config;
    Json(json!({
        "success": true,
        "data": {
            "server": {
                "status": "healthy",
                "uptime": state.uptime_secs(),
            },
            "environment": {
                "platform": std::env::consts::OS,
                "arch": std::env::consts::ARCH,
                "environment": config.server.environment,
            },
            "configuration": {
                "port": config.server.port,
                "ollamaUrl": config.ollama.base_url,
                "ollamaModel": config.ollama.model,
                "embeddingModel": config.ollama.embedding_model,
                "vectorStorePath": config.storage.vector_store_path,
                "pdfsFolder": config.storage.pdfs_folder,
            },
        },
        "timestamp": Utc::now(),
    }))
}
