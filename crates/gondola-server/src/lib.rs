//! Gondola HTTP API server (Axum).
//!
//! Chat, document ingestion and health endpoints over the hybrid RAG
//! pipeline, with JSON `{ success, data }` envelopes.

pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

use axum::{
    http::{header, HeaderValue, Method, StatusCode, Uri},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use error::ApiError;
use state::AppState;

/// Build the application router with a custom state.
pub fn app_with_state(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);
    let timeout = TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, state.config.request_timeout());
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::chat_routes())
        .merge(routes::document_routes())
        .fallback(not_found)
        .with_state(state)
        .layer(timeout)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins.iter().filter_map(|o| HeaderValue::from_str(o).ok()))
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found("Endpoint no encontrado").with_message(format!("La ruta {uri} no existe"))
}

#[cfg(test)]
mod tests;
