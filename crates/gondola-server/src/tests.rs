use crate::app_with_state;
use crate::state::AppState;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use gondola_chat::{
    BackendStatus, ChatSettings, GenerationFailure, Generator, HybridChatOrchestrator, KnowledgeBase,
    PromptComposer, VectorStoreHandle, VectorStoreRetriever,
};
use gondola_core::GondolaConfig;
use gondola_parser::DocumentProcessor;
use gondola_session::SessionStore;
use gondola_vectordb::{Embedder, VectorDbError};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

struct WordEmbedder;

#[async_trait]
impl Embedder for WordEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, VectorDbError> {
        Ok(texts
            .iter()
            .map(|t| {
                let lower = t.to_lowercase();
                vec![
                    lower.matches("horario").count() as f32 + 0.1,
                    lower.matches("leche").count() as f32 + 0.1,
                ]
            })
            .collect())
    }

    fn model(&self) -> &str {
        "words"
    }
}

struct FixedGenerator {
    healthy: bool,
}

#[async_trait]
impl Generator for FixedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationFailure> {
        if self.healthy {
            Ok("Abrimos de 8 a 21.".into())
        } else {
            Err(GenerationFailure::Unreachable("connection refused".into()))
        }
    }

    async fn probe(&self) -> Result<BackendStatus, GenerationFailure> {
        if self.healthy {
            Ok(BackendStatus {
                model: "llama3.2:1b".into(),
                version: "0.5.1".into(),
            })
        } else {
            Err(GenerationFailure::Unreachable("connection refused".into()))
        }
    }

    fn model(&self) -> &str {
        "llama3.2:1b"
    }
}

/// Hangs for the configured generation timeout, then reports it.
struct StallingGenerator {
    stall: Duration,
}

#[async_trait]
impl Generator for StallingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationFailure> {
        tokio::time::sleep(self.stall).await;
        Err(GenerationFailure::Timeout)
    }

    async fn probe(&self) -> Result<BackendStatus, GenerationFailure> {
        Err(GenerationFailure::Timeout)
    }

    fn model(&self) -> &str {
        "llama3.2:1b"
    }
}

fn test_state(dir: &TempDir, healthy: bool) -> AppState {
    state_with_generator(dir, Arc::new(FixedGenerator { healthy }))
}

fn state_with_generator(dir: &TempDir, generator: Arc<dyn Generator>) -> AppState {
    let mut config = GondolaConfig::default();
    config.storage.vector_store_path = dir.path().join("vector-store");
    config.storage.pdfs_folder = dir.path().join("pdfs");

    let embedder: Arc<dyn Embedder> = Arc::new(WordEmbedder);
    let handle = VectorStoreHandle::new();
    let chat = HybridChatOrchestrator::new(
        Arc::new(SessionStore::default()),
        Arc::new(VectorStoreRetriever::new(handle.clone(), embedder.clone(), Duration::from_secs(5))),
        generator,
        PromptComposer::new(&config.store_name),
        ChatSettings::default(),
    );
    let knowledge = KnowledgeBase::new(
        handle,
        embedder,
        DocumentProcessor::new(1000, 200).unwrap(),
        &config.storage.vector_store_path,
        &config.storage.pdfs_folder,
    );
    AppState::new(config, chat, knowledge)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn method(method: &str, uri: &str) -> Request<Body> {
    Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
}

fn multipart(parts: &[(&str, &str, &[u8])]) -> Request<Body> {
    let boundary = "gondolaboundary";
    let mut body = Vec::new();
    for (filename, content_type, bytes) in parts {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"pdfs\"; filename=\"{filename}\"\r\n").as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    Request::builder()
        .method("POST")
        .uri("/api/documents/upload")
        .header("content-type", format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap()
}

// ========== Health ==========

#[tokio::test]
async fn test_banner() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_state(test_state(&dir, true));
    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Tienda Alemana Chatbot Backend API");
    assert_eq!(body["endpoints"]["chat"], "/api/chat");
}

#[tokio::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_state(test_state(&dir, true));
    let (status, body) = send(&app, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["services"]["model"], "llama3.2:1b");
    assert!(body["data"]["uptime"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn test_health_detailed() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_state(test_state(&dir, true));
    let (status, body) = send(&app, get("/api/health/detailed")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["configuration"]["port"], 3001);
    assert_eq!(body["data"]["environment"]["platform"], std::env::consts::OS);
}

#[tokio::test]
async fn test_unknown_route() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_state(test_state(&dir, true));
    let (status, body) = send(&app, get("/api/nada")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Endpoint no encontrado");
    assert_eq!(body["message"], "La ruta /api/nada no existe");
}

// ========== Chat ==========

#[tokio::test]
async fn test_chat_without_documents() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_state(test_state(&dir, true));
    let (status, body) = send(
        &app,
        post_json("/api/chat", json!({ "message": "¿Cuál es el horario?", "userId": "cliente1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["response"], "Abrimos de 8 a 21.");
    assert_eq!(body["data"]["userId"], "cliente1");
    assert_eq!(body["data"]["usedRetrieval"], false);
    assert_eq!(body["data"]["degraded"], false);
}

#[tokio::test]
async fn test_chat_assigns_user_id() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_state(test_state(&dir, true));
    let (status, body) = send(&app, post_json("/api/chat", json!({ "message": "hola" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["userId"].as_str().unwrap().starts_with("user_"));
}

#[tokio::test]
async fn test_chat_validation() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_state(test_state(&dir, true));
    let (status, body) = send(&app, post_json("/api/chat", json!({ "message": "  ", "userId": "x" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Datos de entrada inválidos");
    assert_eq!(body["details"][0]["field"], "message");
    assert_eq!(body["details"][1]["field"], "userId");

    let (status, body) = send(&app, post_json("/api/chat", json!({ "userId": "cliente1" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_chat_generation_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_state(test_state(&dir, false));
    let (status, body) = send(&app, post_json("/api/chat", json!({ "message": "hola", "userId": "cliente1" }))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test(start_paused = true)]
async fn test_chat_stalled_generation_reports_unavailable_before_request_deadline() {
    let dir = tempfile::tempdir().unwrap();
    let stall = Duration::from_millis(GondolaConfig::default().ollama.timeout_ms);
    let app = app_with_state(state_with_generator(&dir, Arc::new(StallingGenerator { stall })));

    let (status, body) = send(&app, post_json("/api/chat", json!({ "message": "hola", "userId": "cliente1" }))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Error procesando consulta");
}

#[tokio::test]
async fn test_search_without_store_fails() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_state(test_state(&dir, true));
    let (status, body) = send(&app, post_json("/api/chat/search", json!({ "message": "leche" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Error buscando documentos");

    let (status, _) = send(&app, post_json("/api/chat/search", json!({ "message": "leche", "limit": 50 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_health() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_state(test_state(&dir, true));
    let (status, body) = send(&app, get("/api/chat/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["chatService"], "not_initialized");
    assert_eq!(body["data"]["ollama"]["status"], "connected");

    let app = app_with_state(test_state(&dir, false));
    let (_, body) = send(&app, get("/api/chat/health")).await;
    assert_eq!(body["data"]["ollama"]["status"], "disconnected");
}

#[tokio::test]
async fn test_diagnose() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_state(test_state(&dir, true));
    let (status, body) = send(&app, get("/api/chat/diagnose")).await;
    assert_eq!(status, StatusCode::OK);
    let diagnosis = &body["data"]["diagnosis"];
    assert_eq!(diagnosis["total"], 4);
    // store missing: vector search fails, everything else passes
    assert_eq!(diagnosis["passed"], 3);
    assert_eq!(diagnosis["initialized"], false);
}

#[tokio::test]
async fn test_sessions_stats_and_clear() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_state(test_state(&dir, true));
    send(&app, post_json("/api/chat", json!({ "message": "hola", "userId": "cliente1" }))).await;

    let (_, body) = send(&app, get("/api/chat/sessions")).await;
    assert_eq!(body["data"]["sessionStats"]["activeSessions"], 1);
    assert_eq!(body["data"]["sessionStats"]["totalMessages"], 2);

    let (status, body) = send(&app, method("DELETE", "/api/chat/sessions/cliente1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], true);
    assert_eq!(body["data"]["message"], "Sesión eliminada correctamente");

    let (_, body) = send(&app, method("DELETE", "/api/chat/sessions/cliente1")).await;
    assert_eq!(body["data"]["deleted"], false);
}

// ========== Documents ==========

#[tokio::test]
async fn test_documents_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("pdfs")).unwrap();
    std::fs::write(dir.path().join("pdfs/sucursal.txt"), "Horario de la sucursal: 8 a 21.").unwrap();
    std::fs::write(dir.path().join("pdfs/catalogo.txt"), "Leche entera $1500.").unwrap();
    let app = app_with_state(test_state(&dir, true));

    let (_, body) = send(&app, get("/api/documents/status")).await;
    assert_eq!(body["data"]["vectorStore"]["exists"], false);
    assert_eq!(body["data"]["pdfs"]["count"], 2);

    let (status, body) = send(&app, method("POST", "/api/documents/setup")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["documentsCreated"], 2);

    let (status, body) = send(&app, post_json("/api/chat/search", json!({ "message": "leche", "limit": 1 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 1);
    assert_eq!(body["data"]["documents"][0]["metadata"]["source"], "catalogo.txt");

    let (_, body) = send(&app, post_json("/api/chat", json!({ "message": "¿horario?", "userId": "cliente1" }))).await;
    assert_eq!(body["data"]["usedRetrieval"], true);

    let (status, body) = send(&app, method("DELETE", "/api/documents/reset")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["removed"], true);

    let (_, body) = send(&app, get("/api/documents/status")).await;
    assert_eq!(body["data"]["vectorStore"]["exists"], false);
    assert_eq!(body["data"]["vectorStore"]["loaded"], false);
}

#[tokio::test]
async fn test_reinitialize_loads_persisted_store() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("pdfs")).unwrap();
    std::fs::write(dir.path().join("pdfs/horarios.txt"), "Horario: lunes a sábado").unwrap();

    let first = app_with_state(test_state(&dir, true));
    send(&first, method("POST", "/api/documents/setup")).await;

    let second = app_with_state(test_state(&dir, true));
    let (status, body) = send(&second, method("POST", "/api/chat/reinitialize")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["vectorStoreLoaded"], true);

    let (_, body) = send(&second, get("/api/chat/health")).await;
    assert_eq!(body["data"]["chatService"], "initialized");
}

#[tokio::test]
async fn test_setup_without_documents() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_state(test_state(&dir, true));
    let (status, body) = send(&app, method("POST", "/api/documents/setup")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Error configurando documentos");
}

#[tokio::test]
async fn test_upload_rejects_non_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_state(test_state(&dir, true));
    let (status, body) = send(&app, multipart(&[("notas.txt", "text/plain", &b"hola"[..])])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Solo se permiten archivos PDF");
}

#[tokio::test]
async fn test_upload_without_files() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_state(test_state(&dir, true));
    let (status, body) = send(&app, multipart(&[])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No se proporcionaron archivos PDF");
}

#[tokio::test]
async fn test_upload_too_many_files() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_state(test_state(&dir, true));
    let parts: Vec<(&str, &str, &[u8])> = (0..11).map(|_| ("a.pdf", "application/pdf", &b"%PDF"[..])).collect();
    let (status, _) = send(&app, multipart(&parts)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_invalid_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_state(test_state(&dir, true));
    let (status, body) = send(&app, multipart(&[("catalogo.pdf", "application/pdf", &b"no es un pdf"[..])])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Error procesando documentos");
}
