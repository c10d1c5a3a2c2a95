use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;

use gondola_parser::SourceFile;

use crate::{error::ApiError, state::AppState};

pub const MAX_UPLOAD_FILES: usize = 10;
pub const MAX_UPLOAD_FILE_BYTES: usize = 10 * 1024 * 1024;
const UPLOAD_FIELD: &str = "pdfs";
const PDF_CONTENT_TYPE: &str = "application/pdf";

pub fn document_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/documents/upload",
            post(upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_FILES * MAX_UPLOAD_FILE_BYTES + 64 * 1024)),
        )
        .route("/api/documents/setup", post(setup))
        .route("/api/documents/status", get(status))
        .route("/api/documents/reset", delete(reset))
}

/// Pull the PDF parts out of a multipart body, enforcing the upload limits.
async fn collect_pdfs(mut multipart: Multipart) -> Result<Vec<SourceFile>, ApiError> {
    let mut files = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(multipart_error(e)),
        };
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        if field.content_type() != Some(PDF_CONTENT_TYPE) {
            return Err(ApiError::bad_request("Solo se permiten archivos PDF"));
        }
        if files.len() == MAX_UPLOAD_FILES {
            return Err(ApiError::bad_request("Demasiados archivos (máximo 10)"));
        }
        let filename = field.file_name().unwrap_or("documento.pdf").to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.len() > MAX_UPLOAD_FILE_BYTES {
            return Err(ApiError::payload_too_large("Archivo demasiado grande (máximo 10MB)"));
        }
        files.push(SourceFile::new(filename, bytes.to_vec()));
    }
    Ok(files)
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    if err.status() == axum::http::StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("Archivo demasiado grande (máximo 10MB)")
    } else {
        ApiError::bad_request("Solicitud multipart inválida").with_message(err.body_text())
    }
}

async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    let multipart = multipart.map_err(|rejection| {
        ApiError::bad_request("No se proporcionaron archivos PDF").with_message(rejection.body_text())
    })?;
    let files = collect_pdfs(multipart).await?;
    if files.is_empty() {
        return Err(ApiError::bad_request("No se proporcionaron archivos PDF"));
    }
    info!(files = files.len(), "processing uploaded documents");

    let summary = state
        .knowledge
        .ingest(files)
        .await
        .map_err(|e| ApiError::knowledge("Error procesando documentos", e))?;
    Ok(Json(json!({
        "success": true,
        "data": {
            "message": "Documentos procesados correctamente",
            "filesProcessed": summary.files_processed,
            "documentsCreated": summary.documents_created,
            "vectorStorePath": summary.vector_store_path,
            "timestamp": Utc::now(),
        },
    })))
}

async fn setup(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    info!("building vector store from default documents");
    let summary = state
        .knowledge
        .setup_default()
        .await
        .map_err(|e| ApiError::knowledge("Error configurando documentos", e))?;
    Ok(Json(json!({ "success": true, "data": summary })))
}

async fn status(State(state): State<AppState>) -> Json<Value> {
    let status = state.knowledge.status().await;
    Json(json!({
        "success": true,
        "data": {
            "vectorStore": {
                "exists": status.vector_store_exists,
                "loaded": status.loaded,
                "indexedChunks": status.indexed_chunks,
                "path": status.vector_store_path,
            },
            "pdfs": {
                "folder": status.pdfs_folder,
                "count": status.available_files.len(),
                "available": status.available_files,
            },
            "timestamp": Utc::now(),
        },
    }))
}

async fn reset(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let removed = state
        .knowledge
        .reset()
        .await
        .map_err(|e| ApiError::knowledge("Error reiniciando documentos", e))?;
    Ok(Json(json!({
        "success": true,
        "data": {
            "message": "Vector store reiniciado",
            "removed": removed,
            "timestamp": Utc::now(),
        },
    })))
}
