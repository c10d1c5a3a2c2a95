//! JSON error responses for the HTTP API.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::{error, warn};

use gondola_chat::{ChatError, KnowledgeError, SearchError, ValidationError};
use gondola_core::GondolaError;

/// Failure envelope: `{ "success": false, "error": …, "message" | "details": … }`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub message: Option<String>,
    pub details: Option<Value>,
}

impl ApiError {
    fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            message: None,
            details: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    pub fn not_found(error: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    pub fn payload_too_large(error: impl Into<String>) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, error)
    }

    pub fn unavailable(error: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, error)
    }

    pub fn internal(error: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }

    /// Knowledge base failures, titled per route.
    pub fn knowledge(title: &str, err: KnowledgeError) -> Self {
        let status = match &err {
            KnowledgeError::Document(
                GondolaError::InvalidDocument { .. } | GondolaError::UnsupportedFile(_) | GondolaError::NoDocuments,
            ) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %err, "{title}");
        } else {
            warn!(error = %err, "{title}");
        }
        Self::new(status, title).with_message(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "success": false,
            "error": self.error,
        });
        if let Some(message) = self.message {
            body["message"] = Value::String(message);
        }
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (self.status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        warn!(error = %err, "request rejected");
        let mut api = Self::bad_request("Datos de entrada inválidos");
        api.details = serde_json::to_value(&err.details).ok();
        api
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let mut api = Self::bad_request("Datos de entrada inválidos");
        api.details = Some(json!([{ "field": "body", "message": rejection.body_text() }]));
        api
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Validation(v) => v.into(),
            ChatError::GenerationUnavailable { .. } => {
                Self::unavailable("Error procesando consulta").with_message(err.to_string())
            }
        }
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Validation(v) => v.into(),
            SearchError::Retrieval(failure) => {
                error!(error = %failure, "document search failed");
                Self::internal("Error buscando documentos").with_message(failure.to_string())
            }
        }
    }
}
