//! Input checks applied before any backend call.

use crate::error::{FieldError, ValidationError};

pub const MAX_MESSAGE_CHARS: usize = 1000;
pub const MIN_USER_ID_CHARS: usize = 3;
pub const MAX_USER_ID_CHARS: usize = 50;
pub const MAX_LIMIT: i64 = 20;

fn message_error(message: &str) -> Option<FieldError> {
    let len = message.trim().chars().count();
    let reason = if len == 0 {
        "El mensaje no puede estar vacío"
    } else if len > MAX_MESSAGE_CHARS {
        "El mensaje debe tener entre 1 y 1000 caracteres"
    } else {
        return None;
    };
    Some(FieldError {
        field: "message",
        message: reason.into(),
    })
}

fn user_id_error(user_id: &str) -> Option<FieldError> {
    let len = user_id.chars().count();
    // generated ids look like `user_<hex>` and must be accepted back
    if !user_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Some(FieldError {
            field: "userId",
            message: "El userId solo puede contener letras, números y guiones bajos".into(),
        })
    } else if !(MIN_USER_ID_CHARS..=MAX_USER_ID_CHARS).contains(&len) {
        Some(FieldError {
            field: "userId",
            message: "El userId debe tener entre 3 y 50 caracteres".into(),
        })
    } else {
        None
    }
}

fn limit_error(limit: i64) -> Option<FieldError> {
    (!(1..=MAX_LIMIT).contains(&limit)).then(|| FieldError {
        field: "limit",
        message: "El límite debe ser un número entre 1 y 20".into(),
    })
}

/// Validate a chat request; returns the trimmed message.
pub fn chat_request(message: &str, user_id: Option<&str>) -> Result<String, ValidationError> {
    let details: Vec<FieldError> = [message_error(message), user_id.and_then(user_id_error)]
        .into_iter()
        .flatten()
        .collect();
    if details.is_empty() {
        Ok(message.trim().to_string())
    } else {
        Err(ValidationError { details })
    }
}

/// Validate a search request; returns the trimmed query and the limit to use.
pub fn search_request(
    query: &str,
    limit: Option<i64>,
    default_limit: usize,
) -> Result<(String, usize), ValidationError> {
    let details: Vec<FieldError> = [message_error(query), limit.and_then(limit_error)]
        .into_iter()
        .flatten()
        .collect();
    if !details.is_empty() {
        return Err(ValidationError { details });
    }
    let limit = limit.map(|l| l as usize).unwrap_or(default_limit);
    Ok((query.trim().to_string(), limit))
}
