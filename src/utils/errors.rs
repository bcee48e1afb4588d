//! Error handling
//!
//! Every failure the service can surface, and how each one is turned into
//! an HTTP response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("External API error: {0}")]
    ExternalApi(String),
}

/// Error body returned by the API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

/// Postgres SQLSTATE codes for constraint violations
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

impl AppError {
    /// Status, title and machine-readable code of the response
    fn parts(&self) -> (StatusCode, &'static str, &'static str) {
        match self {
            AppError::Database(e) => match constraint_code(e).as_deref() {
                Some(UNIQUE_VIOLATION) | Some(FOREIGN_KEY_VIOLATION) => {
                    (StatusCode::CONFLICT, "Conflict", "CONFLICT")
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "Database Error", "DB_ERROR"),
            },
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation Error", "VALIDATION_ERROR"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "Not Found", "NOT_FOUND"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "Conflict", "CONFLICT"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "Bad Request", "BAD_REQUEST"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", "INTERNAL_ERROR"),
            AppError::ExternalApi(_) => (StatusCode::BAD_GATEWAY, "External API Error", "EXTERNAL_API_ERROR"),
        }
    }
}

fn constraint_code(error: &sqlx::Error) -> Option<String> {
    match error {
        sqlx::Error::Database(db) => db.code().map(|code| code.into_owned()),
        _ => None,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, title, code) = self.parts();

        let (message, details) = match &self {
            AppError::Database(e) if status == StatusCode::CONFLICT => {
                log::warn!("⚠️ Constraint violation: {}", e);
                (
                    "The change conflicts with stored data".to_string(),
                    Some(json!({ "sql_error": e.to_string() })),
                )
            }
            AppError::Database(e) => {
                log::error!("❌ Database error: {}", e);
                (
                    "An error occurred while accessing the database".to_string(),
                    Some(json!({ "sql_error": e.to_string() })),
                )
            }
            AppError::Validation(e) => {
                log::warn!("⚠️ Validation error: {}", e);
                ("The provided data is invalid".to_string(), Some(json!(e)))
            }
            AppError::Internal(msg) | AppError::ExternalApi(msg) => {
                log::error!("❌ {}: {}", title, msg);
                (msg.clone(), None)
            }
            AppError::NotFound(msg) | AppError::Conflict(msg) | AppError::BadRequest(msg) => {
                log::warn!("⚠️ {}: {}", title, msg);
                (msg.clone(), None)
            }
        };

        let body = ErrorResponse {
            error: title.to_string(),
            message,
            details,
            code: Some(code.to_string()),
        };

        (status, Json(body)).into_response()
    }
}

/// Typed result for fallible operations
pub type AppResult<T> = Result<T, AppError>;

/// Helper for not-found errors on a resource id
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Helper for conflicts on a unique field
pub fn conflict_error(resource: &str, field: &str, value: &str) -> AppError {
    AppError::Conflict(format!("{} with {} '{}' already exists", resource, field, value))
}

/// Helper for bad requests
pub fn bad_request_error(message: &str) -> AppError {
    AppError::BadRequest(message.to_string())
}
