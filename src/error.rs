//! API error taxonomy and its mapping to HTTP responses.
//!
//! Every service function surfaces one of these variants; handlers never build
//! status codes by hand. Each variant carries a stable machine-readable `code`
//! next to the prose message so clients don't have to parse English.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// A required field is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// The request conflicts with existing state (duplicate email/username,
    /// duplicate course purchase, federated-only account).
    #[error("{0}")]
    Conflict(String),

    /// The referenced degree/course/user/event does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Bad credentials or an unverifiable identity token.
    #[error("{0}")]
    Auth(String),

    /// Blob storage refused or failed an upload.
    #[error("{0}")]
    Upload(String),

    /// Any uncaught collaborator failure. The detail is logged, never surfaced.
    #[error("{0}")]
    Unknown(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::Conflict(_) => "conflict",
            ApiError::NotFound(_) => "not_found",
            ApiError::Auth(_) => "auth_failed",
            ApiError::Upload(_) => "upload_failed",
            ApiError::Unknown(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Conflict(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Auth(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Upload(detail) => {
                error!(target: "academia_backend", %detail, "upload failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "File upload failed".to_string())
            }
            ApiError::Unknown(detail) => {
                error!(target: "academia_backend", %detail, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
            "code": self.code(),
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Unknown(format!("JSON error: {e}"))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Unknown(format!("HTTP client error: {e}"))
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(e: bcrypt::BcryptError) -> Self {
        ApiError::Unknown(format!("bcrypt error: {e}"))
    }
}
