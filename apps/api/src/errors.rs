use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Every expected failure of the credential, token and document components is a
/// variant here; handlers return `Result<T, AppError>` and Axum renders it.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Username already exists")]
    DuplicateUsername,

    #[error("Email already exists")]
    DuplicateEmail,

    #[error("Email already in use")]
    EmailTaken,

    /// Deliberately undifferentiated: never says whether the username or the password was wrong.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Current password is incorrect")]
    WrongCurrentPassword,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate resume name: {0}")]
    DuplicateName(String),

    #[error("Token has expired")]
    Expired,

    #[error("Malformed token")]
    Malformed,

    #[error("Token signature is invalid")]
    BadSignature,

    #[error("Access denied")]
    Denied,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::StorageUnavailable(e.to_string())
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::DuplicateUsername => {
                (StatusCode::CONFLICT, "DUPLICATE_USERNAME", self.to_string())
            }
            AppError::DuplicateEmail => (StatusCode::CONFLICT, "DUPLICATE_EMAIL", self.to_string()),
            AppError::EmailTaken => (StatusCode::CONFLICT, "EMAIL_TAKEN", self.to_string()),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                self.to_string(),
            ),
            AppError::WrongCurrentPassword => (
                StatusCode::UNAUTHORIZED,
                "WRONG_CURRENT_PASSWORD",
                self.to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::DuplicateName(name) => (
                StatusCode::CONFLICT,
                "DUPLICATE_NAME",
                format!("A resume named '{name}' already exists"),
            ),
            AppError::Expired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED", self.to_string()),
            AppError::Malformed => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_MALFORMED",
                self.to_string(),
            ),
            AppError::BadSignature => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_BAD_SIGNATURE",
                self.to_string(),
            ),
            AppError::Denied => (StatusCode::FORBIDDEN, "FORBIDDEN", self.to_string()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string()),
            AppError::StorageUnavailable(msg) => {
                tracing::error!("Storage error: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "STORAGE_UNAVAILABLE",
                    "The document store is unavailable".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
