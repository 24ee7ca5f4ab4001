//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::auth::TokenError;
use crate::media::MediaError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("No authorization header")]
    MissingAuthorization,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] TokenError),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("You are not authorized")]
    NotOwner,

    #[error("This account is private")]
    PrivateAccount,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Music not found: {0}")]
    MusicNotFound(String),

    // Server errors (5xx)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Media storage error: {0}")]
    Media(#[from] MediaError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
///
/// Every failure is reported as `{ "success": false, "errors": [...] }`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub errors: Vec<String>,
}

impl AppError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::MissingAuthorization
            | AppError::InvalidToken(_)
            | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::NotOwner | AppError::PrivateAccount | AppError::Forbidden(_) => {
                StatusCode::FORBIDDEN
            }
            AppError::UserNotFound(_) | AppError::MusicNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Media(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Check if this is a client error (caller's fault)
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_client_error() {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        // Server-side details stay in the logs
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Internal server error".to_string()
            }
            AppError::Media(e) => {
                tracing::error!("Media storage error: {:?}", e);
                "Internal server error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            success: false,
            errors: vec![message],
        };

        (status, Json(body)).into_response()
    }
}
