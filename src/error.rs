//! Error types for Authgate
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
///
/// This enum represents all possible errors that can occur
/// in the application. It implements `IntoResponse` to
/// automatically convert errors to appropriate HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication required (401)
    #[error("Not authenticated")]
    Unauthorized,

    /// Bearer token failed verification (401)
    #[error("Invalid token")]
    InvalidToken,

    /// Session id unknown or expired (401)
    #[error("Invalid session")]
    InvalidSession,

    /// Requested OAuth provider is not configured (404)
    #[error("Unknown provider: {0}")]
    ProviderNotFound(String),

    /// Code-for-token exchange with the provider failed (502)
    #[error("Code exchange failed: {0}")]
    Exchange(String),

    /// HTTP client error (502)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Maps each error variant to appropriate HTTP status code
    /// and JSON error body.
    fn into_response(self) -> Response {
        use axum::Json;

        let (status, error_message) = match &self {
            AppError::Unauthorized | AppError::InvalidToken | AppError::InvalidSession => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            AppError::ProviderNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Exchange(_) | AppError::HttpClient(_) => {
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(serde_json::json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
