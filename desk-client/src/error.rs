//! Client error types

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned an error without a more specific mapping
    #[error("API error {status}: {message}")]
    Api {
        status: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication required or rejected
    #[error("Authentication required: {0}")]
    Unauthorized(String),

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Conflicting state (unique key, lifecycle violation)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Whether the backend rejected the session itself
    pub fn is_auth(&self) -> bool {
        match self {
            ClientError::Unauthorized(_) => true,
            ClientError::Api { status, .. } => *status == 401,
            _ => false,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http(e) if e.is_timeout() => {
                AppError::with_message(ErrorCode::TimeoutError, e.to_string())
            }
            ClientError::Http(e) => AppError::with_message(ErrorCode::NetworkError, e.to_string()),
            ClientError::Api {
                status,
                message,
                details,
            } => {
                let code = http::StatusCode::from_u16(status)
                    .map(ErrorCode::from_http_status)
                    .unwrap_or(ErrorCode::GatewayError);
                let err = AppError::with_message(code, message).with_detail("status", status);
                match details {
                    Some(d) => err.with_detail("backend", d),
                    None => err,
                }
            }
            ClientError::InvalidResponse(msg) => AppError::gateway(msg),
            ClientError::Unauthorized(msg) => {
                AppError::with_message(ErrorCode::NotAuthenticated, msg)
            }
            ClientError::Forbidden(msg) => AppError::permission_denied(msg),
            ClientError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            ClientError::Validation(msg) => AppError::validation(msg),
            ClientError::Conflict(msg) => AppError::conflict(msg),
            ClientError::Internal(msg) => AppError::internal(msg),
            ClientError::Serialization(e) => {
                AppError::with_message(ErrorCode::InvalidFormat, e.to_string())
            }
        }
    }
}
