//! Application error type

use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// This is the error every layer eventually surfaces to the operator:
/// - Standardized error codes via [`ErrorCode`]
/// - Human-readable messages
/// - Optional structured details for debugging
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (field-level errors, context, etc.)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    /// Look up a detail value by key
    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.as_ref().and_then(|d| d.get(key))
    }

    // ==================== Convenience constructors ====================

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{} not found", r))
            .with_detail("resource", r)
    }

    /// Create a not authenticated error
    pub fn not_authenticated() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    /// Create an invalid credentials error
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials)
    }

    /// Create a session expired error
    pub fn session_expired() -> Self {
        Self::new(ErrorCode::SessionExpired)
    }

    /// Create a permission denied error
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::PermissionDenied, msg)
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    /// Create a gateway error
    pub fn gateway(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::GatewayError, msg)
    }

    /// Create a local storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::StorageError, msg)
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidRequest, msg)
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::AlreadyExists, msg)
    }

    /// Create a table occupied error
    pub fn table_occupied(table_id: i64) -> Self {
        Self::new(ErrorCode::TableOccupied).with_detail("table_id", table_id)
    }

    /// Create a queue entry not found error
    pub fn entry_not_found(entry_id: i64) -> Self {
        Self::new(ErrorCode::QueueEntryNotFound).with_detail("entry_id", entry_id)
    }

    /// Check whether the error originates from outside this process
    pub fn is_remote(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::GatewayError
                | ErrorCode::NetworkError
                | ErrorCode::TimeoutError
                | ErrorCode::DatabaseError
        )
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_new() {
        let err = AppError::new(ErrorCode::TableInUse);
        assert_eq!(err.code, ErrorCode::TableInUse);
        assert_eq!(err.message, "Table is referenced by queue entries");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_app_error_with_details() {
        let err = AppError::validation("Name is required")
            .with_detail("field", "name")
            .with_detail("max_len", 200);

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.detail("field"), Some(&Value::from("name")));
        assert_eq!(err.detail("max_len"), Some(&Value::from(200)));
        assert_eq!(err.to_string(), "Name is required");
    }

    #[test]
    fn test_table_occupied_detail() {
        let err = AppError::table_occupied(12);
        assert_eq!(err.http_status(), StatusCode::CONFLICT);
        assert_eq!(err.detail("table_id"), Some(&Value::from(12)));
    }

    #[test]
    fn test_is_remote() {
        assert!(AppError::gateway("boom").is_remote());
        assert!(!AppError::validation("bad").is_remote());
    }

    #[test]
    fn test_serde_shape() {
        let err = AppError::entry_not_found(7);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], 4001);
        assert_eq!(json["details"]["entry_id"], 7);

        let back: AppError = serde_json::from_value(json).unwrap();
        assert_eq!(back, err);
    }
}
