//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::TenantNotFound
            | Self::QueueEntryNotFound
            | Self::ReservationNotFound
            | Self::TableNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::ReservationExists
            | Self::QueueEntryNotWaiting
            | Self::QueueEntryNotAssigned
            | Self::QueueEntryTerminal
            | Self::InvalidStatusTransition
            | Self::TableOccupied
            | Self::TableInUse => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::SessionExpired => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied | Self::TenantNotSelected => {
                StatusCode::FORBIDDEN
            }

            // 400 Bad Request
            Self::ValidationFailed
            | Self::InvalidRequest
            | Self::InvalidFormat
            | Self::RequiredField
            | Self::PasswordTooShort
            | Self::PasswordMismatch
            | Self::InvalidPartySize
            | Self::TableCapacityExceeded
            | Self::InvalidCapacity => StatusCode::BAD_REQUEST,

            // 502 / 503 / 504
            Self::GatewayError | Self::NetworkError => StatusCode::BAD_GATEWAY,
            Self::EngineStopped => StatusCode::SERVICE_UNAVAILABLE,
            Self::TimeoutError => StatusCode::GATEWAY_TIMEOUT,

            // 500
            Self::Unknown
            | Self::InternalError
            | Self::DatabaseError
            | Self::StorageError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Classify a backend HTTP status when the body carries no usable code
    pub fn from_http_status(status: StatusCode) -> Self {
        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Self::ValidationFailed,
            StatusCode::UNAUTHORIZED => Self::NotAuthenticated,
            StatusCode::FORBIDDEN => Self::PermissionDenied,
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::CONFLICT => Self::AlreadyExists,
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => Self::TimeoutError,
            s if s.is_server_error() => Self::GatewayError,
            _ => Self::Unknown,
        }
    }
}
