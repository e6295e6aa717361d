//! Unified error codes
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Tenant errors
//! - 4xxx: Queue errors
//! - 7xxx: Table errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Session has expired or no longer matches the stored profile
    SessionExpired = 1005,
    /// Password too short
    PasswordTooShort = 1006,
    /// Password confirmation does not match
    PasswordMismatch = 1007,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,

    // ==================== 3xxx: Tenant ====================
    /// No restaurant selected for this session
    TenantNotSelected = 3001,
    /// Restaurant not found for slug
    TenantNotFound = 3002,

    // ==================== 4xxx: Queue ====================
    /// Queue entry not found
    QueueEntryNotFound = 4001,
    /// Queue entry is not waiting
    QueueEntryNotWaiting = 4002,
    /// Queue entry is not assigned to a table
    QueueEntryNotAssigned = 4003,
    /// Queue entry already reached a terminal status
    QueueEntryTerminal = 4004,
    /// Party size outside the accepted range
    InvalidPartySize = 4005,
    /// Guest already holds an active reservation
    ReservationExists = 4006,
    /// No reservation stored for this guest
    ReservationNotFound = 4007,
    /// Status transition not allowed
    InvalidStatusTransition = 4008,

    // ==================== 7xxx: Table ====================
    /// Table not found
    TableNotFound = 7001,
    /// Table is occupied
    TableOccupied = 7002,
    /// Table is referenced by queue entries
    TableInUse = 7003,
    /// Party does not fit the table
    TableCapacityExceeded = 7004,
    /// Table capacity must be positive
    InvalidCapacity = 7005,

    // ==================== 9xxx: System ====================
    /// Internal error
    InternalError = 9001,
    /// Backend database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// Remote gateway rejected the request
    GatewayError = 9006,
    /// Local storage error
    StorageError = 9007,
    /// Engine worker is not running
    EngineStopped = 9008,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::SessionExpired => "Session has expired",
            ErrorCode::PasswordTooShort => "Password must be at least 8 characters long",
            ErrorCode::PasswordMismatch => "Passwords do not match",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",

            // Tenant
            ErrorCode::TenantNotSelected => "No restaurant selected",
            ErrorCode::TenantNotFound => "Restaurant not found",

            // Queue
            ErrorCode::QueueEntryNotFound => "Queue entry not found",
            ErrorCode::QueueEntryNotWaiting => "Queue entry is not waiting",
            ErrorCode::QueueEntryNotAssigned => "Queue entry is not assigned to a table",
            ErrorCode::QueueEntryTerminal => "Queue entry is already closed",
            ErrorCode::InvalidPartySize => "Party size must be between 1 and 16",
            ErrorCode::ReservationExists => "An active reservation already exists",
            ErrorCode::ReservationNotFound => "No reservation found",
            ErrorCode::InvalidStatusTransition => "Status transition not allowed",

            // Table
            ErrorCode::TableNotFound => "Table not found",
            ErrorCode::TableOccupied => "Table is occupied",
            ErrorCode::TableInUse => "Table is referenced by queue entries",
            ErrorCode::TableCapacityExceeded => "Party does not fit the table",
            ErrorCode::InvalidCapacity => "Table capacity must be positive",

            // System
            ErrorCode::InternalError => "Internal error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::GatewayError => "Remote gateway error",
            ErrorCode::StorageError => "Local storage error",
            ErrorCode::EngineStopped => "Queue engine is not running",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1005 => Ok(ErrorCode::SessionExpired),
            1006 => Ok(ErrorCode::PasswordTooShort),
            1007 => Ok(ErrorCode::PasswordMismatch),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),

            // Tenant
            3001 => Ok(ErrorCode::TenantNotSelected),
            3002 => Ok(ErrorCode::TenantNotFound),

            // Queue
            4001 => Ok(ErrorCode::QueueEntryNotFound),
            4002 => Ok(ErrorCode::QueueEntryNotWaiting),
            4003 => Ok(ErrorCode::QueueEntryNotAssigned),
            4004 => Ok(ErrorCode::QueueEntryTerminal),
            4005 => Ok(ErrorCode::InvalidPartySize),
            4006 => Ok(ErrorCode::ReservationExists),
            4007 => Ok(ErrorCode::ReservationNotFound),
            4008 => Ok(ErrorCode::InvalidStatusTransition),

            // Table
            7001 => Ok(ErrorCode::TableNotFound),
            7002 => Ok(ErrorCode::TableOccupied),
            7003 => Ok(ErrorCode::TableInUse),
            7004 => Ok(ErrorCode::TableCapacityExceeded),
            7005 => Ok(ErrorCode::InvalidCapacity),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9006 => Ok(ErrorCode::GatewayError),
            9007 => Ok(ErrorCode::StorageError),
            9008 => Ok(ErrorCode::EngineStopped),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
