//! Shared types for the Front Desk workspace
//!
//! Common types used by both the gateway client and the front-desk engine:
//! typed backend records, the unified error system and change notifications.

pub mod error;
pub mod message;
pub mod models;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
pub use message::{ChangeChannel, ChangeEvent, ChangeKind};
