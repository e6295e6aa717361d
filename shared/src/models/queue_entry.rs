//! Queue Entry Model
//!
//! A queue entry is one guest party waiting for, or seated at, a table.
//! Backend rows arrive as [`QueueEntryRow`] and are validated into
//! [`QueueEntry`] before anything else touches them.

use crate::error::{AppError, ErrorCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest accepted party
pub const MIN_PARTY_SIZE: i32 = 1;
/// Largest accepted party
pub const MAX_PARTY_SIZE: i32 = 16;

/// Queue entry status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Waiting,
    Assigned,
    Completed,
    Cancelled,
}

impl QueueStatus {
    /// Statuses loaded onto the dashboard
    pub const ACTIVE: [QueueStatus; 2] = [QueueStatus::Waiting, QueueStatus::Assigned];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Waiting => "waiting",
            QueueStatus::Assigned => "assigned",
            QueueStatus::Completed => "completed",
            QueueStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal statuses accept no further mutation
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueueStatus::Completed | QueueStatus::Cancelled)
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// waiting → assigned | cancelled, assigned → completed
    pub fn can_transition_to(&self, next: QueueStatus) -> bool {
        matches!(
            (self, next),
            (QueueStatus::Waiting, QueueStatus::Assigned)
                | (QueueStatus::Waiting, QueueStatus::Cancelled)
                | (QueueStatus::Assigned, QueueStatus::Completed)
        )
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(QueueStatus::Waiting),
            "assigned" => Ok(QueueStatus::Assigned),
            "completed" => Ok(QueueStatus::Completed),
            "cancelled" => Ok(QueueStatus::Cancelled),
            other => Err(AppError::with_message(
                ErrorCode::InvalidFormat,
                format!("unknown queue status '{}'", other),
            )
            .with_detail("status", other)),
        }
    }
}

/// Validated queue entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub guests_count: i32,
    pub status: QueueStatus,
    pub table_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub restaurant_slug: String,
}

impl QueueEntry {
    pub fn is_waiting(&self) -> bool {
        self.status == QueueStatus::Waiting
    }

    pub fn is_assigned(&self) -> bool {
        self.status == QueueStatus::Assigned
    }

    /// Whether this entry currently seats a party at `table_id`
    pub fn occupies(&self, table_id: i64) -> bool {
        self.is_assigned() && self.table_id == Some(table_id)
    }

    /// Check the status/table invariant
    pub fn check_consistency(&self) -> Result<(), AppError> {
        match (self.status, self.table_id) {
            (QueueStatus::Waiting, Some(table_id)) => Err(AppError::with_message(
                ErrorCode::InvalidStatusTransition,
                "waiting entry must not reference a table",
            )
            .with_detail("entry_id", self.id)
            .with_detail("table_id", table_id)),
            (QueueStatus::Assigned, None) => Err(AppError::with_message(
                ErrorCode::InvalidStatusTransition,
                "assigned entry must reference a table",
            )
            .with_detail("entry_id", self.id)),
            _ => Ok(()),
        }
    }

    /// Apply a patch, enforcing the lifecycle
    pub fn apply(&mut self, update: &QueueEntryUpdate) -> Result<(), AppError> {
        if let Some(next) = update.status
            && next != self.status
        {
            if self.status.is_terminal() {
                return Err(AppError::new(ErrorCode::QueueEntryTerminal)
                    .with_detail("entry_id", self.id)
                    .with_detail("status", self.status.as_str()));
            }
            if !self.status.can_transition_to(next) {
                return Err(AppError::new(ErrorCode::InvalidStatusTransition)
                    .with_detail("entry_id", self.id)
                    .with_detail("from", self.status.as_str())
                    .with_detail("to", next.as_str()));
            }
            self.status = next;
        }
        if let Some(table_id) = update.table_id {
            self.table_id = table_id;
        }
        Ok(())
    }
}

/// Loosely typed backend row, as delivered over the wire
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueEntryRow {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub guests_count: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub table_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub restaurant_slug: Option<String>,
}

impl TryFrom<QueueEntryRow> for QueueEntry {
    type Error = AppError;

    fn try_from(row: QueueEntryRow) -> Result<Self, Self::Error> {
        let status: QueueStatus = row
            .status
            .as_deref()
            .ok_or_else(|| missing(row.id, "status"))?
            .parse()?;

        let guests_count = row.guests_count.ok_or_else(|| missing(row.id, "guests_count"))?;
        let guests_count = i32::try_from(guests_count)
            .ok()
            .filter(|n| (MIN_PARTY_SIZE..=MAX_PARTY_SIZE).contains(n))
            .ok_or_else(|| {
                AppError::new(ErrorCode::InvalidPartySize)
                    .with_detail("entry_id", row.id)
                    .with_detail("guests_count", guests_count)
            })?;

        let entry = QueueEntry {
            id: row.id,
            name: row.name.unwrap_or_default(),
            phone: row.phone.unwrap_or_default(),
            email: row.email.unwrap_or_default(),
            guests_count,
            status,
            table_id: row.table_id,
            created_at: row.created_at.ok_or_else(|| missing(row.id, "created_at"))?,
            restaurant_slug: row
                .restaurant_slug
                .ok_or_else(|| missing(row.id, "restaurant_slug"))?,
        };
        entry.check_consistency()?;
        Ok(entry)
    }
}

impl From<QueueEntry> for QueueEntryRow {
    fn from(entry: QueueEntry) -> Self {
        Self {
            id: entry.id,
            name: Some(entry.name),
            phone: Some(entry.phone),
            email: Some(entry.email),
            guests_count: Some(entry.guests_count as i64),
            status: Some(entry.status.as_str().to_string()),
            table_id: entry.table_id,
            created_at: Some(entry.created_at),
            restaurant_slug: Some(entry.restaurant_slug),
        }
    }
}

fn missing(id: i64, field: &str) -> AppError {
    AppError::with_message(ErrorCode::RequiredField, format!("queue row missing {}", field))
        .with_detail("entry_id", id)
        .with_detail("field", field)
}

/// Insert payload for a new guest reservation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntryCreate {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub guests_count: i32,
    pub status: QueueStatus,
    pub restaurant_slug: String,
}

impl QueueEntryCreate {
    /// New waiting reservation
    pub fn waiting(
        restaurant_slug: impl Into<String>,
        guests_count: i32,
        name: impl Into<String>,
        phone: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            email: email.into(),
            guests_count,
            status: QueueStatus::Waiting,
            restaurant_slug: restaurant_slug.into(),
        }
    }

    /// Structural checks shared by every backend; contact field formats are
    /// checked by the guest session before this point.
    pub fn validate(&self) -> Result<(), AppError> {
        if !(MIN_PARTY_SIZE..=MAX_PARTY_SIZE).contains(&self.guests_count) {
            return Err(AppError::new(ErrorCode::InvalidPartySize)
                .with_detail("guests_count", self.guests_count));
        }
        if self.status != QueueStatus::Waiting {
            return Err(AppError::with_message(
                ErrorCode::InvalidStatusTransition,
                "new queue entries start as waiting",
            )
            .with_detail("status", self.status.as_str()));
        }
        if self.restaurant_slug.trim().is_empty() {
            return Err(AppError::new(ErrorCode::TenantNotSelected));
        }
        Ok(())
    }
}

/// Patch for an existing queue entry
///
/// `table_id: Some(None)` clears the reference, `None` leaves it untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntryUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<QueueStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_id: Option<Option<i64>>,
}

impl QueueEntryUpdate {
    pub fn assign(table_id: i64) -> Self {
        Self {
            status: Some(QueueStatus::Assigned),
            table_id: Some(Some(table_id)),
        }
    }

    pub fn status(status: QueueStatus) -> Self {
        Self {
            status: Some(status),
            table_id: None,
        }
    }
}
