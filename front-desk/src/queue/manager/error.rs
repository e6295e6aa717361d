use desk_client::ClientError;
use shared::error::{AppError, ErrorCode};
use shared::models::QueueStatus;
use thiserror::Error;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Queue entry not found: {0}")]
    EntryNotFound(i64),

    #[error("Queue entry {entry_id} is {status}, expected waiting")]
    EntryNotWaiting { entry_id: i64, status: QueueStatus },

    #[error("Queue entry {entry_id} is {status}, expected assigned")]
    EntryNotAssigned { entry_id: i64, status: QueueStatus },

    #[error("Table not found: {0}")]
    TableNotFound(i64),

    #[error("Table {table_id} is occupied by entry {occupant}")]
    TableOccupied { table_id: i64, occupant: i64 },

    #[error("Table {table_id} is referenced by {references} queue entries")]
    TableInUse { table_id: i64, references: u64 },

    #[error("Table {table_id} seats {capacity}, party has {guests}")]
    CapacityExceeded {
        table_id: i64,
        capacity: i32,
        guests: i32,
    },

    #[error("Invalid transition for entry {entry_id}: {source}")]
    InvalidTransition { entry_id: i64, source: AppError },

    #[error("Failed to load queue (generation {generation}): {source}")]
    Load { generation: u64, source: AppError },

    #[error("Gateway error: {0}")]
    Gateway(#[from] ClientError),

    /// Optimistic change could not be persisted and was rolled back
    #[error("Failed to persist {op} for entry {entry_id}: {source}")]
    Persist {
        entry_id: i64,
        op: &'static str,
        source: AppError,
    },

    #[error("Queue worker stopped")]
    Stopped,
}

pub type ManagerResult<T> = Result<T, ManagerError>;

impl From<ManagerError> for AppError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::EntryNotFound(id) => AppError::entry_not_found(id),
            ManagerError::EntryNotWaiting { entry_id, status } => {
                AppError::new(ErrorCode::QueueEntryNotWaiting)
                    .with_detail("entry_id", entry_id)
                    .with_detail("status", status.as_str())
            }
            ManagerError::EntryNotAssigned { entry_id, status } => {
                AppError::new(ErrorCode::QueueEntryNotAssigned)
                    .with_detail("entry_id", entry_id)
                    .with_detail("status", status.as_str())
            }
            ManagerError::TableNotFound(id) => {
                AppError::new(ErrorCode::TableNotFound).with_detail("table_id", id)
            }
            ManagerError::TableOccupied { table_id, occupant } => {
                AppError::table_occupied(table_id).with_detail("occupant", occupant)
            }
            ManagerError::TableInUse {
                table_id,
                references,
            } => AppError::new(ErrorCode::TableInUse)
                .with_detail("table_id", table_id)
                .with_detail("references", references),
            ManagerError::CapacityExceeded {
                table_id,
                capacity,
                guests,
            } => AppError::new(ErrorCode::TableCapacityExceeded)
                .with_detail("table_id", table_id)
                .with_detail("capacity", capacity)
                .with_detail("guests", guests),
            ManagerError::InvalidTransition { entry_id, source } => {
                source.with_detail("entry_id", entry_id)
            }
            ManagerError::Load { generation, source } => {
                source.with_detail("generation", generation)
            }
            ManagerError::Gateway(e) => e.into(),
            ManagerError::Persist {
                entry_id,
                op,
                source,
            } => source.with_detail("entry_id", entry_id).with_detail("op", op),
            ManagerError::Stopped => AppError::new(ErrorCode::EngineStopped),
        }
    }
}
