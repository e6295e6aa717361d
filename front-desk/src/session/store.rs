//! redb-based durable local store
//!
//! Survives restarts of the front desk process; holds the guest's
//! reservation id and the admin's profile snapshot and auth session.
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `session` | `&str` | JSON | Session values by well-known key |

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Serialize, de::DeserializeOwned};
use shared::error::{AppError, ErrorCode};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Table for session values: key = well-known name, value = JSON
const SESSION_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("session");

/// Guest's active reservation (restaurant slug plus queue entry id)
pub const RESERVATION_KEY: &str = "reservation";
/// Signed-in staff profile snapshot
pub const ADMIN_PROFILE_KEY: &str = "admin_profile";
/// Backend auth session
pub const AUTH_SESSION_KEY: &str = "auth_session";

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::with_message(ErrorCode::StorageError, err.to_string())
    }
}

/// Key/value store of JSON values
#[derive(Clone)]
pub struct LocalStore {
    db: Arc<Database>,
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore").finish_non_exhaustive()
    }
}

impl LocalStore {
    /// Open or create the store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let db = Database::create(path)?;
        tracing::debug!(path = %path.display(), "Local store opened");
        Self::init(db)
    }

    /// In-memory store (tests, offline demo)
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StoreResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(SESSION_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SESSION_TABLE)?;
        match table.get(key)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        let bytes = serde_json::to_vec(value)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(SESSION_TABLE)?;
            table.insert(key, bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Remove a key; returns whether it existed
    pub fn remove(&self, key: &str) -> StoreResult<bool> {
        let txn = self.db.begin_write()?;
        let existed = {
            let mut table = txn.open_table(SESSION_TABLE)?;
            let removed = table.remove(key)?;
            removed.is_some()
        };
        txn.commit()?;
        Ok(existed)
    }

    pub fn contains(&self, key: &str) -> StoreResult<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SESSION_TABLE)?;
        Ok(table.get(key)?.is_some())
    }

    /// Remove every key
    pub fn clear(&self) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(SESSION_TABLE)?;
            table.retain(|_, _| false)?;
        }
        txn.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_remove() {
        let store = LocalStore::open_in_memory().unwrap();
        assert_eq!(store.get::<i64>(RESERVATION_KEY).unwrap(), None);

        store.put(RESERVATION_KEY, &42i64).unwrap();
        assert_eq!(store.get::<i64>(RESERVATION_KEY).unwrap(), Some(42));
        assert!(store.contains(RESERVATION_KEY).unwrap());

        assert!(store.remove(RESERVATION_KEY).unwrap());
        assert!(!store.remove(RESERVATION_KEY).unwrap());
        assert_eq!(store.get::<i64>(RESERVATION_KEY).unwrap(), None);
    }

    #[test]
    fn test_clear() {
        let store = LocalStore::open_in_memory().unwrap();
        store.put(ADMIN_PROFILE_KEY, &"profile").unwrap();
        store.put(AUTH_SESSION_KEY, &"session").unwrap();
        store.clear().unwrap();
        assert!(!store.contains(ADMIN_PROFILE_KEY).unwrap());
        assert!(!store.contains(AUTH_SESSION_KEY).unwrap());
    }

    #[test]
    fn test_type_mismatch_is_serialization_error() {
        let store = LocalStore::open_in_memory().unwrap();
        store.put(RESERVATION_KEY, &"not a number").unwrap();
        let err = store.get::<i64>(RESERVATION_KEY).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::StorageError);
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.redb");
        {
            let store = LocalStore::open(&path).unwrap();
            store.put(RESERVATION_KEY, &7i64).unwrap();
        }
        let store = LocalStore::open(&path).unwrap();
        assert_eq!(store.get::<i64>(RESERVATION_KEY).unwrap(), Some(7));
    }
}
