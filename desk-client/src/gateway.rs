//! Gateway contracts
//!
//! [`RemoteGateway`] covers the data collections and change notifications,
//! [`AuthGateway`] covers credential sign-in and session management.

use crate::filter::{Page, QueueFilter, TableFilter};
use crate::ClientResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::message::{ChangeChannel, ChangeEvent};
use shared::models::{
    DiningTable, DiningTableCreate, DiningTableUpdate, QueueEntry, QueueEntryCreate, QueueEntryRow,
    QueueEntryUpdate, Restaurant, StaffProfile,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Data access to the hosted backend
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Filtered read of queue entries, ascending `created_at`
    async fn list_queue_entries(&self, filter: &QueueFilter) -> ClientResult<Vec<QueueEntry>>;

    async fn get_queue_entry(&self, id: i64) -> ClientResult<Option<QueueEntry>>;

    async fn insert_queue_entry(&self, entry: &QueueEntryCreate) -> ClientResult<QueueEntry>;

    async fn update_queue_entry(
        &self,
        id: i64,
        update: &QueueEntryUpdate,
    ) -> ClientResult<QueueEntry>;

    /// Filtered read of tables with the exact total count
    async fn list_tables(&self, filter: &TableFilter) -> ClientResult<Page<DiningTable>>;

    async fn insert_table(&self, table: &DiningTableCreate) -> ClientResult<DiningTable>;

    /// Update one of the restaurant's tables; `NotFound` when the id is
    /// unknown or owned by another restaurant
    async fn update_table(
        &self,
        restaurant_slug: &str,
        id: i64,
        update: &DiningTableUpdate,
    ) -> ClientResult<DiningTable>;

    /// Delete one of the restaurant's tables, same scoping as `update_table`
    async fn delete_table(&self, restaurant_slug: &str, id: i64) -> ClientResult<()>;

    /// Number of queue entries (any status) referencing a table
    async fn count_table_references(&self, table_id: i64) -> ClientResult<u64>;

    async fn get_restaurant(&self, slug: &str) -> ClientResult<Option<Restaurant>>;

    async fn get_profile(&self, user_id: Uuid) -> ClientResult<Option<StaffProfile>>;

    /// Change notifications for one collection, scoped to a tenant
    async fn subscribe(
        &self,
        channel: ChangeChannel,
        restaurant_slug: &str,
    ) -> ClientResult<ChangeFeed>;
}

/// Credential sign-in and session management
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> ClientResult<AuthSession>;

    /// User behind a session; fails with `Unauthorized` when it is no longer valid
    async fn current_user(&self, session: &AuthSession) -> ClientResult<AuthUser>;

    async fn sign_out(&self, session: &AuthSession) -> ClientResult<()>;

    async fn update_password(&self, session: &AuthSession, new_password: &str)
    -> ClientResult<()>;
}

/// Authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Signed-in session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Expiry as unix seconds
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl AuthSession {
    pub fn is_expired_at(&self, now_secs: i64) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now_secs)
    }
}

/// Stream of change notifications
///
/// Dropping the feed stops the producer behind it.
#[derive(Debug)]
pub struct ChangeFeed {
    rx: mpsc::Receiver<ChangeEvent>,
    cancel: CancellationToken,
}

impl ChangeFeed {
    pub fn new(rx: mpsc::Receiver<ChangeEvent>, cancel: CancellationToken) -> Self {
        Self { rx, cancel }
    }

    /// Next event; `None` once the producer has stopped
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }

    pub fn close(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ChangeFeed {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Validate raw rows at the boundary; rejected rows are logged and skipped
pub fn parse_rows(rows: Vec<QueueEntryRow>) -> Vec<QueueEntry> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            match QueueEntry::try_from(row) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(entry_id = id, code = %e.code, "Skipping invalid queue row: {}", e);
                    None
                }
            }
        })
        .collect()
}
