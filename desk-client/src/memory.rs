//! In-process backend
//!
//! Implements both gateway contracts over plain collections, broadcasts a
//! [`ChangeEvent`] for every mutation and supports failure and latency
//! injection. Used by the test suites and by the offline demo mode.

use crate::filter::{Page, QueueFilter, TableFilter, TableOrder};
use crate::gateway::{parse_rows, AuthGateway, AuthSession, AuthUser, ChangeFeed, RemoteGateway};
use crate::{ClientError, ClientResult};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use shared::message::{ChangeChannel, ChangeEvent, ChangeKind};
use shared::models::{
    DiningTable, DiningTableCreate, DiningTableUpdate, QueueEntry, QueueEntryCreate, QueueEntryRow,
    QueueEntryUpdate, Restaurant, StaffProfile,
};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Default)]
struct MemoryState {
    entries: BTreeMap<i64, QueueEntryRow>,
    tables: BTreeMap<i64, DiningTable>,
    restaurants: Vec<Restaurant>,
    profiles: HashMap<Uuid, StaffProfile>,
    /// email -> (password, user id)
    credentials: HashMap<String, (String, Uuid)>,
    /// access token -> user id
    sessions: HashMap<String, Uuid>,
}

/// In-memory implementation of [`RemoteGateway`] and [`AuthGateway`]
#[derive(Debug, Clone)]
pub struct InMemoryGateway {
    state: Arc<Mutex<MemoryState>>,
    events: broadcast::Sender<ChangeEvent>,
    next_id: Arc<AtomicU64>,
    failing_writes: Arc<AtomicUsize>,
    list_delays: Arc<Mutex<VecDeque<Duration>>>,
    list_calls: Arc<AtomicUsize>,
    write_calls: Arc<AtomicUsize>,
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGateway {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            events,
            next_id: Arc::new(AtomicU64::new(1)),
            failing_writes: Arc::new(AtomicUsize::new(0)),
            list_delays: Arc::new(Mutex::new(VecDeque::new())),
            list_calls: Arc::new(AtomicUsize::new(0)),
            write_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) as i64
    }

    fn reserve_id(&self, id: i64) {
        self.next_id.fetch_max(id as u64 + 1, Ordering::SeqCst);
    }

    fn publish(&self, channel: ChangeChannel, kind: ChangeKind, id: i64, slug: &str) {
        // no receivers is fine
        let _ = self
            .events
            .send(ChangeEvent::new(channel, kind, Some(id), Some(slug.to_string())));
    }

    fn take_injected_failure(&self) -> ClientResult<()> {
        let injected = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            tracing::debug!("Injected write failure");
            return Err(ClientError::Api {
                status: 503,
                message: "injected failure".into(),
                details: None,
            });
        }
        Ok(())
    }

    // ========== Seeding ==========

    pub fn seed_restaurant(&self, restaurant: Restaurant) {
        self.state.lock().restaurants.push(restaurant);
    }

    /// Store an entry as-is, keeping its id
    pub fn seed_entry(&self, entry: QueueEntry) -> QueueEntry {
        self.reserve_id(entry.id);
        self.state
            .lock()
            .entries
            .insert(entry.id, QueueEntryRow::from(entry.clone()));
        entry
    }

    /// Store a raw row without validation
    pub fn seed_raw_row(&self, row: QueueEntryRow) {
        self.reserve_id(row.id);
        self.state.lock().entries.insert(row.id, row);
    }

    /// Store a table as-is, keeping its id
    pub fn seed_table(&self, table: DiningTable) -> DiningTable {
        self.reserve_id(table.id);
        self.state.lock().tables.insert(table.id, table.clone());
        table
    }

    /// Register a staff account
    pub fn add_staff(&self, email: &str, password: &str, profile: StaffProfile) {
        let mut state = self.state.lock();
        state
            .credentials
            .insert(email.to_string(), (password.to_string(), profile.id));
        state.profiles.insert(profile.id, profile);
    }

    /// Invalidate a session token server-side
    pub fn revoke_session(&self, access_token: &str) {
        self.state.lock().sessions.remove(access_token);
    }

    // ========== Fault injection ==========

    /// Fail the next `n` writes (queue updates, inserts and table writes)
    pub fn fail_next_writes(&self, n: usize) {
        self.failing_writes.store(n, Ordering::SeqCst);
    }

    /// Delay upcoming `list_queue_entries` calls, one delay per call, in order.
    /// The result is computed before the delay, so a delayed call returns the
    /// data as it was when the call started.
    pub fn delay_next_lists(&self, delays: impl IntoIterator<Item = Duration>) {
        self.list_delays.lock().extend(delays);
    }

    // ========== Inspection ==========

    /// Raw stored state of one entry
    pub fn entry(&self, id: i64) -> Option<QueueEntry> {
        let row = self.state.lock().entries.get(&id).cloned()?;
        QueueEntry::try_from(row).ok()
    }

    pub fn table(&self, id: i64) -> Option<DiningTable> {
        self.state.lock().tables.get(&id).cloned()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    /// Raw broadcast of every mutation, unfiltered
    pub fn events(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }

    fn user_for(&self, session: &AuthSession) -> ClientResult<Uuid> {
        self.state
            .lock()
            .sessions
            .get(&session.access_token)
            .copied()
            .ok_or_else(|| ClientError::Unauthorized("session is no longer valid".into()))
    }
}

#[async_trait]
impl RemoteGateway for InMemoryGateway {
    async fn list_queue_entries(&self, filter: &QueueFilter) -> ClientResult<Vec<QueueEntry>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let rows: Vec<QueueEntryRow> = self.state.lock().entries.values().cloned().collect();
        let mut entries: Vec<QueueEntry> = parse_rows(rows)
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect();
        entries.sort_by_key(|e| (e.created_at, e.id));

        let delay = self.list_delays.lock().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(entries)
    }

    async fn get_queue_entry(&self, id: i64) -> ClientResult<Option<QueueEntry>> {
        let row = self.state.lock().entries.get(&id).cloned();
        Ok(row.and_then(|r| parse_rows(vec![r]).into_iter().next()))
    }

    async fn insert_queue_entry(&self, entry: &QueueEntryCreate) -> ClientResult<QueueEntry> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.take_injected_failure()?;
        entry
            .validate()
            .map_err(|e| ClientError::Validation(e.message))?;

        let created = QueueEntry {
            id: self.allocate_id(),
            name: entry.name.clone(),
            phone: entry.phone.clone(),
            email: entry.email.clone(),
            guests_count: entry.guests_count,
            status: entry.status,
            table_id: None,
            created_at: Utc::now(),
            restaurant_slug: entry.restaurant_slug.clone(),
        };
        self.state
            .lock()
            .entries
            .insert(created.id, QueueEntryRow::from(created.clone()));
        self.publish(
            ChangeChannel::Queues,
            ChangeKind::Insert,
            created.id,
            &created.restaurant_slug,
        );
        Ok(created)
    }

    async fn update_queue_entry(
        &self,
        id: i64,
        update: &QueueEntryUpdate,
    ) -> ClientResult<QueueEntry> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.take_injected_failure()?;

        let updated = {
            let mut state = self.state.lock();
            let row = state
                .entries
                .get(&id)
                .cloned()
                .ok_or_else(|| ClientError::NotFound(format!("queue entry {}", id)))?;
            let mut entry = QueueEntry::try_from(row)
                .map_err(|e| ClientError::InvalidResponse(e.message))?;
            entry
                .apply(update)
                .map_err(|e| ClientError::Conflict(e.message))?;
            state
                .entries
                .insert(id, QueueEntryRow::from(entry.clone()));
            entry
        };
        self.publish(
            ChangeChannel::Queues,
            ChangeKind::Update,
            id,
            &updated.restaurant_slug,
        );
        Ok(updated)
    }

    async fn list_tables(&self, filter: &TableFilter) -> ClientResult<Page<DiningTable>> {
        let mut tables: Vec<DiningTable> = self
            .state
            .lock()
            .tables
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        tables.sort_by_key(|t| (t.created_at, t.id));
        if filter.order == TableOrder::NewestFirst {
            tables.reverse();
        }

        let total = tables.len() as u64;
        let items = match filter.range {
            Some((offset, limit)) => tables
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect(),
            None => tables,
        };
        Ok(Page { items, total })
    }

    async fn insert_table(&self, table: &DiningTableCreate) -> ClientResult<DiningTable> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.take_injected_failure()?;
        let created = DiningTable {
            id: self.allocate_id(),
            name: table.name.clone(),
            capacity: table.capacity,
            color: table.color.clone(),
            restaurant_slug: table.restaurant_slug.clone(),
            created_at: Utc::now(),
        };
        self.state.lock().tables.insert(created.id, created.clone());
        self.publish(
            ChangeChannel::Tables,
            ChangeKind::Insert,
            created.id,
            &created.restaurant_slug,
        );
        Ok(created)
    }

    async fn update_table(
        &self,
        restaurant_slug: &str,
        id: i64,
        update: &DiningTableUpdate,
    ) -> ClientResult<DiningTable> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.take_injected_failure()?;
        let updated = {
            let mut state = self.state.lock();
            let table = state
                .tables
                .get_mut(&id)
                .filter(|t| t.restaurant_slug == restaurant_slug)
                .ok_or_else(|| ClientError::NotFound(format!("table {}", id)))?;
            update.apply_to(table);
            table.clone()
        };
        self.publish(
            ChangeChannel::Tables,
            ChangeKind::Update,
            id,
            &updated.restaurant_slug,
        );
        Ok(updated)
    }

    async fn delete_table(&self, restaurant_slug: &str, id: i64) -> ClientResult<()> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.take_injected_failure()?;
        let removed = {
            let mut state = self.state.lock();
            let owned = state
                .tables
                .get(&id)
                .is_some_and(|t| t.restaurant_slug == restaurant_slug);
            if !owned {
                return Err(ClientError::NotFound(format!("table {}", id)));
            }
            // foreign key from queues.table_id
            let referenced = state
                .entries
                .values()
                .any(|row| row.table_id == Some(id));
            if referenced {
                return Err(ClientError::Conflict(format!(
                    "table {} is still referenced from queues",
                    id
                )));
            }
            state
                .tables
                .remove(&id)
                .ok_or_else(|| ClientError::NotFound(format!("table {}", id)))?
        };
        self.publish(
            ChangeChannel::Tables,
            ChangeKind::Delete,
            id,
            &removed.restaurant_slug,
        );
        Ok(())
    }

    async fn count_table_references(&self, table_id: i64) -> ClientResult<u64> {
        let count = self
            .state
            .lock()
            .entries
            .values()
            .filter(|row| row.table_id == Some(table_id))
            .count();
        Ok(count as u64)
    }

    async fn get_restaurant(&self, slug: &str) -> ClientResult<Option<Restaurant>> {
        Ok(self
            .state
            .lock()
            .restaurants
            .iter()
            .find(|r| r.slug == slug)
            .cloned())
    }

    async fn get_profile(&self, user_id: Uuid) -> ClientResult<Option<StaffProfile>> {
        Ok(self.state.lock().profiles.get(&user_id).cloned())
    }

    async fn subscribe(
        &self,
        channel: ChangeChannel,
        restaurant_slug: &str,
    ) -> ClientResult<ChangeFeed> {
        let (tx, rx) = mpsc::channel(EVENT_CAPACITY);
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let mut events = self.events.subscribe();
        let slug = restaurant_slug.to_string();

        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = token.cancelled() => break,
                    event = events.recv() => event,
                };
                match event {
                    Ok(event) if event.matches(channel, &slug) => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Change subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(ChangeFeed::new(rx, cancel))
    }
}

#[async_trait]
impl AuthGateway for InMemoryGateway {
    async fn sign_in(&self, email: &str, password: &str) -> ClientResult<AuthSession> {
        let mut state = self.state.lock();
        let user_id = match state.credentials.get(email) {
            Some((stored, id)) if stored == password => *id,
            _ => return Err(ClientError::Unauthorized("Invalid login credentials".into())),
        };
        let access_token = Uuid::new_v4().to_string();
        state.sessions.insert(access_token.clone(), user_id);
        Ok(AuthSession {
            access_token,
            refresh_token: None,
            expires_at: Some(Utc::now().timestamp() + 3600),
            user: AuthUser {
                id: user_id,
                email: Some(email.to_string()),
            },
        })
    }

    async fn current_user(&self, session: &AuthSession) -> ClientResult<AuthUser> {
        let id = self.user_for(session)?;
        let email = self
            .state
            .lock()
            .credentials
            .iter()
            .find(|(_, (_, uid))| *uid == id)
            .map(|(email, _)| email.clone());
        Ok(AuthUser { id, email })
    }

    async fn sign_out(&self, session: &AuthSession) -> ClientResult<()> {
        self.revoke_session(&session.access_token);
        Ok(())
    }

    async fn update_password(
        &self,
        session: &AuthSession,
        new_password: &str,
    ) -> ClientResult<()> {
        let id = self.user_for(session)?;
        let mut state = self.state.lock();
        if let Some((password, _)) = state.credentials.values_mut().find(|(_, uid)| *uid == id) {
            *password = new_password.to_string();
        }
        Ok(())
    }
}
