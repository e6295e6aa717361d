//! QueueManager - handle to the queue assignment engine
//!
//! One manager per admin session. The handle is cheap to clone; every
//! clone talks to the same single-writer worker.
//!
//! # Channels
//!
//! ```text
//! QueueManager ──mpsc<Command>──▶ Worker ──watch<Arc<QueueBoard>>──▶ readers
//!                                   │
//!                                   └──broadcast<BoardNotice>──▶ notice listeners
//! ```

mod error;
mod worker;

pub use error::*;

use super::actions::{AssignAction, BoardAction, CompleteAction, DeclineAction};
use super::board::QueueBoard;
use super::position::{estimate_for, LinearEstimator, QueueEstimate, WaitEstimator};
use super::subscription::{self, ChangeSubscription};
use super::ticker::Clock;
use crate::core::Config;
use crate::utils::format::format_elapsed;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use desk_client::RemoteGateway;
use serde::Serialize;
use shared::error::AppError;
use shared::models::QueueEntry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use worker::{Command, Worker};

/// Pending command capacity
const COMMAND_CHANNEL_CAPACITY: usize = 256;

/// Notice broadcast capacity
const NOTICE_CHANNEL_CAPACITY: usize = 64;

/// Engine settings
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// 业务时区, defines "today"
    pub tz: Tz,
    pub enforce_capacity: bool,
    /// Heartbeat period
    pub tick_interval: Duration,
    pub wait_per_party: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tz: chrono_tz::UTC,
            enforce_capacity: false,
            tick_interval: Duration::from_secs(1),
            wait_per_party: Duration::from_secs(10 * 60),
        }
    }
}

impl From<&Config> for EngineConfig {
    fn from(config: &Config) -> Self {
        Self {
            tz: config.timezone,
            enforce_capacity: config.enforce_capacity,
            tick_interval: config.tick_interval(),
            wait_per_party: config.wait_per_party(),
        }
    }
}

/// Result of a load request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoadOutcome {
    Applied {
        generation: u64,
        pending: usize,
        assigned: usize,
    },
    /// A newer load or a confirmed write superseded this one
    Discarded { generation: u64 },
}

impl LoadOutcome {
    pub fn generation(&self) -> u64 {
        match self {
            LoadOutcome::Applied { generation, .. } | LoadOutcome::Discarded { generation } => {
                *generation
            }
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, LoadOutcome::Applied { .. })
    }
}

/// Out-of-band engine notices
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoardNotice {
    Reloaded {
        generation: u64,
    },
    StaleLoadDiscarded {
        generation: u64,
    },
    LoadFailed {
        generation: u64,
        error: AppError,
    },
    /// Optimistic change rolled back
    PersistFailed {
        entry_id: i64,
        op: &'static str,
        error: AppError,
    },
}

/// Handle to a running queue engine
#[derive(Clone)]
pub struct QueueManager {
    cmd_tx: mpsc::Sender<Command>,
    board_rx: watch::Receiver<Arc<QueueBoard>>,
    notice_tx: broadcast::Sender<BoardNotice>,
    gateway: Arc<dyn RemoteGateway>,
    restaurant_slug: Arc<str>,
    config: EngineConfig,
    estimator: Arc<dyn WaitEstimator>,
    clock: Clock,
    cancel: CancellationToken,
}

impl std::fmt::Debug for QueueManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueManager")
            .field("restaurant_slug", &self.restaurant_slug)
            .field("config", &self.config)
            .field("estimator", &self.estimator)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

impl QueueManager {
    /// Start the worker and heartbeat for one tenant
    ///
    /// Must be called inside a tokio runtime. The board starts empty; call
    /// [`load_today`](Self::load_today) to fill it.
    pub fn spawn(
        gateway: Arc<dyn RemoteGateway>,
        restaurant_slug: impl Into<String>,
        config: EngineConfig,
    ) -> Self {
        let estimator = Arc::new(LinearEstimator::new(
            chrono::Duration::from_std(config.wait_per_party)
                .unwrap_or_else(|_| chrono::Duration::minutes(10)),
        ));
        Self::spawn_with_estimator(gateway, restaurant_slug, config, estimator)
    }

    pub fn spawn_with_estimator(
        gateway: Arc<dyn RemoteGateway>,
        restaurant_slug: impl Into<String>,
        config: EngineConfig,
        estimator: Arc<dyn WaitEstimator>,
    ) -> Self {
        let restaurant_slug: String = restaurant_slug.into();
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (board_tx, board_rx) = watch::channel(Arc::new(QueueBoard::new(&restaurant_slug)));
        let (notice_tx, _) = broadcast::channel(NOTICE_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();
        let clock = Clock::new();

        let worker = Worker::new(
            gateway.clone(),
            &restaurant_slug,
            config.clone(),
            board_tx,
            notice_tx.clone(),
        );
        tokio::spawn(worker.run(cmd_rx, cancel.clone()));
        clock.spawn_heartbeat(config.tick_interval, cancel.clone());

        Self {
            cmd_tx,
            board_rx,
            notice_tx,
            gateway,
            restaurant_slug: restaurant_slug.into(),
            config,
            estimator,
            clock,
            cancel,
        }
    }

    pub fn restaurant_slug(&self) -> &str {
        &self.restaurant_slug
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ========== Commands ==========

    /// Load today's active entries and all tables
    pub async fn load_today(&self) -> ManagerResult<LoadOutcome> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Reload { reply: Some(reply) }).await?;
        rx.await.map_err(|_| ManagerError::Stopped)?
    }

    /// Fire-and-forget reload, used by change subscriptions
    pub(crate) fn request_reload(&self) -> ManagerResult<()> {
        match self.cmd_tx.try_send(Command::Reload { reply: None }) {
            Ok(()) => Ok(()),
            // a queued command will publish anyway; a reload follows every write
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("Command queue full, dropping reload request");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(ManagerError::Stopped),
        }
    }

    pub async fn assign(&self, entry_id: i64, table_id: i64) -> ManagerResult<QueueEntry> {
        self.transition(BoardAction::Assign(AssignAction { entry_id, table_id }))
            .await
    }

    pub async fn decline(&self, entry_id: i64) -> ManagerResult<QueueEntry> {
        self.transition(BoardAction::Decline(DeclineAction { entry_id }))
            .await
    }

    pub async fn complete(&self, entry_id: i64) -> ManagerResult<QueueEntry> {
        self.transition(BoardAction::Complete(CompleteAction { entry_id }))
            .await
    }

    /// Delete a table after the occupancy and reference guards
    pub async fn delete_table(&self, table_id: i64) -> ManagerResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::DeleteTable { table_id, reply }).await?;
        rx.await.map_err(|_| ManagerError::Stopped)?
    }

    async fn transition(&self, action: BoardAction) -> ManagerResult<QueueEntry> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Transition { action, reply }).await?;
        rx.await.map_err(|_| ManagerError::Stopped)?
    }

    async fn send(&self, cmd: Command) -> ManagerResult<()> {
        self.cmd_tx.send(cmd).await.map_err(|_| ManagerError::Stopped)
    }

    /// Reload on every change to this tenant's queues or tables
    pub async fn subscribe_to_changes(&self) -> ManagerResult<ChangeSubscription> {
        subscription::spawn(self.clone(), self.gateway.clone(), self.cancel.child_token()).await
    }

    // ========== Readers ==========

    /// Latest board snapshot
    pub fn board(&self) -> Arc<QueueBoard> {
        self.board_rx.borrow().clone()
    }

    pub fn watch_board(&self) -> watch::Receiver<Arc<QueueBoard>> {
        self.board_rx.clone()
    }

    pub fn notices(&self) -> broadcast::Receiver<BoardNotice> {
        self.notice_tx.subscribe()
    }

    // ========== Clock ==========

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Advance the heartbeat reference to the wall clock
    pub fn tick(&self) -> DateTime<Utc> {
        self.clock.tick()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Wait so far, e.g. `3m 5s`
    pub fn elapsed_label(&self, entry: &QueueEntry) -> String {
        format_elapsed(entry.created_at, self.clock.now())
    }

    /// Position and estimated wait of a waiting entry on the board
    pub fn estimate(&self, entry_id: i64) -> Option<QueueEstimate> {
        let board = self.board();
        let target = board.entry(entry_id)?;
        estimate_for(board.entries(), target, self.config.tz, self.estimator.as_ref())
    }

    // ========== Lifecycle ==========

    /// Stop the worker, heartbeat and every subscription
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled() || self.cmd_tx.is_closed()
    }
}

#[cfg(test)]
mod tests;
