//! Single-writer worker
//!
//! Owns the [`QueueBoard`]. Commands are handled strictly in arrival order;
//! loads run as spawned tasks and re-enter through a private channel tagged
//! with their generation.
//!
//! ```text
//! Transition(action)
//!     ├─ 1. plan against current board (preconditions)
//!     ├─ 2. apply optimistic record, publish
//!     ├─ 3. persist through gateway (inline, keeps writes ordered)
//!     ├─ 4a. ok  → apply confirmed record, discard in-flight loads
//!     └─ 4b. err → rollback, broadcast PersistFailed, request reload
//! ```

use super::{BoardNotice, EngineConfig, LoadOutcome, ManagerError, ManagerResult};
use crate::queue::actions::{BoardAction, BoardTransition, Transition, TransitionContext};
use crate::queue::board::QueueBoard;
use crate::utils::time::{day_bounds, today};
use desk_client::{ClientResult, QueueFilter, RemoteGateway, TableFilter};
use shared::error::AppError;
use shared::models::{DiningTable, QueueEntry, QueueStatus};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

pub(super) type LoadReply = oneshot::Sender<ManagerResult<LoadOutcome>>;

pub(super) enum Command {
    Reload {
        reply: Option<LoadReply>,
    },
    Transition {
        action: BoardAction,
        reply: oneshot::Sender<ManagerResult<QueueEntry>>,
    },
    DeleteTable {
        table_id: i64,
        reply: oneshot::Sender<ManagerResult<()>>,
    },
}

struct Loaded {
    generation: u64,
    result: ClientResult<(Vec<QueueEntry>, Vec<DiningTable>)>,
    reply: Option<LoadReply>,
}

pub(super) struct Worker {
    gateway: Arc<dyn RemoteGateway>,
    config: EngineConfig,
    board: QueueBoard,
    board_tx: watch::Sender<Arc<QueueBoard>>,
    notice_tx: broadcast::Sender<BoardNotice>,
    load_tx: mpsc::UnboundedSender<Loaded>,
    load_rx: mpsc::UnboundedReceiver<Loaded>,
    /// Last generation handed out
    requested: u64,
    /// Loads up to this generation started before a confirmed write
    discard_through: u64,
}

impl Worker {
    pub(super) fn new(
        gateway: Arc<dyn RemoteGateway>,
        restaurant_slug: &str,
        config: EngineConfig,
        board_tx: watch::Sender<Arc<QueueBoard>>,
        notice_tx: broadcast::Sender<BoardNotice>,
    ) -> Self {
        let (load_tx, load_rx) = mpsc::unbounded_channel();
        Self {
            gateway,
            config,
            board: QueueBoard::new(restaurant_slug),
            board_tx,
            notice_tx,
            load_tx,
            load_rx,
            requested: 0,
            discard_through: 0,
        }
    }

    pub(super) async fn run(mut self, mut commands: mpsc::Receiver<Command>, cancel: CancellationToken) {
        tracing::info!(restaurant = %self.board.restaurant_slug(), "Queue worker started");
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                Some(loaded) = self.load_rx.recv() => self.on_loaded(loaded),
                cmd = commands.recv() => match cmd {
                    Some(cmd) => self.handle(cmd).await,
                    None => break,
                },
            }
        }
        tracing::info!(restaurant = %self.board.restaurant_slug(), "Queue worker stopped");
    }

    async fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Reload { reply } => self.request_load(reply),
            Command::Transition { action, reply } => {
                let result = self.transition(action).await;
                let _ = reply.send(result);
            }
            Command::DeleteTable { table_id, reply } => {
                let result = self.delete_table(table_id).await;
                let _ = reply.send(result);
            }
        }
    }

    // ========== Loads ==========

    fn request_load(&mut self, reply: Option<LoadReply>) {
        self.requested += 1;
        let generation = self.requested;
        let gateway = self.gateway.clone();
        let tx = self.load_tx.clone();
        let slug = self.board.restaurant_slug().to_string();
        let (from, before) = day_bounds(today(self.config.tz), self.config.tz);
        tracing::debug!(generation, %from, %before, "Loading today's queue");

        tokio::spawn(async move {
            let entries_filter = QueueFilter::new()
                .restaurant(slug.clone())
                .statuses(QueueStatus::ACTIVE)
                .created_between(from, before);
            let tables_filter = TableFilter::new().restaurant(slug);
            let result = tokio::try_join!(
                gateway.list_queue_entries(&entries_filter),
                gateway.list_tables(&tables_filter),
            )
            .map(|(entries, tables)| (entries, tables.items));
            let _ = tx.send(Loaded {
                generation,
                result,
                reply,
            });
        });
    }

    fn on_loaded(&mut self, loaded: Loaded) {
        let Loaded {
            generation,
            result,
            reply,
        } = loaded;

        let outcome = match result {
            Err(e) => {
                tracing::error!(generation, error = %e, "Failed to load queue");
                let app: AppError = e.into();
                let _ = self.notice_tx.send(BoardNotice::LoadFailed {
                    generation,
                    error: app.clone(),
                });
                if let Some(reply) = reply {
                    let _ = reply.send(Err(ManagerError::Load {
                        generation,
                        source: app,
                    }));
                }
                return;
            }
            Ok(_) if generation <= self.board.generation() || generation <= self.discard_through => {
                tracing::debug!(
                    generation,
                    applied = self.board.generation(),
                    discard_through = self.discard_through,
                    "Discarding stale load"
                );
                let _ = self
                    .notice_tx
                    .send(BoardNotice::StaleLoadDiscarded { generation });
                LoadOutcome::Discarded { generation }
            }
            Ok((entries, tables)) => {
                self.board.replace_all(entries, tables, generation);
                let pending = self.board.pending().count();
                let assigned = self.board.assigned().count();
                tracing::debug!(generation, pending, assigned, "Queue loaded");
                self.publish();
                let _ = self.notice_tx.send(BoardNotice::Reloaded { generation });
                LoadOutcome::Applied {
                    generation,
                    pending,
                    assigned,
                }
            }
        };
        if let Some(reply) = reply {
            let _ = reply.send(Ok(outcome));
        }
    }

    // ========== Transitions ==========

    async fn transition(&mut self, action: BoardAction) -> ManagerResult<QueueEntry> {
        let ctx = TransitionContext {
            board: &self.board,
            enforce_capacity: self.config.enforce_capacity,
        };
        let transition = action.plan(&ctx)?;

        self.board.apply_record(transition.after.clone());
        self.publish();

        match self
            .gateway
            .update_queue_entry(transition.entry_id, &transition.patch)
            .await
        {
            Ok(confirmed) => {
                tracing::info!(
                    entry_id = confirmed.id,
                    op = transition.op,
                    status = %confirmed.status,
                    table_id = ?confirmed.table_id,
                    "Queue entry updated"
                );
                self.board.apply_record(confirmed.clone());
                if self.requested > self.board.generation() {
                    // in-flight loads may predate this write
                    self.discard_through = self.requested;
                    self.request_load(None);
                }
                self.publish();
                Ok(confirmed)
            }
            Err(e) => Err(self.roll_back(transition, e.into())),
        }
    }

    fn roll_back(&mut self, transition: Transition, error: AppError) -> ManagerError {
        tracing::error!(
            entry_id = transition.entry_id,
            op = transition.op,
            error = %error,
            "Failed to persist queue change, rolling back"
        );
        let restored = self.board.rollback(&transition);
        if restored {
            self.publish();
        }
        let _ = self.notice_tx.send(BoardNotice::PersistFailed {
            entry_id: transition.entry_id,
            op: transition.op,
            error: error.clone(),
        });
        self.request_load(None);
        ManagerError::Persist {
            entry_id: transition.entry_id,
            op: transition.op,
            source: error,
        }
    }

    // ========== Tables ==========

    async fn delete_table(&mut self, table_id: i64) -> ManagerResult<()> {
        // the board only ever holds this restaurant's tables
        if self.board.table(table_id).is_none() {
            return Err(ManagerError::TableNotFound(table_id));
        }
        if let Some(occupant) = self.board.occupant(table_id) {
            return Err(ManagerError::TableOccupied {
                table_id,
                occupant: occupant.id,
            });
        }
        let references = self.gateway.count_table_references(table_id).await?;
        if references > 0 {
            return Err(ManagerError::TableInUse {
                table_id,
                references,
            });
        }
        self.gateway
            .delete_table(self.board.restaurant_slug(), table_id)
            .await?;
        tracing::info!(table_id, "Table deleted");
        if self.board.remove_table(table_id) {
            self.publish();
        }
        Ok(())
    }

    fn publish(&self) {
        if let Err(violation) = self.board.check_invariants() {
            tracing::warn!(generation = self.board.generation(), %violation, "Board invariant violated");
        }
        self.board_tx.send_replace(Arc::new(self.board.clone()));
    }
}
