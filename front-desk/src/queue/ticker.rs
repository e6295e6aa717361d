//! Heartbeat clock
//!
//! `now` only feeds elapsed-wait labels; it never touches persisted data.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Shared `now` reference updated by the heartbeat
#[derive(Debug, Clone)]
pub struct Clock {
    tx: Arc<watch::Sender<DateTime<Utc>>>,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    pub fn starting_at(now: DateTime<Utc>) -> Self {
        let (tx, _) = watch::channel(now);
        Self { tx: Arc::new(tx) }
    }

    pub fn now(&self) -> DateTime<Utc> {
        *self.tx.borrow()
    }

    /// Advance to the wall clock
    pub fn tick(&self) -> DateTime<Utc> {
        self.set(Utc::now())
    }

    pub fn set(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.tx.send_replace(now);
        now
    }

    pub fn watch(&self) -> watch::Receiver<DateTime<Utc>> {
        self.tx.subscribe()
    }

    /// Tick every `interval` until cancelled
    pub fn spawn_heartbeat(
        &self,
        interval: Duration,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let clock = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        clock.tick();
                    }
                }
            }
            tracing::debug!("Heartbeat stopped");
        })
    }
}
