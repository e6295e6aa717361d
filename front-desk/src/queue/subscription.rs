//! Change subscription
//!
//! Every tenant-scoped change on `queues` or `tables` triggers a full reload
//! of today's board; events are never patched in incrementally.

use super::manager::{ManagerResult, QueueManager};
use desk_client::{ChangeFeed, RemoteGateway};
use shared::message::{ChangeChannel, ChangeEvent};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Running subscription; dropping it does not stop it, call [`close`](Self::close)
#[derive(Debug)]
pub struct ChangeSubscription {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl ChangeSubscription {
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.handle.is_finished()
    }

    /// Close and wait for the listener to exit
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
    }
}

pub(super) async fn spawn(
    manager: QueueManager,
    gateway: Arc<dyn RemoteGateway>,
    cancel: CancellationToken,
) -> ManagerResult<ChangeSubscription> {
    let slug = manager.restaurant_slug().to_string();
    let queues = gateway.subscribe(ChangeChannel::Queues, &slug).await?;
    let tables = gateway.subscribe(ChangeChannel::Tables, &slug).await?;
    tracing::info!(restaurant = %slug, "Subscribed to queue and table changes");

    let token = cancel.clone();
    let handle = tokio::spawn(listen(manager, queues, tables, token));
    Ok(ChangeSubscription { cancel, handle })
}

async fn listen(
    manager: QueueManager,
    mut queues: ChangeFeed,
    mut tables: ChangeFeed,
    cancel: CancellationToken,
) {
    let mut queues_open = true;
    let mut tables_open = true;
    while queues_open || tables_open {
        let event: Option<ChangeEvent> = tokio::select! {
            _ = cancel.cancelled() => break,
            event = queues.recv(), if queues_open => {
                if event.is_none() {
                    tracing::warn!("Queue change feed closed");
                    queues_open = false;
                }
                event
            }
            event = tables.recv(), if tables_open => {
                if event.is_none() {
                    tracing::warn!("Table change feed closed");
                    tables_open = false;
                }
                event
            }
        };
        let Some(event) = event else { continue };
        tracing::debug!(%event, "Change received, reloading");
        if manager.request_reload().is_err() {
            break;
        }
    }
    queues.close();
    tables.close();
    tracing::debug!(restaurant = %manager.restaurant_slug(), "Change subscription stopped");
}
