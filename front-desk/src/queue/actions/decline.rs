//! Decline (cancel) a waiting party

use super::{BoardTransition, Transition, TransitionContext};
use crate::queue::manager::{ManagerError, ManagerResult};
use shared::models::{QueueEntryUpdate, QueueStatus};

#[derive(Debug, Clone)]
pub struct DeclineAction {
    pub entry_id: i64,
}

impl BoardTransition for DeclineAction {
    fn plan(&self, ctx: &TransitionContext<'_>) -> ManagerResult<Transition> {
        let entry = ctx
            .board
            .entry(self.entry_id)
            .ok_or(ManagerError::EntryNotFound(self.entry_id))?;
        if !entry.is_waiting() {
            return Err(ManagerError::EntryNotWaiting {
                entry_id: entry.id,
                status: entry.status,
            });
        }
        Transition::plan(
            "decline",
            entry,
            QueueEntryUpdate::status(QueueStatus::Cancelled),
        )
    }
}
