//! Complete a seated party, freeing its table

use super::{BoardTransition, Transition, TransitionContext};
use crate::queue::manager::{ManagerError, ManagerResult};
use shared::models::{QueueEntryUpdate, QueueStatus};

#[derive(Debug, Clone)]
pub struct CompleteAction {
    pub entry_id: i64,
}

impl BoardTransition for CompleteAction {
    fn plan(&self, ctx: &TransitionContext<'_>) -> ManagerResult<Transition> {
        let entry = ctx
            .board
            .entry(self.entry_id)
            .ok_or(ManagerError::EntryNotFound(self.entry_id))?;
        if !entry.is_assigned() {
            return Err(ManagerError::EntryNotAssigned {
                entry_id: entry.id,
                status: entry.status,
            });
        }
        // table_id is kept on completed rows
        Transition::plan(
            "complete",
            entry,
            QueueEntryUpdate::status(QueueStatus::Completed),
        )
    }
}
