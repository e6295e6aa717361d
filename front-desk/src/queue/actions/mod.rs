//! Board transitions
//!
//! Each action implements [`BoardTransition`]: it checks its preconditions
//! against the current board and plans the optimistic change. Planning is
//! pure; the manager worker applies, persists and rolls back.

use enum_dispatch::enum_dispatch;

use super::board::QueueBoard;
use super::manager::{ManagerError, ManagerResult};
use shared::models::{QueueEntry, QueueEntryUpdate};

mod assign;
mod complete;
mod decline;

pub use assign::AssignAction;
pub use complete::CompleteAction;
pub use decline::DeclineAction;

#[cfg(test)]
pub(crate) mod testing;

/// Board state visible to a planning action
pub struct TransitionContext<'a> {
    pub board: &'a QueueBoard,
    /// Reject parties larger than the table capacity
    pub enforce_capacity: bool,
}

/// Planned optimistic change of one entry
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub entry_id: i64,
    /// Operation name for logs and notices
    pub op: &'static str,
    pub before: QueueEntry,
    pub after: QueueEntry,
    /// Patch sent to the backend
    pub patch: QueueEntryUpdate,
}

impl Transition {
    /// Build a transition by applying `patch` to a copy of `before`
    pub(crate) fn plan(
        op: &'static str,
        before: &QueueEntry,
        patch: QueueEntryUpdate,
    ) -> ManagerResult<Self> {
        let mut after = before.clone();
        after
            .apply(&patch)
            .map_err(|source| ManagerError::InvalidTransition {
                entry_id: before.id,
                source,
            })?;
        Ok(Self {
            entry_id: before.id,
            op,
            before: before.clone(),
            after,
            patch,
        })
    }
}

#[enum_dispatch]
pub trait BoardTransition {
    /// Check preconditions and plan the change
    fn plan(&self, ctx: &TransitionContext<'_>) -> ManagerResult<Transition>;
}

/// BoardAction enum - dispatches to concrete action implementations
#[enum_dispatch(BoardTransition)]
#[derive(Debug, Clone)]
pub enum BoardAction {
    Assign(AssignAction),
    Decline(DeclineAction),
    Complete(CompleteAction),
}
