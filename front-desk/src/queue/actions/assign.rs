//! Assign a waiting party to a free table

use super::{BoardTransition, Transition, TransitionContext};
use crate::queue::manager::{ManagerError, ManagerResult};
use shared::models::QueueEntryUpdate;

#[derive(Debug, Clone)]
pub struct AssignAction {
    pub entry_id: i64,
    pub table_id: i64,
}

impl BoardTransition for AssignAction {
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

        let table = ctx
            .board
            .table(self.table_id)
            .ok_or(ManagerError::TableNotFound(self.table_id))?;
        if let Some(occupant) = ctx.board.occupant(table.id) {
            return Err(ManagerError::TableOccupied {
                table_id: table.id,
                occupant: occupant.id,
            });
        }
        if ctx.enforce_capacity && !table.fits(entry.guests_count) {
            return Err(ManagerError::CapacityExceeded {
                table_id: table.id,
                capacity: table.capacity,
                guests: entry.guests_count,
            });
        }

        Transition::plan("assign", entry, QueueEntryUpdate::assign(table.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::actions::testing::{board, entry, table};
    use shared::models::QueueStatus;

    fn ctx(board: &crate::queue::QueueBoard) -> TransitionContext<'_> {
        TransitionContext {
            board,
            enforce_capacity: false,
        }
    }

    #[test]
    fn test_assign_plans_seating() {
        let board = board(
            vec![entry(7, 0, 4, QueueStatus::Waiting, None)],
            vec![table(2, 4)],
        );
        let t = AssignAction {
            entry_id: 7,
            table_id: 2,
        }
        .plan(&ctx(&board))
        .unwrap();
        assert_eq!(t.after.status, QueueStatus::Assigned);
        assert_eq!(t.after.table_id, Some(2));
        assert_eq!(t.before.status, QueueStatus::Waiting);
        assert_eq!(t.op, "assign");
    }

    #[test]
    fn test_assign_rejects_occupied_table() {
        let board = board(
            vec![
                entry(1, 0, 2, QueueStatus::Assigned, Some(2)),
                entry(7, 5, 2, QueueStatus::Waiting, None),
            ],
            vec![table(2, 4)],
        );
        let err = AssignAction {
            entry_id: 7,
            table_id: 2,
        }
        .plan(&ctx(&board))
        .unwrap_err();
        assert!(matches!(
            err,
            ManagerError::TableOccupied {
                table_id: 2,
                occupant: 1
            }
        ));
    }

    #[test]
    fn test_assign_rejects_non_pending() {
        let board = board(
            vec![entry(1, 0, 2, QueueStatus::Assigned, Some(2))],
            vec![table(2, 4), table(3, 4)],
        );
        let err = AssignAction {
            entry_id: 1,
            table_id: 3,
        }
        .plan(&ctx(&board))
        .unwrap_err();
        assert!(matches!(err, ManagerError::EntryNotWaiting { entry_id: 1, .. }));

        let err = AssignAction {
            entry_id: 99,
            table_id: 3,
        }
        .plan(&ctx(&board))
        .unwrap_err();
        assert!(matches!(err, ManagerError::EntryNotFound(99)));
    }

    #[test]
    fn test_assign_unknown_table() {
        let board = board(vec![entry(7, 0, 2, QueueStatus::Waiting, None)], vec![]);
        let err = AssignAction {
            entry_id: 7,
            table_id: 5,
        }
        .plan(&ctx(&board))
        .unwrap_err();
        assert!(matches!(err, ManagerError::TableNotFound(5)));
    }

    #[test]
    fn test_capacity_only_checked_when_enforced() {
        let board = board(
            vec![entry(7, 0, 6, QueueStatus::Waiting, None)],
            vec![table(2, 4)],
        );
        let action = AssignAction {
            entry_id: 7,
            table_id: 2,
        };
        assert!(action.plan(&ctx(&board)).is_ok());

        let strict = TransitionContext {
            board: &board,
            enforce_capacity: true,
        };
        assert!(matches!(
            action.plan(&strict).unwrap_err(),
            ManagerError::CapacityExceeded {
                capacity: 4,
                guests: 6,
                ..
            }
        ));
    }
}
