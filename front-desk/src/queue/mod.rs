//! 排队分配引擎 (Queue Assignment Engine)
//!
//! - [`QueueBoard`]: today's active entries, tables and derived views
//! - [`actions`]: assign / decline / complete planning
//! - [`QueueManager`]: single-writer worker handle
//! - [`position`]: queue position and wait estimate
//! - [`ticker`]: heartbeat clock for elapsed-wait labels
//! - [`subscription`]: change feed → reload

pub mod actions;
pub mod board;
pub mod manager;
pub mod position;
pub mod subscription;
pub mod ticker;

pub use board::QueueBoard;
pub use manager::{
    BoardNotice, EngineConfig, LoadOutcome, ManagerError, ManagerResult, QueueManager,
};
pub use position::{LinearEstimator, QueueEstimate, WaitEstimator};
pub use subscription::ChangeSubscription;
pub use ticker::Clock;
