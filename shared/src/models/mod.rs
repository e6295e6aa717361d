//! Data models
//!
//! Typed records for the backend collections (`queues`, `tables`,
//! `restaurant`, `profiles`). Rows are parsed and validated at the gateway
//! boundary; everything past it works on these types.
//! All record IDs are `i64` except staff profiles, which are keyed by the
//! auth user uuid.

pub mod dining_table;
pub mod profile;
pub mod queue_entry;
pub mod restaurant;

// Re-exports
pub use dining_table::*;
pub use profile::*;
pub use queue_entry::*;
pub use restaurant::*;
