//! Restaurant Model

use serde::{Deserialize, Serialize};

/// Restaurant (tenant). Every queue entry and table is scoped by `slug`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    pub slug: String,
}
