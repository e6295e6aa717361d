//! Dining Table Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Dining table entity (桌台)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: i64,
    pub name: String,
    pub capacity: i32,
    /// Cosmetic grouping key (e.g. `bg-red-500`)
    pub color: String,
    pub restaurant_slug: String,
    pub created_at: DateTime<Utc>,
}

impl DiningTable {
    /// Whether a party of `guests` fits at this table
    pub fn fits(&self, guests: i32) -> bool {
        guests <= self.capacity
    }
}

/// Create dining table payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiningTableCreate {
    pub name: String,
    pub capacity: i32,
    pub color: String,
    pub restaurant_slug: String,
}

/// Update dining table payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiningTableUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl DiningTableUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.capacity.is_none() && self.color.is_none()
    }

    /// Apply the patch onto an existing table
    pub fn apply_to(&self, table: &mut DiningTable) {
        if let Some(name) = &self.name {
            table.name = name.clone();
        }
        if let Some(capacity) = self.capacity {
            table.capacity = capacity;
        }
        if let Some(color) = &self.color {
            table.color = color.clone();
        }
    }
}
