//! QueueBoard - in-memory mirror of today's active queue
//!
//! The board is plain data owned by the manager worker. Every mutation goes
//! through the worker, readers get immutable `Arc<QueueBoard>` snapshots.
//!
//! # Invariants
//!
//! - `entries` holds only active entries (waiting / assigned) of one tenant,
//!   ordered by `(created_at, id)`
//! - `grouped_by_capacity` is recomputed whenever `tables` changes
//! - at most one assigned entry per table

use super::actions::Transition;
use shared::models::{DiningTable, QueueEntry};
use std::collections::{BTreeMap, HashMap};

/// Snapshot of today's queue and the tenant's tables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueBoard {
    restaurant_slug: String,
    entries: Vec<QueueEntry>,
    tables: Vec<DiningTable>,
    /// capacity → tables in load order
    grouped_by_capacity: BTreeMap<i32, Vec<DiningTable>>,
    /// Generation of the last applied load
    generation: u64,
    loaded: bool,
}

impl QueueBoard {
    pub fn new(restaurant_slug: impl Into<String>) -> Self {
        Self {
            restaurant_slug: restaurant_slug.into(),
            ..Default::default()
        }
    }

    // ========== Bulk replacement ==========

    /// Replace everything with an authoritative load
    ///
    /// Terminal and foreign-tenant entries are dropped; tables keep the
    /// order they were loaded in.
    pub fn replace_all(
        &mut self,
        entries: Vec<QueueEntry>,
        tables: Vec<DiningTable>,
        generation: u64,
    ) {
        let slug = self.restaurant_slug.clone();
        self.entries = entries
            .into_iter()
            .filter(|e| e.status.is_active() && e.restaurant_slug == slug)
            .collect();
        self.sort_entries();
        self.tables = tables
            .into_iter()
            .filter(|t| t.restaurant_slug == slug)
            .collect();
        self.regroup();
        self.generation = generation;
        self.loaded = true;
    }

    // ========== Accessors ==========

    pub fn restaurant_slug(&self) -> &str {
        &self.restaurant_slug
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether at least one load has been applied
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Active entries, oldest first
    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    pub fn tables(&self) -> &[DiningTable] {
        &self.tables
    }

    pub fn grouped_by_capacity(&self) -> &BTreeMap<i32, Vec<DiningTable>> {
        &self.grouped_by_capacity
    }

    pub fn entry(&self, id: i64) -> Option<&QueueEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn table(&self, id: i64) -> Option<&DiningTable> {
        self.tables.iter().find(|t| t.id == id)
    }

    // ========== Derived views ==========

    /// Waiting entries, oldest first
    pub fn pending(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter().filter(|e| e.is_waiting())
    }

    /// Seated entries, oldest first
    pub fn assigned(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter().filter(|e| e.is_assigned())
    }

    /// Entry currently seated at a table
    pub fn occupant(&self, table_id: i64) -> Option<&QueueEntry> {
        self.entries.iter().find(|e| e.occupies(table_id))
    }

    pub fn is_occupied(&self, table_id: i64) -> bool {
        self.occupant(table_id).is_some()
    }

    /// Tables without an occupant, in load order
    pub fn available_tables(&self) -> impl Iterator<Item = &DiningTable> {
        self.tables.iter().filter(|t| !self.is_occupied(t.id))
    }

    // ========== Record-level mutation ==========

    /// Upsert an active record, drop a terminal one
    pub fn apply_record(&mut self, entry: QueueEntry) {
        if entry.restaurant_slug != self.restaurant_slug {
            return;
        }
        let pos = self.entries.iter().position(|e| e.id == entry.id);
        match (pos, entry.status.is_active()) {
            (Some(i), true) => self.entries[i] = entry,
            (Some(i), false) => {
                self.entries.remove(i);
            }
            (None, true) => {
                self.entries.push(entry);
                self.sort_entries();
            }
            (None, false) => {}
        }
    }

    /// Undo an optimistic transition
    ///
    /// Restores `before` only while the board still reflects `after`; a
    /// newer authoritative load wins. Returns whether anything was restored.
    pub fn rollback(&mut self, transition: &Transition) -> bool {
        let still_optimistic = match self.entry(transition.entry_id) {
            Some(current) => current == &transition.after,
            None => !transition.after.status.is_active(),
        };
        if !still_optimistic {
            return false;
        }
        self.apply_record(transition.before.clone());
        true
    }

    /// Drop a table from every view
    pub fn remove_table(&mut self, table_id: i64) -> bool {
        let before = self.tables.len();
        self.tables.retain(|t| t.id != table_id);
        let removed = self.tables.len() != before;
        if removed {
            self.regroup();
        }
        removed
    }

    /// Check the board invariants; returns the first violation
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut seated: HashMap<i64, i64> = HashMap::new();
        for entry in &self.entries {
            if !entry.status.is_active() {
                return Err(format!("entry {} is {} on the board", entry.id, entry.status));
            }
            entry
                .check_consistency()
                .map_err(|e| format!("entry {}: {}", entry.id, e))?;
            if let Some(table_id) = entry.table_id
                && entry.is_assigned()
                && let Some(other) = seated.insert(table_id, entry.id)
            {
                return Err(format!(
                    "table {} double booked by entries {} and {}",
                    table_id, other, entry.id
                ));
            }
        }
        let ordered = self
            .entries
            .windows(2)
            .all(|w| (w[0].created_at, w[0].id) <= (w[1].created_at, w[1].id));
        if !ordered {
            return Err("entries out of created_at order".to_string());
        }
        Ok(())
    }

    fn sort_entries(&mut self) {
        self.entries.sort_by_key(|e| (e.created_at, e.id));
    }

    fn regroup(&mut self) {
        let mut grouped: BTreeMap<i32, Vec<DiningTable>> = BTreeMap::new();
        for table in &self.tables {
            grouped.entry(table.capacity).or_default().push(table.clone());
        }
        self.grouped_by_capacity = grouped;
    }
}
