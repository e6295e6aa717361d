//! Fixtures for action tests

use crate::queue::QueueBoard;
use chrono::{Duration, TimeZone, Utc};
use shared::models::{DiningTable, QueueEntry, QueueStatus};

pub const SLUG: &str = "spice-house";

pub fn entry(
    id: i64,
    minute: i64,
    guests: i32,
    status: QueueStatus,
    table_id: Option<i64>,
) -> QueueEntry {
    QueueEntry {
        id,
        name: format!("Guest {}", id),
        phone: "91234567".into(),
        email: "guest@example.com".into(),
        guests_count: guests,
        status,
        table_id,
        created_at: Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap() + Duration::minutes(minute),
        restaurant_slug: SLUG.into(),
    }
}

pub fn table(id: i64, capacity: i32) -> DiningTable {
    DiningTable {
        id,
        name: format!("T{}", id),
        capacity,
        color: "blue".into(),
        restaurant_slug: SLUG.into(),
        created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(id),
    }
}

pub fn board(entries: Vec<QueueEntry>, tables: Vec<DiningTable>) -> QueueBoard {
    let mut board = QueueBoard::new(SLUG);
    board.replace_all(entries, tables, 1);
    board
}
