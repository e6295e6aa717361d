use super::*;
use crate::utils::time::{day_start, today};
use chrono::Duration as ChronoDuration;
use desk_client::InMemoryGateway;
use shared::models::{DiningTable, QueueStatus};

const SLUG: &str = "spice-house";

fn today_at(minutes: i64) -> DateTime<Utc> {
    day_start(today(chrono_tz::UTC), chrono_tz::UTC) + ChronoDuration::minutes(minutes)
}

fn waiting(id: i64, minutes: i64, guests: i32) -> QueueEntry {
    QueueEntry {
        id,
        name: format!("Guest {}", id),
        phone: "91234567".to_string(),
        email: format!("guest{}@example.com", id),
        guests_count: guests,
        status: QueueStatus::Waiting,
        table_id: None,
        created_at: today_at(minutes),
        restaurant_slug: SLUG.to_string(),
    }
}

fn seated(id: i64, minutes: i64, guests: i32, table_id: i64) -> QueueEntry {
    QueueEntry {
        status: QueueStatus::Assigned,
        table_id: Some(table_id),
        ..waiting(id, minutes, guests)
    }
}

fn table(id: i64, capacity: i32) -> DiningTable {
    DiningTable {
        id,
        name: format!("T{}", id),
        capacity,
        color: "teal".to_string(),
        restaurant_slug: SLUG.to_string(),
        created_at: today_at(0) - ChronoDuration::days(30) + ChronoDuration::seconds(id),
    }
}

/// Tables T1 (2), T2 (4), T3 (6); parties #7 (4 guests, 10:00), #8 (10:05), #9 (10:10)
fn seed_floor(gateway: &InMemoryGateway) {
    gateway.seed_table(table(1, 2));
    gateway.seed_table(table(2, 4));
    gateway.seed_table(table(3, 6));
    gateway.seed_entry(waiting(7, 600, 4));
    gateway.seed_entry(waiting(8, 605, 2));
    gateway.seed_entry(waiting(9, 610, 3));
}

fn spawn_manager(gateway: &InMemoryGateway) -> QueueManager {
    QueueManager::spawn(Arc::new(gateway.clone()), SLUG, EngineConfig::default())
}

async fn loaded_manager(gateway: &InMemoryGateway) -> QueueManager {
    let manager = spawn_manager(gateway);
    let outcome = manager.load_today().await.unwrap();
    assert!(outcome.is_applied());
    manager
}

/// Wait until the published board satisfies `pred`
async fn wait_for_board(manager: &QueueManager, pred: impl Fn(&QueueBoard) -> bool) {
    let mut rx = manager.watch_board();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if pred(&rx.borrow_and_update()) {
                return;
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .expect("board never reached expected state");
}
