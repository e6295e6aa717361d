//! End-to-end front desk flow against the in-memory backend:
//! guest joins → staff seats and completes → analytics and table guard.

use chrono::{Duration as ChronoDuration, Utc};
use desk_client::InMemoryGateway;
use front_desk::analytics::{self, DateRange};
use front_desk::queue::{EngineConfig, LinearEstimator, QueueBoard, QueueManager};
use front_desk::session::{AdminSession, GuestDetails, GuestRoute, GuestSession, LocalStore};
use front_desk::tables::TableService;
use front_desk::utils::time::today;
use front_desk::ErrorCode;
use shared::models::{DiningTable, QueueStatus, Restaurant, StaffProfile};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const SLUG: &str = "spice-house";
const EMAIL: &str = "host@spice.house";
const PASSWORD: &str = "front of house";

fn restaurant() -> Restaurant {
    Restaurant {
        id: 1,
        name: "Spice House".into(),
        slug: SLUG.into(),
    }
}

fn seed(gateway: &InMemoryGateway) -> DiningTable {
    gateway.seed_restaurant(restaurant());
    gateway.add_staff(
        EMAIL,
        PASSWORD,
        StaffProfile {
            id: Uuid::new_v4(),
            email: EMAIL.into(),
            full_name: Some("Host".into()),
            restaurant: restaurant(),
        },
    );
    gateway.seed_table(DiningTable {
        id: 100,
        name: "Window".into(),
        capacity: 4,
        color: "bg-teal-500".into(),
        restaurant_slug: SLUG.into(),
        created_at: Utc::now() - ChronoDuration::days(10),
    })
}

async fn open_guest(gateway: &InMemoryGateway, store: LocalStore) -> GuestSession {
    GuestSession::start(
        Arc::new(gateway.clone()),
        store,
        " Spice-House ",
        chrono_tz::UTC,
        Arc::new(LinearEstimator::default()),
    )
    .await
    .unwrap()
}

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

#[tokio::test]
async fn test_guest_to_completed_visit() {
    let gateway = InMemoryGateway::new();
    let table = seed(&gateway);

    // guest joins with a party of three
    let mut guest = open_guest(&gateway, LocalStore::open_in_memory().unwrap()).await;
    assert_eq!(guest.route(), GuestRoute::PartySize { slug: SLUG.into() });
    guest.set_guest_count(3).unwrap();
    guest.set_details(GuestDetails::new("Asha", "+65 9123 4567", "asha@example.com"));
    let entry = guest.submit().await.unwrap();
    assert_eq!(entry.status, QueueStatus::Waiting);
    assert_eq!(guest.route(), GuestRoute::Result { slug: SLUG.into() });

    let status = guest.status().await.unwrap();
    assert_eq!(status.estimate.map(|e| e.position), Some(1));

    // staff signs in and opens today's board
    let mut admin = AdminSession::new(
        Arc::new(gateway.clone()),
        Arc::new(gateway.clone()),
        LocalStore::open_in_memory().unwrap(),
    );
    let slug = admin.login(EMAIL, PASSWORD).await.unwrap().restaurant_slug().to_string();
    let manager = QueueManager::spawn(Arc::new(gateway.clone()), &slug, EngineConfig::default());
    manager.load_today().await.unwrap();
    assert_eq!(manager.board().pending().count(), 1);

    let seated = manager.assign(entry.id, table.id).await.unwrap();
    assert_eq!(seated.table_id, Some(table.id));
    assert!(manager.board().is_occupied(table.id));

    let status = guest.status().await.unwrap();
    assert_eq!(status.entry.status, QueueStatus::Assigned);
    assert!(status.estimate.is_none());

    let done = manager.complete(entry.id).await.unwrap();
    assert_eq!(done.status, QueueStatus::Completed);
    assert_eq!(done.table_id, Some(table.id));
    assert!(!manager.board().is_occupied(table.id));
    assert_eq!(manager.board().entries().len(), 0);

    // the visit shows up in today's analytics
    let report = analytics::fetch(
        &gateway,
        &slug,
        DateRange::new(today(chrono_tz::UTC), today(chrono_tz::UTC)),
        chrono_tz::UTC,
    )
    .await
    .unwrap();
    assert_eq!(report.summary.total_queues, 1);
    assert_eq!(report.summary.total_guests, 3);
    assert_eq!(report.summary.most_used_table, Some(table.id));

    // completed history still pins the table
    let tables = TableService::new(Arc::new(gateway.clone()), &slug);
    let err = tables.delete(table.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::TableInUse);
    assert!(gateway.table(table.id).is_some());

    // a finished reservation does not block a new one
    guest.set_details(GuestDetails::new("Asha", "+65 9123 4567", "asha@example.com"));
    let again = guest.submit().await.unwrap();
    assert_ne!(again.id, entry.id);

    manager.shutdown();
}

#[tokio::test]
async fn test_guest_cancel_reaches_subscribed_board() {
    let gateway = InMemoryGateway::new();
    seed(&gateway);

    let manager = QueueManager::spawn(Arc::new(gateway.clone()), SLUG, EngineConfig::default());
    let subscription = manager.subscribe_to_changes().await.unwrap();
    manager.load_today().await.unwrap();

    let mut guest = open_guest(&gateway, LocalStore::open_in_memory().unwrap()).await;
    guest.set_details(GuestDetails::new("Ravi", "91234567", "ravi@example.com"));
    let entry = guest.submit().await.unwrap();
    wait_for_board(&manager, |b| b.entry(entry.id).is_some()).await;

    // second submit while still waiting is refused
    let err = guest.submit().await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ReservationExists);

    guest.cancel().await.unwrap();
    assert_eq!(guest.reservation_id(), None);
    wait_for_board(&manager, |b| b.entry(entry.id).is_none()).await;
    assert_eq!(gateway.entry(entry.id).unwrap().status, QueueStatus::Cancelled);

    subscription.shutdown().await;
    manager.shutdown();
}

#[tokio::test]
async fn test_reservation_survives_restart() {
    let gateway = InMemoryGateway::new();
    seed(&gateway);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.redb");

    let id = {
        let mut guest = open_guest(&gateway, LocalStore::open(&path).unwrap()).await;
        guest.set_details(GuestDetails::new("Mei", "91234567", "mei@example.com"));
        guest.submit().await.unwrap().id
    };

    let guest = open_guest(&gateway, LocalStore::open(&path).unwrap()).await;
    assert_eq!(guest.reservation_id(), Some(id));
    assert_eq!(guest.route(), GuestRoute::Result { slug: SLUG.into() });
    assert_eq!(guest.status().await.unwrap().entry.id, id);
}
