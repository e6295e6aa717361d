// desk-client/tests/memory_gateway.rs
// 内存网关集成测试

use chrono::{TimeZone, Utc};
use desk_client::{
    AuthGateway, ClientError, InMemoryGateway, QueueFilter, RemoteGateway, TableFilter,
};
use shared::message::{ChangeChannel, ChangeKind};
use shared::models::{
    DiningTable, DiningTableCreate, DiningTableUpdate, QueueEntry, QueueEntryCreate,
    QueueEntryRow, QueueEntryUpdate, QueueStatus, Restaurant, StaffProfile,
};
use std::time::Duration;
use uuid::Uuid;

const SLUG: &str = "spice-house";

fn table(id: i64, name: &str, capacity: i32, minute: u32) -> DiningTable {
    DiningTable {
        id,
        name: name.into(),
        capacity,
        color: "bg-red-500".into(),
        restaurant_slug: SLUG.into(),
        created_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, minute, 0).unwrap(),
    }
}

fn waiting(id: i64, minute: u32) -> QueueEntry {
    QueueEntry {
        id,
        name: format!("Guest {}", id),
        phone: "91234567".into(),
        email: "guest@example.com".into(),
        guests_count: 2,
        status: QueueStatus::Waiting,
        table_id: None,
        created_at: Utc.with_ymd_and_hms(2026, 3, 1, 10, minute, 0).unwrap(),
        restaurant_slug: SLUG.into(),
    }
}

#[tokio::test]
async fn test_list_queue_entries_filters_and_orders() {
    let gateway = InMemoryGateway::new();
    gateway.seed_entry(waiting(3, 10));
    gateway.seed_entry(waiting(1, 0));
    gateway.seed_entry(QueueEntry {
        restaurant_slug: "noodle-bar".into(),
        ..waiting(2, 5)
    });

    let entries = gateway
        .list_queue_entries(&QueueFilter::new().restaurant(SLUG))
        .await
        .unwrap();
    let ids: Vec<i64> = entries.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![1, 3]);
}

#[tokio::test]
async fn test_invalid_rows_are_skipped() {
    let gateway = InMemoryGateway::new();
    gateway.seed_entry(waiting(1, 0));
    gateway.seed_raw_row(QueueEntryRow {
        id: 2,
        status: Some("seated".into()),
        ..QueueEntryRow::from(waiting(2, 1))
    });

    let entries = gateway.list_queue_entries(&QueueFilter::new()).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert!(gateway.get_queue_entry(2).await.unwrap().is_none());
}

#[tokio::test]
async fn test_insert_allocates_ids_past_seeded_rows() {
    let gateway = InMemoryGateway::new();
    gateway.seed_entry(waiting(41, 0));

    let created = gateway
        .insert_queue_entry(&QueueEntryCreate::waiting(
            SLUG,
            3,
            "Asha",
            "+65 9123 4567",
            "asha@example.com",
        ))
        .await
        .unwrap();
    assert_eq!(created.id, 42);
    assert_eq!(created.status, QueueStatus::Waiting);
}

#[tokio::test]
async fn test_update_enforces_lifecycle() {
    let gateway = InMemoryGateway::new();
    gateway.seed_entry(waiting(1, 0));

    gateway
        .update_queue_entry(1, &QueueEntryUpdate::status(QueueStatus::Cancelled))
        .await
        .unwrap();
    let err = gateway
        .update_queue_entry(1, &QueueEntryUpdate::assign(5))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Conflict(_)));
}

#[tokio::test]
async fn test_injected_failures_are_consumed() {
    let gateway = InMemoryGateway::new();
    gateway.seed_entry(waiting(1, 0));
    gateway.fail_next_writes(1);

    let err = gateway
        .update_queue_entry(1, &QueueEntryUpdate::assign(5))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 503, .. }));
    assert_eq!(gateway.entry(1).unwrap().status, QueueStatus::Waiting);

    gateway
        .update_queue_entry(1, &QueueEntryUpdate::assign(5))
        .await
        .unwrap();
    assert!(gateway.entry(1).unwrap().occupies(5));
}

#[tokio::test]
async fn test_table_paging_newest_first() {
    let gateway = InMemoryGateway::new();
    for i in 1..=12 {
        gateway.seed_table(table(i, &format!("T{}", i), 4, i as u32));
    }

    let page = gateway
        .list_tables(&TableFilter::new().restaurant(SLUG).newest_first().page(2, 10))
        .await
        .unwrap();
    assert_eq!(page.total, 12);
    assert_eq!(page.page_count(10), 2);
    let ids: Vec<i64> = page.items.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![2, 1]);
}

#[tokio::test]
async fn test_delete_table_respects_foreign_key() {
    let gateway = InMemoryGateway::new();
    gateway.seed_table(table(2, "T2", 4, 0));
    gateway.seed_entry(QueueEntry {
        status: QueueStatus::Completed,
        table_id: Some(2),
        ..waiting(7, 0)
    });

    assert_eq!(gateway.count_table_references(2).await.unwrap(), 1);
    assert!(matches!(
        gateway.delete_table(SLUG, 2).await,
        Err(ClientError::Conflict(_))
    ));
    assert!(gateway.table(2).is_some());
}

#[tokio::test]
async fn test_table_writes_stay_inside_restaurant() {
    let gateway = InMemoryGateway::new();
    gateway.seed_table(DiningTable {
        restaurant_slug: "noodle-bar".into(),
        ..table(55, "N5", 4, 0)
    });

    let rename = DiningTableUpdate {
        name: Some("hijacked".into()),
        ..Default::default()
    };
    assert!(matches!(
        gateway.update_table(SLUG, 55, &rename).await,
        Err(ClientError::NotFound(_))
    ));
    assert!(matches!(
        gateway.delete_table(SLUG, 55).await,
        Err(ClientError::NotFound(_))
    ));
    let kept = gateway.table(55).unwrap();
    assert_eq!(kept.name, "N5");
    assert_eq!(kept.restaurant_slug, "noodle-bar");

    let renamed = gateway.update_table("noodle-bar", 55, &rename).await.unwrap();
    assert_eq!(renamed.name, "hijacked");
    gateway.delete_table("noodle-bar", 55).await.unwrap();
    assert!(gateway.table(55).is_none());
}

#[tokio::test]
async fn test_subscribe_is_tenant_scoped() {
    let gateway = InMemoryGateway::new();
    let mut feed = gateway
        .subscribe(ChangeChannel::Queues, SLUG)
        .await
        .unwrap();

    gateway
        .insert_queue_entry(&QueueEntryCreate::waiting("noodle-bar", 2, "A", "91234567", "a@x.io"))
        .await
        .unwrap();
    gateway
        .insert_table(&DiningTableCreate {
            name: "T1".into(),
            capacity: 2,
            color: "bg-blue-500".into(),
            restaurant_slug: SLUG.into(),
        })
        .await
        .unwrap();
    let mine = gateway
        .insert_queue_entry(&QueueEntryCreate::waiting(SLUG, 2, "B", "91234567", "b@x.io"))
        .await
        .unwrap();

    let event = tokio::time::timeout(Duration::from_secs(1), feed.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.kind, ChangeKind::Insert);
    assert_eq!(event.record_id, Some(mine.id));
    assert!(feed.try_recv().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_delayed_list_returns_snapshot_from_call_start() {
    let gateway = InMemoryGateway::new();
    gateway.seed_entry(waiting(1, 0));
    gateway.delay_next_lists([Duration::from_millis(500)]);

    let slow = {
        let gateway = gateway.clone();
        tokio::spawn(async move { gateway.list_queue_entries(&QueueFilter::new()).await })
    };
    tokio::task::yield_now().await;
    gateway
        .update_queue_entry(1, &QueueEntryUpdate::status(QueueStatus::Cancelled))
        .await
        .unwrap();

    let stale = slow.await.unwrap().unwrap();
    assert_eq!(stale[0].status, QueueStatus::Waiting);
    assert_eq!(gateway.list_calls(), 1);
}

#[tokio::test]
async fn test_auth_round_trip() {
    let gateway = InMemoryGateway::new();
    let profile = StaffProfile {
        id: Uuid::new_v4(),
        email: "host@spice.house".into(),
        full_name: Some("Host".into()),
        restaurant: Restaurant {
            id: 1,
            name: "Spice House".into(),
            slug: SLUG.into(),
        },
    };
    gateway.add_staff("host@spice.house", "correct-horse", profile.clone());

    assert!(gateway.sign_in("host@spice.house", "wrong").await.unwrap_err().is_auth());

    let session = gateway.sign_in("host@spice.house", "correct-horse").await.unwrap();
    assert_eq!(session.user.id, profile.id);
    assert_eq!(gateway.current_user(&session).await.unwrap().id, profile.id);
    assert_eq!(
        gateway.get_profile(profile.id).await.unwrap().unwrap().restaurant_slug(),
        SLUG
    );

    gateway.update_password(&session, "battery-staple").await.unwrap();
    gateway.sign_out(&session).await.unwrap();
    assert!(gateway.current_user(&session).await.unwrap_err().is_auth());
    gateway.sign_in("host@spice.house", "battery-staple").await.unwrap();
}
