//! Runs the PostgreSQL store against a live database. Skipped unless
//! `DATABASE_URL` is set.

use chrono::{TimeZone, Utc};
use planner_server::models::{
    EventFilter, EventQuery, EventSort, EventType, NewEvent, OwnerId, PageLimits, PageRequest,
    SortField, SortOrder,
};
use planner_server::store::{EventStore, PgEventStore};
use sqlx::postgres::PgPoolOptions;

async fn store() -> Option<PgEventStore> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .unwrap();
    sqlx::migrate!().run(&pool).await.unwrap();
    Some(PgEventStore::new(pool))
}

fn unique_owner() -> OwnerId {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    OwnerId::new(format!("pg-test-{nanos}"))
}

fn new_event(name: &str, hour: u32) -> NewEvent {
    NewEvent {
        event_name: name.to_string(),
        event_type: EventType::Meeting,
        event_date: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
        event_time: Utc.with_ymd_and_hms(1970, 1, 1, hour, 0, 0).unwrap(),
        location: "HQ".to_string(),
        description: None,
    }
}

#[tokio::test]
async fn test_list_page_and_total_agree() {
    let Some(store) = store().await else {
        return;
    };
    let owner = unique_owner();
    for (i, name) in ["delta", "Alpha", "charlie", "Bravo", "echo"].iter().enumerate() {
        store
            .insert(&owner, new_event(name, 8 + i as u32))
            .await
            .unwrap();
    }

    let query = EventQuery::new(
        EventFilter::default(),
        EventSort {
            field: SortField::EventName,
            order: SortOrder::Asc,
        },
        PageRequest::clamped(2, 1, PageLimits::default()),
    );
    let page = store.list(&owner, &query).await.unwrap();

    assert_eq!(page.total, 5);
    let names: Vec<_> = page.events.iter().map(|e| e.event_name.as_str()).collect();
    assert_eq!(names, vec!["Bravo", "charlie"]);
}

#[tokio::test]
async fn test_starts_after_combines_date_and_time_of_day() {
    let Some(store) = store().await else {
        return;
    };
    let owner = unique_owner();
    store.insert(&owner, new_event("morning", 8)).await.unwrap();
    store.insert(&owner, new_event("evening", 18)).await.unwrap();

    let query = EventQuery::new(
        EventFilter {
            starts_after: Some(Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()),
            ..EventFilter::default()
        },
        EventSort {
            field: SortField::StartsAt,
            order: SortOrder::Asc,
        },
        PageRequest::clamped(10, 0, PageLimits::default()),
    );
    let page = store.list(&owner, &query).await.unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(page.events[0].event_name, "evening");
}
