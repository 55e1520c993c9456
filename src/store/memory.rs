use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{EventStore, StoreError};
use crate::models::{Event, EventChanges, EventId, EventPage, EventQuery, NewEvent, OwnerId};

#[derive(Default)]
struct Inner {
    next_id: EventId,
    events: BTreeMap<EventId, Event>,
}

/// Process-local store used for development and tests.
///
/// A single lock guards all rows, so `list` reads page and total atomically.
#[derive(Default)]
pub struct MemoryEventStore {
    inner: RwLock<Inner>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.events.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert(&self, owner: &OwnerId, event: NewEvent) -> Result<Event, StoreError> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let now = Utc::now();
        let stored = Event {
            id: inner.next_id,
            owner_id: owner.clone(),
            event_name: event.event_name,
            event_type: event.event_type,
            event_date: event.event_date,
            event_time: event.event_time,
            location: event.location,
            description: event.description,
            created_at: now,
            updated_at: now,
        };
        inner.events.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        Ok(self.inner.read().await.events.get(&id).cloned())
    }

    async fn update(
        &self,
        owner: &OwnerId,
        id: EventId,
        changes: &EventChanges,
    ) -> Result<Option<Event>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(event) = inner
            .events
            .get_mut(&id)
            .filter(|event| &event.owner_id == owner)
        else {
            return Ok(None);
        };
        changes.apply_to(event);
        event.updated_at = Utc::now();
        Ok(Some(event.clone()))
    }

    async fn delete(&self, owner: &OwnerId, id: EventId) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let owned = inner
            .events
            .get(&id)
            .is_some_and(|event| &event.owner_id == owner);
        if owned {
            inner.events.remove(&id);
        }
        Ok(owned)
    }

    async fn list(&self, owner: &OwnerId, query: &EventQuery) -> Result<EventPage, StoreError> {
        let inner = self.inner.read().await;
        let mut matching: Vec<&Event> = inner
            .events
            .values()
            .filter(|event| &event.owner_id == owner && query.filter.matches(event))
            .collect();
        matching.sort_by(|a, b| query.sort.compare(a, b));

        let total = i64::try_from(matching.len()).unwrap_or(i64::MAX);
        let skip = usize::try_from(query.page.skip).unwrap_or(usize::MAX);
        let take = usize::try_from(query.page.take).unwrap_or(usize::MAX);
        let events = matching
            .into_iter()
            .skip(skip)
            .take(take)
            .cloned()
            .collect();

        Ok(EventPage { events, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        EventFilter, EventSort, EventType, PageLimits, PageRequest, SortField, SortOrder,
    };
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;

    fn new_event(name: &str, location: &str, day: u32) -> NewEvent {
        let date = Utc.with_ymd_and_hms(2025, 6, day, 0, 0, 0).unwrap();
        NewEvent {
            event_name: name.to_string(),
            event_type: EventType::Meeting,
            event_date: date,
            event_time: date,
            location: location.to_string(),
            description: None,
        }
    }

    fn query(filter: EventFilter, take: u32, skip: u64) -> EventQuery {
        EventQuery::new(
            filter,
            EventSort::default(),
            PageRequest::clamped(take, skip, PageLimits::default()),
        )
    }

    #[tokio::test]
    async fn test_ids_are_unique_and_increasing() {
        let store = MemoryEventStore::new();
        let owner = OwnerId::new("u1");
        let first = store.insert(&owner, new_event("a", "x", 1)).await.unwrap();
        let second = store.insert(&owner, new_event("b", "x", 1)).await.unwrap();
        assert!(second.id > first.id);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_list_is_owner_scoped() {
        let store = MemoryEventStore::new();
        let alice = OwnerId::new("alice");
        let bob = OwnerId::new("bob");
        store.insert(&alice, new_event("a", "x", 1)).await.unwrap();

        let page = store
            .list(&bob, &query(EventFilter::default(), 10, 0))
            .await
            .unwrap();
        assert_eq!(page.total, 0);
        assert!(page.events.is_empty());
    }

    #[tokio::test]
    async fn test_writes_ignore_foreign_rows() {
        let store = MemoryEventStore::new();
        let alice = OwnerId::new("alice");
        let bob = OwnerId::new("bob");
        let event = store.insert(&alice, new_event("a", "x", 1)).await.unwrap();

        let changes = EventChanges {
            event_name: Some("hijacked".to_string()),
            ..EventChanges::default()
        };
        assert!(store.update(&bob, event.id, &changes).await.unwrap().is_none());
        assert!(!store.delete(&bob, event.id).await.unwrap());
        assert_eq!(
            store.find(event.id).await.unwrap().unwrap().event_name,
            "a"
        );
    }

    #[tokio::test]
    async fn test_pages_cover_all_matches_exactly_once() {
        let store = MemoryEventStore::new();
        let owner = OwnerId::new("u1");
        for i in 0..23u32 {
            let location = if i % 2 == 0 { "HQ" } else { "Remote" };
            // Several events share a day so the id tie-break matters.
            store
                .insert(&owner, new_event(&format!("event {i}"), location, 1 + i % 3))
                .await
                .unwrap();
        }

        let filter = EventFilter {
            location: Some("hq".to_string()),
            ..EventFilter::default()
        };
        let mut seen = HashSet::new();
        let mut skip = 0;
        let mut total = 0;
        loop {
            let page = store.list(&owner, &query(filter.clone(), 5, skip)).await.unwrap();
            total = page.total;
            if page.events.is_empty() {
                break;
            }
            for event in &page.events {
                assert!(seen.insert(event.id), "duplicate id {}", event.id);
            }
            skip += 5;
        }

        assert_eq!(total, 12);
        assert_eq!(seen.len(), 12);
    }

    #[tokio::test]
    async fn test_list_sorts_descending() {
        let store = MemoryEventStore::new();
        let owner = OwnerId::new("u1");
        store.insert(&owner, new_event("a", "Berlin", 1)).await.unwrap();
        store.insert(&owner, new_event("b", "Austin", 2)).await.unwrap();
        store.insert(&owner, new_event("c", "Cairo", 3)).await.unwrap();

        let page = store
            .list(
                &owner,
                &EventQuery::new(
                    EventFilter::default(),
                    EventSort {
                        field: SortField::Location,
                        order: SortOrder::Desc,
                    },
                    PageRequest::clamped(10, 0, PageLimits::default()),
                ),
            )
            .await
            .unwrap();
        let locations: Vec<_> = page.events.iter().map(|e| e.location.as_str()).collect();
        assert_eq!(locations, vec!["Cairo", "Berlin", "Austin"]);
    }
}
