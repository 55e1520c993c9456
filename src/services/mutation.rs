use std::sync::Arc;
use tracing::instrument;

use super::query::not_found;
use crate::models::{CreateEventRequest, Event, EventId, OwnerId, UpdateEventRequest};
use crate::store::EventStore;
use crate::utils::error::AppError;

/// Write side. Input is validated before any store write, and every write is
/// preceded by an ownership check on the loaded record.
#[derive(Clone)]
pub struct EventMutationService {
    store: Arc<dyn EventStore>,
}

impl EventMutationService {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, owner, request), fields(owner = %owner))]
    pub async fn create(
        &self,
        owner: &OwnerId,
        request: &CreateEventRequest,
    ) -> Result<Event, AppError> {
        let new_event = request.validate()?;
        let event = self.store.insert(owner, new_event).await?;
        tracing::info!(event_id = event.id, "Created event");
        Ok(event)
    }

    #[instrument(skip(self, owner, request), fields(owner = %owner))]
    pub async fn update(
        &self,
        owner: &OwnerId,
        id: EventId,
        request: &UpdateEventRequest,
    ) -> Result<Event, AppError> {
        let existing = self.load_owned(owner, id).await?;
        let changes = request.validate()?;
        if changes.is_empty() {
            return Ok(existing);
        }

        // The row can vanish between the load and the write.
        let event = self
            .store
            .update(owner, id, &changes)
            .await?
            .ok_or_else(not_found)?;
        tracing::info!(event_id = event.id, "Updated event");
        Ok(event)
    }

    #[instrument(skip(self, owner), fields(owner = %owner))]
    pub async fn delete(&self, owner: &OwnerId, id: EventId) -> Result<(), AppError> {
        self.load_owned(owner, id).await?;
        if !self.store.delete(owner, id).await? {
            return Err(not_found());
        }
        tracing::info!(event_id = id, "Deleted event");
        Ok(())
    }

    async fn load_owned(&self, owner: &OwnerId, id: EventId) -> Result<Event, AppError> {
        match self.store.find(id).await? {
            Some(event) if &event.owner_id == owner => Ok(event),
            Some(_) => {
                tracing::debug!(event_id = id, "Event belongs to another owner");
                Err(not_found())
            }
            None => Err(not_found()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventQuery, EventType, PageLimits};
    use crate::store::MemoryEventStore;

    fn launch() -> CreateEventRequest {
        CreateEventRequest {
            event_name: Some("Launch".to_string()),
            event_type: Some("CONFERENCE".to_string()),
            event_date: Some("2025-06-01".to_string()),
            event_time: Some("2025-06-01T14:00:00Z".to_string()),
            location: Some("HQ".to_string()),
            description: Some("Product launch".to_string()),
        }
    }

    fn service() -> (Arc<MemoryEventStore>, EventMutationService) {
        let store = Arc::new(MemoryEventStore::new());
        (store.clone(), EventMutationService::new(store))
    }

    #[tokio::test]
    async fn test_create_assigns_resolved_owner() {
        let (store, service) = service();
        let owner = OwnerId::new("u1");
        let event = service.create(&owner, &launch()).await.unwrap();

        assert_eq!(event.owner_id, owner);
        assert_eq!(event.event_name, "Launch");
        assert_eq!(event.event_type, EventType::Conference);
        assert_eq!(store.find(event.id).await.unwrap(), Some(event));
    }

    #[tokio::test]
    async fn test_invalid_create_persists_nothing() {
        let (store, service) = service();
        let request = CreateEventRequest {
            event_date: Some("someday".to_string()),
            ..launch()
        };
        let err = service
            .create(&OwnerId::new("u1"), &request)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidFields(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_update_is_partial() {
        let (_, service) = service();
        let owner = OwnerId::new("u1");
        let event = service.create(&owner, &launch()).await.unwrap();

        let updated = service
            .update(
                &owner,
                event.id,
                &UpdateEventRequest {
                    location: Some("Annex".to_string()),
                    description: Some(None),
                    ..UpdateEventRequest::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.location, "Annex");
        assert_eq!(updated.description, None);
        assert_eq!(updated.event_name, event.event_name);
        assert_eq!(updated.event_date, event.event_date);
        assert_eq!(updated.event_time, event.event_time);
    }

    #[tokio::test]
    async fn test_empty_update_changes_nothing() {
        let (store, service) = service();
        let owner = OwnerId::new("u1");
        let event = service.create(&owner, &launch()).await.unwrap();

        let unchanged = service
            .update(&owner, event.id, &UpdateEventRequest::default())
            .await
            .unwrap();
        assert_eq!(unchanged, event);
        assert_eq!(store.find(event.id).await.unwrap(), Some(event));
    }

    #[tokio::test]
    async fn test_foreign_mutations_look_like_missing_records() {
        let (store, service) = service();
        let alice = OwnerId::new("alice");
        let bob = OwnerId::new("bob");
        let event = service.create(&alice, &launch()).await.unwrap();

        let patch = UpdateEventRequest {
            event_name: Some("Mine now".to_string()),
            ..UpdateEventRequest::default()
        };
        assert!(matches!(
            service.update(&bob, event.id, &patch).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(&bob, event.id).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(store.find(event.id).await.unwrap(), Some(event));
    }

    #[tokio::test]
    async fn test_ownership_is_checked_before_validation() {
        let (_, service) = service();
        let event = service
            .create(&OwnerId::new("alice"), &launch())
            .await
            .unwrap();

        let bad_patch = UpdateEventRequest {
            event_date: Some("garbage".to_string()),
            ..UpdateEventRequest::default()
        };
        assert!(matches!(
            service.update(&OwnerId::new("bob"), event.id, &bad_patch).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_second_delete_reports_not_found() {
        let (store, service) = service();
        let owner = OwnerId::new("u1");
        let event = service.create(&owner, &launch()).await.unwrap();

        service.delete(&owner, event.id).await.unwrap();
        assert!(matches!(
            service.delete(&owner, event.id).await,
            Err(AppError::NotFound(_))
        ));

        let query = EventQuery::from_params(&Default::default(), PageLimits::default()).unwrap();
        assert_eq!(store.list(&owner, &query).await.unwrap().total, 0);
    }
}
