use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::instrument;

use crate::models::{
    Event, EventFilter, EventId, EventPage, EventQuery, EventSort, ListEventsParams, OwnerId,
    PageLimits, PageRequest, SortField, SortOrder,
};
use crate::store::EventStore;
use crate::utils::error::AppError;

/// Read side: ownership-scoped lookups, listing and the "upcoming today" view.
#[derive(Clone)]
pub struct EventQueryEngine {
    store: Arc<dyn EventStore>,
    limits: PageLimits,
}

impl EventQueryEngine {
    pub fn new(store: Arc<dyn EventStore>, limits: PageLimits) -> Self {
        Self { store, limits }
    }

    pub fn parse(&self, params: &ListEventsParams) -> Result<EventQuery, AppError> {
        EventQuery::from_params(params, self.limits)
    }

    #[instrument(skip(self, owner, query), fields(owner = %owner))]
    pub async fn list(&self, owner: &OwnerId, query: &EventQuery) -> Result<EventPage, AppError> {
        let page = self.store.list(owner, query).await?;
        tracing::debug!(returned = page.events.len(), total = page.total, "Listed events");
        Ok(page)
    }

    /// A foreign record is reported exactly like a missing one.
    #[instrument(skip(self, owner), fields(owner = %owner))]
    pub async fn get(&self, owner: &OwnerId, id: EventId) -> Result<Event, AppError> {
        match self.store.find(id).await? {
            Some(event) if &event.owner_id == owner => Ok(event),
            _ => Err(not_found()),
        }
    }

    /// Events dated today whose start (date plus time of day) is still ahead of `now`,
    /// soonest first.
    #[instrument(skip(self, owner), fields(owner = %owner))]
    pub async fn upcoming(
        &self,
        owner: &OwnerId,
        now: DateTime<Utc>,
    ) -> Result<EventPage, AppError> {
        let query = EventQuery::new(
            EventFilter {
                day: Some(now.date_naive()),
                starts_after: Some(now),
                ..EventFilter::default()
            },
            EventSort {
                field: SortField::StartsAt,
                order: SortOrder::Asc,
            },
            PageRequest::clamped(self.limits.max_take, 0, self.limits),
        );

        let page = self.store.list(owner, &query).await?;
        tracing::debug!(
            returned = page.events.len(),
            total = page.total,
            "Listed upcoming events"
        );
        Ok(page)
    }
}

pub(crate) fn not_found() -> AppError {
    AppError::NotFound("Not Found".to_string())
}
