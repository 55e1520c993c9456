//! Persistence port for events and its adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Event, EventChanges, EventId, EventPage, EventQuery, NewEvent, OwnerId};

pub mod memory;
pub mod postgres;

pub use memory::MemoryEventStore;
pub use postgres::PgEventStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Storage operations the services rely on.
///
/// Writes are scoped by owner as well as by id; a write against a record owned by
/// someone else behaves exactly like a write against a missing record.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert(&self, owner: &OwnerId, event: NewEvent) -> Result<Event, StoreError>;

    async fn find(&self, id: EventId) -> Result<Option<Event>, StoreError>;

    /// Returns `None` when no row with this id belongs to `owner`.
    async fn update(
        &self,
        owner: &OwnerId,
        id: EventId,
        changes: &EventChanges,
    ) -> Result<Option<Event>, StoreError>;

    /// Returns `false` when no row with this id belongs to `owner`.
    async fn delete(&self, owner: &OwnerId, id: EventId) -> Result<bool, StoreError>;

    /// Page and total must come from the same snapshot.
    async fn list(&self, owner: &OwnerId, query: &EventQuery) -> Result<EventPage, StoreError>;
}
