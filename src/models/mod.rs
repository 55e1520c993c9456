pub mod event;
pub mod instant;
pub mod owner;
pub mod payload;
pub mod query;

pub use event::{Event, EventChanges, EventId, EventType, NewEvent};
pub use owner::OwnerId;
pub use payload::{CreateEventRequest, UpdateEventRequest};
pub use query::{
    EventFilter, EventPage, EventQuery, EventSort, ListEventsParams, PageLimits, PageRequest,
    SortField, SortOrder,
};
