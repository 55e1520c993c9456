use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use super::owner::OwnerId;

pub type EventId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "event_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Conference,
    Meeting,
    Workshop,
    Seminar,
    Webinar,
    Social,
    Other,
}

impl EventType {
    pub const ALL: [EventType; 7] = [
        EventType::Conference,
        EventType::Meeting,
        EventType::Workshop,
        EventType::Seminar,
        EventType::Webinar,
        EventType::Social,
        EventType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Conference => "CONFERENCE",
            EventType::Meeting => "MEETING",
            EventType::Workshop => "WORKSHOP",
            EventType::Seminar => "SEMINAR",
            EventType::Webinar => "WEBINAR",
            EventType::Social => "SOCIAL",
            EventType::Other => "OTHER",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEventType(pub String);

impl fmt::Display for UnknownEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event type '{}'", self.0)
    }
}

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownEventType(s.to_string()))
    }
}

/// A persisted calendar event.
///
/// `event_date` and `event_time` are independent instants: the first carries the
/// day, the second the time of day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub owner_id: OwnerId,
    pub event_name: String,
    pub event_type: EventType,
    pub event_date: DateTime<Utc>,
    pub event_time: DateTime<Utc>,
    pub location: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// The day of `event_date` joined with the time of day of `event_time`.
    pub fn starts_at(&self) -> DateTime<Utc> {
        self.event_date
            .date_naive()
            .and_time(self.event_time.time())
            .and_utc()
    }
}

/// Validated fields for a new event. The owner is supplied separately.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub event_name: String,
    pub event_type: EventType,
    pub event_date: DateTime<Utc>,
    pub event_time: DateTime<Utc>,
    pub location: String,
    pub description: Option<String>,
}

/// Validated partial update. `None` leaves a field untouched; for `description`,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventChanges {
    pub event_name: Option<String>,
    pub event_type: Option<EventType>,
    pub event_date: Option<DateTime<Utc>>,
    pub event_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub description: Option<Option<String>>,
}

impl EventChanges {
    pub fn is_empty(&self) -> bool {
        self.event_name.is_none()
            && self.event_type.is_none()
            && self.event_date.is_none()
            && self.event_time.is_none()
            && self.location.is_none()
            && self.description.is_none()
    }

    /// Applies the changes to an in-memory record.
    pub fn apply_to(&self, event: &mut Event) {
        if let Some(name) = &self.event_name {
            event.event_name = name.clone();
        }
        if let Some(kind) = self.event_type {
            event.event_type = kind;
        }
        if let Some(date) = self.event_date {
            event.event_date = date;
        }
        if let Some(time) = self.event_time {
            event.event_time = time;
        }
        if let Some(location) = &self.location {
            event.location = location.clone();
        }
        if let Some(description) = &self.description {
            event.description = description.clone();
        }
    }
}
