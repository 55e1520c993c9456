use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::event::{Event, EventType};
use super::instant::{day_bounds, parse_day};
use crate::utils::error::{AppError, FieldError};

/// Raw, untrusted query string of `GET /events`.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEventsParams {
    pub take: Option<String>,
    pub skip: Option<String>,
    pub event_type: Option<String>,
    pub location: Option<String>,
    pub search: Option<String>,
    pub date_filter: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// AND-combined filter predicate. Owner scoping is applied separately.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    pub event_type: Option<EventType>,
    /// Case-insensitive substring of `location`.
    pub location: Option<String>,
    /// Case-insensitive substring of `event_name`.
    pub search: Option<String>,
    pub day: Option<NaiveDate>,
    /// Keeps events whose combined start (see [`Event::starts_at`]) is strictly later.
    pub starts_after: Option<DateTime<Utc>>,
}

impl EventFilter {
    pub fn day_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.day.map(day_bounds)
    }

    pub fn matches(&self, event: &Event) -> bool {
        if let Some(kind) = self.event_type {
            if event.event_type != kind {
                return false;
            }
        }
        if let Some(location) = &self.location {
            if !contains_ignore_case(&event.location, location) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            if !contains_ignore_case(&event.event_name, search) {
                return false;
            }
        }
        if let Some((start, end)) = self.day_range() {
            if event.event_date < start || event.event_date >= end {
                return false;
            }
        }
        if let Some(after) = self.starts_after {
            if event.starts_at() <= after {
                return false;
            }
        }
        true
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    EventDate,
    EventTime,
    EventName,
    Location,
    /// Date of `event_date` at the time of day of `event_time`. Internal only.
    StartsAt,
}

impl SortField {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "eventDate" | "date" => Some(SortField::EventDate),
            "eventTime" | "time" => Some(SortField::EventTime),
            "eventName" | "name" => Some(SortField::EventName),
            "location" => Some(SortField::Location),
            _ => None,
        }
    }

}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    fn parse(raw: &str) -> Option<Self> {
        if raw.eq_ignore_ascii_case("asc") {
            Some(SortOrder::Asc)
        } else if raw.eq_ignore_ascii_case("desc") {
            Some(SortOrder::Desc)
        } else {
            None
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventSort {
    pub field: SortField,
    pub order: SortOrder,
}

impl EventSort {
    /// Orders by the sort field, then by ascending id so pages stay stable.
    /// Text fields compare case-insensitively, matching `ORDER BY LOWER(..)`.
    pub fn compare(&self, a: &Event, b: &Event) -> Ordering {
        let primary = match self.field {
            SortField::EventDate => a.event_date.cmp(&b.event_date),
            SortField::EventTime => a.event_time.cmp(&b.event_time),
            SortField::EventName => a.event_name.to_lowercase().cmp(&b.event_name.to_lowercase()),
            SortField::Location => a.location.to_lowercase().cmp(&b.location.to_lowercase()),
            SortField::StartsAt => a.starts_at().cmp(&b.starts_at()),
        };
        let primary = match self.order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_take: u32,
    pub max_take: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_take: 10,
            max_take: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub take: u32,
    pub skip: u64,
}

impl PageRequest {
    /// Builds a page request, capping `take` at the configured maximum.
    pub fn clamped(take: u32, skip: u64, limits: PageLimits) -> Self {
        Self {
            take: take.min(limits.max_take),
            skip,
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.take)
    }

    pub fn offset(&self) -> i64 {
        i64::try_from(self.skip).unwrap_or(i64::MAX)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventQuery {
    pub filter: EventFilter,
    pub sort: EventSort,
    pub page: PageRequest,
}

impl EventQuery {
    pub fn new(filter: EventFilter, sort: EventSort, page: PageRequest) -> Self {
        Self { filter, sort, page }
    }

    /// Validates untrusted query parameters. Every malformed value is reported;
    /// none is silently dropped.
    pub fn from_params(params: &ListEventsParams, limits: PageLimits) -> Result<Self, AppError> {
        let mut errors = Vec::new();

        let take = match present(&params.take) {
            None => limits.default_take,
            Some(raw) => raw.parse::<u32>().unwrap_or_else(|_| {
                errors.push(FieldError::new("take", "must be a non-negative integer"));
                limits.default_take
            }),
        };
        let skip = match present(&params.skip) {
            None => 0,
            Some(raw) => raw.parse::<u64>().unwrap_or_else(|_| {
                errors.push(FieldError::new("skip", "must be a non-negative integer"));
                0
            }),
        };

        let event_type = present(&params.event_type).and_then(|raw| {
            let kind = raw.parse::<EventType>().ok();
            if kind.is_none() {
                errors.push(FieldError::new(
                    "eventType",
                    format!("unknown event type '{raw}'"),
                ));
            }
            kind
        });
        let day = present(&params.date_filter).and_then(|raw| {
            let day = parse_day(raw);
            if day.is_none() {
                errors.push(FieldError::new("dateFilter", "expected a date as YYYY-MM-DD"));
            }
            day
        });

        let field = match present(&params.sort_by) {
            None => SortField::default(),
            Some(raw) => SortField::parse(raw).unwrap_or_else(|| {
                errors.push(FieldError::new(
                    "sortBy",
                    format!("cannot sort by '{raw}'"),
                ));
                SortField::default()
            }),
        };
        let order = match present(&params.sort_order) {
            None => SortOrder::default(),
            Some(raw) => SortOrder::parse(raw).unwrap_or_else(|| {
                errors.push(FieldError::new("sortOrder", "must be 'asc' or 'desc'"));
                SortOrder::default()
            }),
        };

        if !errors.is_empty() {
            return Err(AppError::InvalidFields(errors));
        }

        let filter = EventFilter {
            event_type,
            location: present(&params.location).map(str::to_string),
            search: present(&params.search).map(str::to_string),
            day,
            starts_after: None,
        };
        Ok(Self::new(
            filter,
            EventSort { field, order },
            PageRequest::clamped(take, skip, limits),
        ))
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// One page of events plus the count of all matches for the same filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventPage {
    pub events: Vec<Event>,
    pub total: i64,
}
