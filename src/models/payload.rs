use serde::{Deserialize, Deserializer};

use super::event::{EventChanges, EventType, NewEvent};
use super::instant::parse_instant;
use crate::utils::error::{AppError, FieldError};

/// Body of `POST /events`. Every field is optional here so that missing fields
/// are reported together instead of failing on the first one.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub event_name: Option<String>,
    pub event_type: Option<String>,
    pub event_date: Option<String>,
    pub event_time: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

/// Body of `PATCH /events/{id}`.
///
/// Omitted keys leave the stored value untouched. `description: null` or an empty
/// description clears it.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub event_name: Option<String>,
    pub event_type: Option<String>,
    pub event_date: Option<String>,
    pub event_time: Option<String>,
    pub location: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
}

// Distinguishes an explicit `null` (Some(None)) from a missing key (None).
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn normalize_description(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl CreateEventRequest {
    pub fn validate(&self) -> Result<NewEvent, AppError> {
        let mut errors = Vec::new();

        let event_name = non_blank(self.event_name.as_ref());
        if event_name.is_none() {
            errors.push(FieldError::new("eventName", "is required"));
        }

        let event_type = match non_blank(self.event_type.as_ref()) {
            None => {
                errors.push(FieldError::new("eventType", "is required"));
                None
            }
            Some(raw) => {
                let kind = raw.parse::<EventType>().ok();
                if kind.is_none() {
                    errors.push(FieldError::new(
                        "eventType",
                        format!("unknown event type '{raw}'"),
                    ));
                }
                kind
            }
        };

        let event_date = match non_blank(self.event_date.as_ref()) {
            None => {
                errors.push(FieldError::new("eventDate", "is required"));
                None
            }
            Some(raw) => {
                let date = parse_instant(raw);
                if date.is_none() {
                    errors.push(FieldError::new("eventDate", "is not a valid date"));
                }
                date
            }
        };

        let event_time = match non_blank(self.event_time.as_ref()) {
            None => event_date,
            Some(raw) => {
                let time = parse_instant(raw);
                if time.is_none() {
                    errors.push(FieldError::new("eventTime", "is not a valid date"));
                }
                time
            }
        };

        let location = non_blank(self.location.as_ref());
        if location.is_none() {
            errors.push(FieldError::new("location", "is required"));
        }

        match (event_name, event_type, event_date, event_time, location) {
            (Some(name), Some(kind), Some(date), Some(time), Some(location))
                if errors.is_empty() =>
            {
                Ok(NewEvent {
                    event_name: name.to_string(),
                    event_type: kind,
                    event_date: date,
                    event_time: time,
                    location: location.to_string(),
                    description: normalize_description(self.description.as_deref()),
                })
            }
            _ => Err(AppError::InvalidFields(errors)),
        }
    }
}

impl UpdateEventRequest {
    pub fn validate(&self) -> Result<EventChanges, AppError> {
        let mut errors = Vec::new();
        let mut changes = EventChanges::default();

        if let Some(name) = &self.event_name {
            match non_blank(Some(name)) {
                Some(name) => changes.event_name = Some(name.to_string()),
                None => errors.push(FieldError::new("eventName", "must not be empty")),
            }
        }

        if let Some(raw) = &self.event_type {
            match non_blank(Some(raw)).map(|raw| (raw, raw.parse::<EventType>())) {
                Some((_, Ok(kind))) => changes.event_type = Some(kind),
                Some((raw, Err(_))) => errors.push(FieldError::new(
                    "eventType",
                    format!("unknown event type '{raw}'"),
                )),
                None => errors.push(FieldError::new("eventType", "must not be empty")),
            }
        }

        // Blank date strings leave the stored value as it is.
        if let Some(raw) = non_blank(self.event_date.as_ref()) {
            match parse_instant(raw) {
                Some(date) => changes.event_date = Some(date),
                None => errors.push(FieldError::new("eventDate", "is not a valid date")),
            }
        }
        if let Some(raw) = non_blank(self.event_time.as_ref()) {
            match parse_instant(raw) {
                Some(time) => changes.event_time = Some(time),
                None => errors.push(FieldError::new("eventTime", "is not a valid date")),
            }
        }

        if let Some(location) = &self.location {
            match non_blank(Some(location)) {
                Some(location) => changes.location = Some(location.to_string()),
                None => errors.push(FieldError::new("location", "must not be empty")),
            }
        }

        if let Some(description) = &self.description {
            changes.description = Some(normalize_description(description.as_deref()));
        }

        if errors.is_empty() {
            Ok(changes)
        } else {
            Err(AppError::InvalidFields(errors))
        }
    }
}
