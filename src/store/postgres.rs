use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{EventStore, StoreError};
use crate::models::{
    Event, EventChanges, EventFilter, EventId, EventPage, EventQuery, NewEvent, OwnerId,
    SortField,
};

const EVENT_COLUMNS: &str = "id, owner_id, event_name, event_type, event_date, event_time, \
                             location, description, created_at, updated_at";

/// UTC date of `event_date` combined with the UTC time of day of `event_time`.
const STARTS_AT: &str = "(((event_date AT TIME ZONE 'UTC')::date \
                         + (event_time AT TIME ZONE 'UTC')::time) AT TIME ZONE 'UTC')";

/// Sort expression for a field. Never derived from caller input.
fn order_expr(field: SortField) -> &'static str {
    match field {
        SortField::EventDate => "event_date",
        SortField::EventTime => "event_time",
        SortField::EventName => "LOWER(event_name)",
        SortField::Location => "LOWER(location)",
        SortField::StartsAt => STARTS_AT,
    }
}

#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escapes `LIKE` metacharacters and wraps the term for a substring match.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn push_scope(
    builder: &mut QueryBuilder<'static, Postgres>,
    owner: &OwnerId,
    filter: &EventFilter,
) {
    builder.push(" WHERE owner_id = ").push_bind(owner.clone());

    if let Some(kind) = filter.event_type {
        builder.push(" AND event_type = ").push_bind(kind);
    }
    if let Some(location) = &filter.location {
        builder
            .push(" AND location ILIKE ")
            .push_bind(like_pattern(location))
            .push(" ESCAPE '\\'");
    }
    if let Some(search) = &filter.search {
        builder
            .push(" AND event_name ILIKE ")
            .push_bind(like_pattern(search))
            .push(" ESCAPE '\\'");
    }
    if let Some((start, end)) = filter.day_range() {
        builder
            .push(" AND event_date >= ")
            .push_bind(start)
            .push(" AND event_date < ")
            .push_bind(end);
    }
    if let Some(after) = filter.starts_after {
        builder
            .push(format!(" AND {STARTS_AT} > "))
            .push_bind(after);
    }
}

fn select_page(owner: &OwnerId, query: &EventQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {EVENT_COLUMNS} FROM events"));
    push_scope(&mut builder, owner, &query.filter);

    // Column and direction come from closed enums, never from the request.
    builder.push(format!(
        " ORDER BY {} {}, id ASC",
        order_expr(query.sort.field),
        query.sort.order.keyword()
    ));
    builder
        .push(" LIMIT ")
        .push_bind(query.page.limit())
        .push(" OFFSET ")
        .push_bind(query.page.offset());
    builder
}

fn select_count(owner: &OwnerId, filter: &EventFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM events");
    push_scope(&mut builder, owner, filter);
    builder
}

fn update_owned(
    owner: &OwnerId,
    id: EventId,
    changes: &EventChanges,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("UPDATE events SET updated_at = now()");

    if let Some(name) = &changes.event_name {
        builder.push(", event_name = ").push_bind(name.clone());
    }
    if let Some(kind) = changes.event_type {
        builder.push(", event_type = ").push_bind(kind);
    }
    if let Some(date) = changes.event_date {
        builder.push(", event_date = ").push_bind(date);
    }
    if let Some(time) = changes.event_time {
        builder.push(", event_time = ").push_bind(time);
    }
    if let Some(location) = &changes.location {
        builder.push(", location = ").push_bind(location.clone());
    }
    if let Some(description) = &changes.description {
        builder.push(", description = ").push_bind(description.clone());
    }

    builder
        .push(" WHERE id = ")
        .push_bind(id)
        .push(" AND owner_id = ")
        .push_bind(owner.clone());
    builder.push(format!(" RETURNING {EVENT_COLUMNS}"));
    builder
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn insert(&self, owner: &OwnerId, event: NewEvent) -> Result<Event, StoreError> {
        let sql = format!(
            "INSERT INTO events \
             (owner_id, event_name, event_type, event_date, event_time, location, description) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {EVENT_COLUMNS}"
        );
        let stored = sqlx::query_as::<_, Event>(&sql)
            .bind(owner)
            .bind(event.event_name)
            .bind(event.event_type)
            .bind(event.event_date)
            .bind(event.event_time)
            .bind(event.location)
            .bind(event.description)
            .fetch_one(&self.pool)
            .await?;
        Ok(stored)
    }

    async fn find(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        let event = sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    async fn update(
        &self,
        owner: &OwnerId,
        id: EventId,
        changes: &EventChanges,
    ) -> Result<Option<Event>, StoreError> {
        let event = update_owned(owner, id, changes)
            .build_query_as::<Event>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    async fn delete(&self, owner: &OwnerId, id: EventId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, owner: &OwnerId, query: &EventQuery) -> Result<EventPage, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let events = select_page(owner, query)
            .build_query_as::<Event>()
            .fetch_all(&mut *tx)
            .await?;
        let total: i64 = select_count(owner, &query.filter)
            .build_query_scalar::<i64>()
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(EventPage { events, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventSort, EventType, PageLimits, PageRequest, SortField, SortOrder};
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("launch"), "%launch%");
        assert_eq!(like_pattern("100%_off\\"), "%100\\%\\_off\\\\%");
    }

    #[test]
    fn test_page_query_binds_every_filter() {
        let query = EventQuery::new(
            EventFilter {
                event_type: Some(EventType::Conference),
                location: Some("'; DROP TABLE events; --".to_string()),
                search: Some("launch".to_string()),
                day: NaiveDate::from_ymd_opt(2025, 6, 1),
                starts_after: None,
            },
            EventSort {
                field: SortField::Location,
                order: SortOrder::Desc,
            },
            PageRequest::clamped(20, 40, PageLimits::default()),
        );
        let builder = select_page(&OwnerId::new("u1"), &query);
        let sql = builder.sql();

        assert!(sql.starts_with("SELECT id, owner_id"));
        assert!(sql.contains("WHERE owner_id = $1"));
        assert!(sql.contains("AND event_type = $2"));
        assert!(sql.contains("AND location ILIKE $3"));
        assert!(sql.contains("AND event_name ILIKE $4"));
        assert!(sql.contains("AND event_date >= $5 AND event_date < $6"));
        assert!(sql.ends_with("ORDER BY LOWER(location) DESC, id ASC LIMIT $7 OFFSET $8"));
        assert!(!sql.contains("DROP TABLE"));
    }

    #[test]
    fn test_upcoming_query_filters_and_orders_by_start() {
        let query = EventQuery::new(
            EventFilter {
                day: NaiveDate::from_ymd_opt(2025, 6, 1),
                starts_after: Some(Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()),
                ..EventFilter::default()
            },
            EventSort {
                field: SortField::StartsAt,
                order: SortOrder::Asc,
            },
            PageRequest::clamped(100, 0, PageLimits::default()),
        );
        let builder = select_page(&OwnerId::new("u1"), &query);
        let sql = builder.sql();

        assert!(sql.contains(&format!("AND {STARTS_AT} > $4")));
        assert!(sql.ends_with(&format!("ORDER BY {STARTS_AT} ASC, id ASC LIMIT $5 OFFSET $6")));

        let count = select_count(&OwnerId::new("u1"), &query.filter);
        assert!(count.sql().ends_with(&format!("AND {STARTS_AT} > $4")));
    }

    #[test]
    fn test_count_query_uses_same_scope() {
        let filter = EventFilter {
            search: Some("launch".to_string()),
            ..EventFilter::default()
        };
        let builder = select_count(&OwnerId::new("u1"), &filter);
        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM events WHERE owner_id = $1 AND event_name ILIKE $2 ESCAPE '\\'"
        );
    }

    #[test]
    fn test_update_only_sets_present_fields() {
        let changes = EventChanges {
            location: Some("Annex".to_string()),
            description: Some(None),
            ..EventChanges::default()
        };
        let builder = update_owned(&OwnerId::new("u1"), 7, &changes);
        let sql = builder.sql();

        assert!(sql.starts_with(
            "UPDATE events SET updated_at = now(), location = $1, description = $2 \
             WHERE id = $3 AND owner_id = $4"
        ));
        assert!(!sql.contains("event_name ="));
    }
}
