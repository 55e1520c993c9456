use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;

use crate::auth::AuthenticatedOwner;
use crate::models::{CreateEventRequest, EventId, ListEventsParams, UpdateEventRequest};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, message, success};

fn parse_id(raw: &str) -> Result<EventId, AppError> {
    raw.parse::<EventId>()
        .map_err(|_| AppError::NotFound("Not Found".to_string()))
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::ValidationError(rejection.body_text()))
}

pub async fn create_event(
    AuthenticatedOwner(owner): AuthenticatedOwner,
    State(state): State<AppState>,
    body: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let request = json_body(body)?;
    let event = state.mutations.create(&owner, &request).await?;
    Ok(created(event).into_response())
}

pub async fn list_events(
    AuthenticatedOwner(owner): AuthenticatedOwner,
    State(state): State<AppState>,
    params: Result<Query<ListEventsParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(params) =
        params.map_err(|rejection| AppError::ValidationError(rejection.body_text()))?;
    let query = state.queries.parse(&params)?;
    let page = state.queries.list(&owner, &query).await?;
    Ok(success(page).into_response())
}

pub async fn upcoming_events(
    AuthenticatedOwner(owner): AuthenticatedOwner,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let page = state.queries.upcoming(&owner, Utc::now()).await?;
    Ok(success(page).into_response())
}

pub async fn get_event(
    AuthenticatedOwner(owner): AuthenticatedOwner,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let event = state.queries.get(&owner, parse_id(&id)?).await?;
    Ok(success(event).into_response())
}

pub async fn update_event(
    AuthenticatedOwner(owner): AuthenticatedOwner,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateEventRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    let request = json_body(body)?;
    let event = state.mutations.update(&owner, id, &request).await?;
    Ok(success(event).into_response())
}

pub async fn delete_event(
    AuthenticatedOwner(owner): AuthenticatedOwner,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    state.mutations.delete(&owner, parse_id(&id)?).await?;
    Ok(message("Event deleted successfully").into_response())
}
