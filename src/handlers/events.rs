//! Handlers for the `/events` resource

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use crate::handlers::extract::{ApiJson, ApiPath, ApiQuery};
use crate::handlers::AppState;
use crate::middleware::AuthUser;
use crate::models::{CreateEventRequest, Event, EventDetails, EventFilter, EventSummary, UpdateEventRequest};
use crate::services::EventUpdate;
use crate::utils::errors::Result;

/// ```text
/// GET    /events        -> list_events
/// POST   /events        -> create_event
/// GET    /events/{id}   -> get_event
/// PUT    /events/{id}   -> update_event
/// DELETE /events/{id}   -> delete_event
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route("/events/{id}", get(get_event).put(update_event).delete(delete_event))
}

pub async fn list_events(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<EventFilter>,
) -> Result<Json<Vec<EventSummary>>> {
    let events = state.services.events.list(&actor, filter).await?;
    Ok(Json(events))
}

pub async fn create_event(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>)> {
    let event = state.services.events.create(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn get_event(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    ApiPath(event_id): ApiPath<i64>,
) -> Result<Json<EventDetails>> {
    Ok(Json(state.services.events.get(&actor, event_id).await?))
}

pub async fn update_event(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    ApiPath(event_id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateEventRequest>,
) -> Result<Json<EventUpdate>> {
    Ok(Json(state.services.events.update(&actor, event_id, request).await?))
}

pub async fn delete_event(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    ApiPath(event_id): ApiPath<i64>,
) -> Result<StatusCode> {
    state.services.events.delete(&actor, event_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
