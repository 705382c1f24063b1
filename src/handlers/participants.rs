//! Handlers for the participant lifecycle of an event

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use crate::handlers::extract::{ApiJson, ApiPath};
use crate::handlers::AppState;
use crate::middleware::AuthUser;
use crate::models::{EventDetails, Participant, RegistrationBuckets, ReviewDecision};
use crate::services::BulkCompletion;
use crate::utils::errors::Result;

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub decision: ReviewDecision,
}

/// ```text
/// POST   /events/{id}/register                          -> register
/// DELETE /events/{id}/register                          -> unregister
/// POST   /events/{id}/participants/{user_id}/review     -> review
/// POST   /events/{id}/participants/{user_id}/check-in   -> check_in
/// DELETE /events/{id}/participants/{user_id}/check-in   -> undo_check_in
/// POST   /events/{id}/participants/{user_id}/complete   -> complete
/// DELETE /events/{id}/participants/{user_id}/complete   -> undo_complete
/// POST   /events/{id}/complete-all                      -> complete_all
/// GET    /events/{id}/registrations                     -> registrations
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events/{id}/register", post(register).delete(unregister))
        .route("/events/{id}/participants/{user_id}/review", post(review))
        .route("/events/{id}/participants/{user_id}/check-in", post(check_in).delete(undo_check_in))
        .route("/events/{id}/participants/{user_id}/complete", post(complete).delete(undo_complete))
        .route("/events/{id}/complete-all", post(complete_all))
        .route("/events/{id}/registrations", get(registrations))
}

pub async fn register(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    ApiPath(event_id): ApiPath<i64>,
) -> Result<Json<EventDetails>> {
    Ok(Json(state.services.participation.register(&actor, event_id).await?))
}

pub async fn unregister(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    ApiPath(event_id): ApiPath<i64>,
) -> Result<Json<EventDetails>> {
    Ok(Json(state.services.participation.unregister(&actor, event_id).await?))
}

pub async fn review(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    ApiPath((event_id, user_id)): ApiPath<(i64, i64)>,
    ApiJson(request): ApiJson<ReviewRequest>,
) -> Result<Json<Participant>> {
    let participant = state
        .services
        .participation
        .review(&actor, event_id, user_id, request.decision)
        .await?;
    Ok(Json(participant))
}

pub async fn check_in(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    ApiPath((event_id, user_id)): ApiPath<(i64, i64)>,
) -> Result<Json<Participant>> {
    Ok(Json(state.services.participation.check_in(&actor, event_id, user_id).await?))
}

pub async fn undo_check_in(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    ApiPath((event_id, user_id)): ApiPath<(i64, i64)>,
) -> Result<Json<Participant>> {
    Ok(Json(state.services.participation.undo_check_in(&actor, event_id, user_id).await?))
}

pub async fn complete(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    ApiPath((event_id, user_id)): ApiPath<(i64, i64)>,
) -> Result<Json<Participant>> {
    Ok(Json(state.services.participation.complete(&actor, event_id, user_id).await?))
}

pub async fn undo_complete(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    ApiPath((event_id, user_id)): ApiPath<(i64, i64)>,
) -> Result<Json<Participant>> {
    Ok(Json(state.services.participation.undo_complete(&actor, event_id, user_id).await?))
}

pub async fn complete_all(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    ApiPath(event_id): ApiPath<i64>,
) -> Result<Json<BulkCompletion>> {
    Ok(Json(state.services.participation.complete_all(&actor, event_id).await?))
}

pub async fn registrations(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    ApiPath(event_id): ApiPath<i64>,
) -> Result<Json<RegistrationBuckets>> {
    Ok(Json(state.services.participation.registrations(&actor, event_id).await?))
}
