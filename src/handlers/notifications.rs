//! Handlers for the `/notifications` inbox
//!
//! Every endpoint acts on the authenticated user's own notifications.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use crate::handlers::extract::{ApiPath, ApiQuery};
use crate::handlers::AppState;
use crate::middleware::AuthUser;
use crate::models::Notification;
use crate::utils::errors::Result;

#[derive(Debug, Deserialize)]
pub struct InboxQuery {
    /// Defaults to 20, capped at 100
    pub limit: Option<i64>,
}

/// ```text
/// GET    /notifications                -> list_notifications
/// GET    /notifications/unread-count   -> unread_count
/// POST   /notifications/read-all       -> mark_all_read
/// POST   /notifications/{id}/read      -> mark_read
/// DELETE /notifications/{id}           -> delete_notification
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/{id}/read", post(mark_read))
        .route("/notifications/{id}", delete(delete_notification))
}

pub async fn list_notifications(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<InboxQuery>,
) -> Result<Json<Vec<Notification>>> {
    Ok(Json(state.services.notifications.list(&actor, query.limit).await?))
}

pub async fn unread_count(AuthUser(actor): AuthUser, State(state): State<AppState>) -> Result<Json<Value>> {
    let count = state.services.notifications.unread_count(&actor).await?;
    Ok(Json(json!({ "count": count })))
}

pub async fn mark_all_read(AuthUser(actor): AuthUser, State(state): State<AppState>) -> Result<Json<Value>> {
    let updated = state.services.notifications.mark_all_read(&actor).await?;
    Ok(Json(json!({ "updated": updated })))
}

pub async fn mark_read(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    ApiPath(notification_id): ApiPath<i64>,
) -> Result<StatusCode> {
    state.services.notifications.mark_read(&actor, notification_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_notification(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    ApiPath(notification_id): ApiPath<i64>,
) -> Result<StatusCode> {
    state.services.notifications.delete(&actor, notification_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
