//! Handlers for Web Push subscription management

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use crate::handlers::extract::ApiJson;
use crate::handlers::AppState;
use crate::middleware::AuthUser;
use crate::models::{NewPushSubscription, PushSubscription};
use crate::utils::errors::Result;

#[derive(Debug, Deserialize)]
pub struct UnsubscribeRequest {
    pub endpoint: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/push/public-key", get(public_key))
        .route("/push/subscribe", post(subscribe))
        .route("/push/unsubscribe", post(unsubscribe))
}

/// VAPID application server key for `pushManager.subscribe`
pub async fn public_key(AuthUser(_): AuthUser, State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "public_key": state.settings.push.vapid_public_key,
        "enabled": state.services.push.is_enabled(),
    }))
}

pub async fn subscribe(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    ApiJson(subscription): ApiJson<NewPushSubscription>,
) -> Result<(StatusCode, Json<PushSubscription>)> {
    let saved = state.services.push.subscribe(&actor, subscription).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn unsubscribe(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UnsubscribeRequest>,
) -> Result<Json<Value>> {
    let removed = state.services.push.unsubscribe(&actor, &request.endpoint).await?;
    Ok(Json(json!({ "removed": removed })))
}
