//! HTTP handlers module
//!
//! This module wires the REST API: shared state, routes and middleware.

pub mod error;
pub mod events;
pub mod extract;
pub mod health;
pub mod notifications;
pub mod participants;
pub mod push;

use std::sync::Arc;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use crate::config::Settings;
use crate::database::DatabaseService;
use crate::i18n::I18n;
use crate::middleware::{localize_errors, log_requests};
use crate::services::ServiceFactory;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub database: DatabaseService,
    pub services: ServiceFactory,
    pub i18n: Arc<I18n>,
}

/// The full application router
///
/// ```text
/// GET  /health
/// /api/events/...          -> events, participants
/// /api/notifications/...   -> notifications
/// /api/push/...            -> push
/// ```
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(events::router())
        .merge(participants::router())
        .merge(notifications::router())
        .merge(push::router());

    Router::new()
        .route("/health", get(health::health))
        .nest("/api", api)
        .layer(from_fn_with_state(state.clone(), localize_errors))
        .layer(from_fn(log_requests))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
