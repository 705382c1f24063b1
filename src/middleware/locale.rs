//! Error message localization
//!
//! Rewrites the `error` field of error responses in the language requested
//! by `Accept-Language`.

use axum::extract::{Request, State};
use axum::http::header::ACCEPT_LANGUAGE;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use crate::handlers::error::ErrorCode;
use crate::handlers::AppState;
use crate::i18n::TranslationParams;

pub async fn localize_errors(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let accept_language = request
        .headers()
        .get(ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let response = next.run(request).await;

    let Some(error) = response.extensions().get::<ErrorCode>().cloned() else {
        return response;
    };

    let lang = state.i18n.detect_language(accept_language.as_deref());
    let mut params = TranslationParams::new();
    if let Some(detail) = &error.detail {
        params.insert("detail".to_string(), detail.clone());
    }
    let message = state.i18n.t(&format!("errors.{}", error.code), &lang, Some(&params));

    let status = response.status();
    let mut localized = (status, Json(json!({ "error": message, "code": error.code }))).into_response();
    localized.extensions_mut().insert(error);
    localized
}
