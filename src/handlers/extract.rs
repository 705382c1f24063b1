//! Request extractors whose rejections are [`VolunteerHubError`]s
//!
//! Malformed paths, query strings and bodies answer with the same
//! `{error, code}` shape as every other failure and pass through the
//! locale middleware.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use tracing::debug;
use crate::utils::errors::VolunteerHubError;

/// JSON request body
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

/// Typed path parameters
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

/// Typed query string
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

fn rejected(source: &str, detail: String) -> VolunteerHubError {
    debug!(source = source, detail = %detail, "Request rejected by extractor");
    VolunteerHubError::InvalidInput(detail)
}

impl From<JsonRejection> for VolunteerHubError {
    fn from(rejection: JsonRejection) -> Self {
        rejected("body", rejection.body_text())
    }
}

impl From<PathRejection> for VolunteerHubError {
    fn from(rejection: PathRejection) -> Self {
        rejected("path", rejection.body_text())
    }
}

impl From<QueryRejection> for VolunteerHubError {
    fn from(rejection: QueryRejection) -> Self {
        rejected("query", rejection.body_text())
    }
}

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = VolunteerHubError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = VolunteerHubError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Path(value) = axum::extract::Path::<T>::from_request_parts(parts, state).await?;
        Ok(ApiPath(value))
    }
}

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = VolunteerHubError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Query(value) = axum::extract::Query::<T>::from_request_parts(parts, state).await?;
        Ok(ApiQuery(value))
    }
}
