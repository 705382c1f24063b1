//! HTTP mapping of [`VolunteerHubError`]
//!
//! Responses carry `{error, code}` and an [`ErrorCode`] extension the locale
//! middleware uses to replace `error` with a translated message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use crate::utils::errors::{ErrorSeverity, VolunteerHubError};
use crate::utils::logging::log_api_error;

/// Stable code of the error behind a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCode {
    pub code: &'static str,
    /// Validation detail substituted into the translated message
    pub detail: Option<String>,
}

impl VolunteerHubError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            VolunteerHubError::EventNotFound { .. }
            | VolunteerHubError::ParticipantNotFound { .. }
            | VolunteerHubError::UserNotFound { .. }
            | VolunteerHubError::NotificationNotFound { .. } => StatusCode::NOT_FOUND,
            VolunteerHubError::Authentication(_) => StatusCode::UNAUTHORIZED,
            VolunteerHubError::Unauthorized(_) => StatusCode::FORBIDDEN,
            VolunteerHubError::Conflict(_) => StatusCode::CONFLICT,
            VolunteerHubError::InvalidState(_) | VolunteerHubError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for VolunteerHubError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        let message = match &self {
            VolunteerHubError::Conflict(reason) => reason.to_string(),
            VolunteerHubError::InvalidState(violation) => violation.to_string(),
            VolunteerHubError::InvalidInput(detail) => detail.clone(),
            VolunteerHubError::Unauthorized(_) => "permission denied".to_string(),
            _ if status.is_server_error() => {
                if self.severity() == ErrorSeverity::Critical {
                    tracing::error!(severity = %self.severity(), "Critical failure while serving request");
                }
                log_api_error("http", &self.to_string(), Some(code));
                "an internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let detail = match &self {
            VolunteerHubError::InvalidInput(detail) => Some(detail.clone()),
            _ => None,
        };

        let mut response = (status, Json(json!({ "error": message, "code": code }))).into_response();
        response.extensions_mut().insert(ErrorCode { code, detail });
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::errors::{ConflictReason, StateViolation};

    #[test]
    fn test_status_families() {
        assert_eq!(VolunteerHubError::EventNotFound { event_id: 1 }.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(VolunteerHubError::Authentication("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(VolunteerHubError::Unauthorized("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(VolunteerHubError::Conflict(ConflictReason::EventFull).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            VolunteerHubError::InvalidState(StateViolation::NotApproved).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            VolunteerHubError::DependencyFailure("db".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_response_carries_code_extension() {
        let response = VolunteerHubError::InvalidInput("hours must be between 1 and 100".into()).into_response();
        let code = response.extensions().get::<ErrorCode>().unwrap();
        assert_eq!(code.code, "invalid_input");
        assert_eq!(code.detail.as_deref(), Some("hours must be between 1 and 100"));
    }
}
