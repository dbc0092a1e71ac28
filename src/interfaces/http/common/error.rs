//! `DomainError` to HTTP response mapping
//!
//! The only place that decides which status code a domain failure gets.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, warn};

use super::ApiResponse;
use crate::domain::DomainError;

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

pub fn status_of(e: &DomainError) -> StatusCode {
    match e {
        DomainError::NotFound { .. } | DomainError::MissingLocation(_) => StatusCode::NOT_FOUND,
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::Conflict(_) | DomainError::SlotTaken { .. } => StatusCode::CONFLICT,
        DomainError::MissingProfile { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
        DomainError::ProcedureUnavailable(_) | DomainError::Storage(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        let status = status_of(&e);
        let message = match &e {
            DomainError::Unauthorized(m) | DomainError::Forbidden(m) => m.clone(),
            DomainError::Validation(m) | DomainError::Conflict(m) => m.clone(),
            DomainError::Storage(_) | DomainError::ProcedureUnavailable(_) => {
                error!(error = %e, "Storage failure while handling request");
                "The service is temporarily unavailable. Please try again.".to_string()
            }
            _ => e.to_string(),
        };
        if status.is_client_error() {
            warn!(status = status.as_u16(), error = %e, "Request rejected");
        }
        Self { status, message }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::error(self.message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn slot_conflicts_and_outages_map_to_distinct_statuses() {
        let taken = ApiError::from(DomainError::SlotTaken {
            location_id: Uuid::new_v4(),
            slot: "P1".into(),
        });
        assert_eq!(taken.status, StatusCode::CONFLICT);
        assert!(taken.message.contains("P1"));

        let down = ApiError::from(DomainError::Storage("connection reset".into()));
        assert_eq!(down.status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!down.message.contains("connection reset"));
    }

    #[test]
    fn missing_profile_keeps_remediation_message() {
        let e = ApiError::from(DomainError::MissingProfile {
            user_id: Uuid::new_v4(),
        });
        assert_eq!(e.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(e.message.contains("sign up with a new email address"));
    }

    #[test]
    fn forbidden_message_is_shown_verbatim() {
        let e = ApiError::from(DomainError::Forbidden(
            "You can only manage your own properties.".into(),
        ));
        assert_eq!(e.status, StatusCode::FORBIDDEN);
        assert_eq!(e.message, "You can only manage your own properties.");
    }
}
