//! Request bodies that must pass `validator` rules before a handler runs
//!
//! A body that is not JSON, or does not deserialize, keeps axum's own
//! status code (400, 415 or 422). A body that deserializes but breaks a
//! rule gets `422` with one entry per failed rule:
//!
//! ```json
//! {
//!   "success": false,
//!   "data": { "fields": [ { "field": "duration_hours", "code": "range",
//!                           "message": "duration must be 1–720 hours" } ] },
//!   "error": "duration_hours: duration must be 1–720 hours"
//! }
//! ```

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use super::ApiResponse;

/// `axum::Json` plus `Validate::validate()`.
pub struct ValidatedJson<T>(pub T);

/// One broken rule on one field. Nested fields use dotted paths and list
/// items their index, e.g. `slots[2].label`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub code: String,
    pub message: String,
}

/// `data` of a 422 response
#[derive(Debug, Serialize, ToSchema)]
pub struct ValidationDetails {
    pub fields: Vec<FieldError>,
}

pub enum ValidatedJsonRejection {
    Json(JsonRejection),
    Invalid(Vec<FieldError>),
}

/// Flatten `errors` into field errors, ordered by field path.
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out = Vec::new();
    collect(errors, "", &mut out);
    out.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.code.cmp(&b.code)));
    out
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                out.extend(errs.iter().map(|e| FieldError {
                    field: path.clone(),
                    code: e.code.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed the {} rule", e.code)),
                }));
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(inner, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}

impl IntoResponse for ValidatedJsonRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Json(rejection) => {
                let body = ApiResponse::<()>::error(format!(
                    "Invalid request body: {}",
                    rejection.body_text()
                ));
                (rejection.status(), Json(body)).into_response()
            }
            Self::Invalid(fields) => {
                let summary = if fields.is_empty() {
                    "Validation failed".to_string()
                } else {
                    fields
                        .iter()
                        .map(|f| format!("{}: {}", f.field, f.message))
                        .collect::<Vec<_>>()
                        .join("; ")
                };
                let body = ApiResponse {
                    success: false,
                    data: Some(ValidationDetails { fields }),
                    error: Some(summary),
                };
                (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
            }
        }
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidatedJsonRejection::Json)?;

        if let Err(errors) = value.validate() {
            let fields = field_errors(&errors);
            debug!(fields = fields.len(), "Request body failed validation");
            return Err(ValidatedJsonRejection::Invalid(fields));
        }
        Ok(ValidatedJson(value))
    }
}
