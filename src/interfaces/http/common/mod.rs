//! Shared HTTP building blocks: response envelope, error mapping and the
//! validating JSON extractor.

mod error;
mod validated_json;

pub use error::{ApiError, ApiResult};
pub use validated_json::{
    field_errors, FieldError, ValidatedJson, ValidatedJsonRejection, ValidationDetails,
};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standard API response envelope
///
/// Every REST endpoint wraps its payload in this envelope.
/// On success: `{"success": true, "data": {...}}`,
/// on failure: `{"success": false, "data": null, "error": "message"}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    /// Payload; `null` on failure
    pub data: Option<T>,
    /// Error message; omitted on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Empty payload for operations without return data
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EmptyData {}
