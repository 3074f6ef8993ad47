//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Handler                                                                │
//! │  Result<Json<T>, ApiError>                                              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  CoreError ──► kind() ──┬── Validation       → 400 VALIDATION_ERROR     │
//! │                         ├── NotFound         → 404 NOT_FOUND            │
//! │                         ├── Conflict         → 409 CONFLICT             │
//! │                         ├── ExternalWorkflow → 502 EXTERNAL_WORKFLOW    │
//! │                         └── Storage          → 500 DATABASE_ERROR       │
//! │                                                 (details logged only)   │
//! │  JsonRejection / bad path id                 → 400 VALIDATION_ERROR     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every failure has the same body:
//! ```json
//! { "code": "CONFLICT", "message": "Item 3 is already assigned to participant 7" }
//! ```

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use splitbill_core::{CoreError, ErrorKind};

/// Error returned from HTTP handlers.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Duplicate assignment or illegal status change (409)
    Conflict,

    /// Extraction workflow reported a failure (502)
    ExternalWorkflow,

    /// Database operation failed (500)
    DatabaseError,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::ExternalWorkflow => StatusCode::BAD_GATEWAY,
            ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match err.kind() {
            ErrorKind::Validation => ErrorCode::ValidationError,
            ErrorKind::NotFound => ErrorCode::NotFound,
            ErrorKind::Conflict => ErrorCode::Conflict,
            ErrorKind::ExternalWorkflow => ErrorCode::ExternalWorkflow,
            ErrorKind::Storage => {
                // Log the actual error but return a generic message
                error!(error = %err, "Storage operation failed");
                return ApiError::new(ErrorCode::DatabaseError, "Database operation failed");
            }
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(format!("Invalid request: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use splitbill_core::ValidationError;
    use uuid::Uuid;

    #[test]
    fn test_core_error_mapping() {
        let not_found: ApiError = CoreError::BillNotFound(Uuid::nil()).into();
        assert_eq!(not_found.code, ErrorCode::NotFound);
        assert_eq!(not_found.code.status(), StatusCode::NOT_FOUND);

        let conflict: ApiError = CoreError::DuplicateAssignment {
            item_id: 1,
            participant_id: 2,
        }
        .into();
        assert_eq!(conflict.code.status(), StatusCode::CONFLICT);

        let invalid: ApiError = CoreError::Validation(ValidationError::NoChanges).into();
        assert_eq!(invalid.code, ErrorCode::ValidationError);
        assert_eq!(invalid.message, "Validation error: No fields to update");
    }

    #[test]
    fn test_storage_details_are_hidden() {
        let err: ApiError = CoreError::Storage("disk I/O error at page 7".into()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("page 7"));
    }

    #[test]
    fn test_code_serialization() {
        let json = serde_json::to_value(ApiError::validation("bad")).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["message"], "bad");
    }
}
