//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Stockroom                              │
//! │                                                                         │
//! │  ValidationError ──► CoreError ──► DbError ──► ApiError ──► Response   │
//! │  (bad input)         (domain)      (storage)    (code)                  │
//! │                                                                         │
//! │  ApiError is rendered as                                                │
//! │     HTTP <status>                                                       │
//! │     { "code": "NOT_FOUND", "message": "Product not found: 7f3c..." }   │
//! │                                                                         │
//! │  Internal failures are logged with detail and answered with a          │
//! │  generic message.                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status Mapping
//! | Kind                          | HTTP | Code                 |
//! |-------------------------------|------|----------------------|
//! | validation, invalid operation | 400  | `VALIDATION_ERROR`   |
//! | insufficient stock            | 400  | `INSUFFICIENT_STOCK` |
//! | not found                     | 404  | `NOT_FOUND`          |
//! | still referenced, duplicate   | 409  | `CONFLICT`           |
//! | database failure              | 500  | `DATABASE_ERROR`     |
//! | anything else                 | 500  | `INTERNAL`           |
//! | database unreachable          | 503  | `UNAVAILABLE`        |

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

use stockroom_core::{CoreError, ValidationError};
use stockroom_db::DbError;

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error returned from HTTP handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Product not found: 7f3c..."
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
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
    /// Input validation failed (400)
    ValidationError,

    /// Not enough stock for a sale (400)
    InsufficientStock,

    /// Resource not found (404)
    NotFound,

    /// Entity still referenced or duplicate (409)
    Conflict,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,

    /// Database unreachable (503)
    Unavailable,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::ValidationError | ErrorCode::InsufficientStock => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a service-unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unavailable, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { .. } => ApiError::new(ErrorCode::NotFound, err.to_string()),
            CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            CoreError::InvalidOperation(message) => ApiError::validation(message),
            CoreError::StillReferenced { .. } => ApiError::new(ErrorCode::Conflict, err.to_string()),
            CoreError::Validation(e) => e.into(),
        }
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::new(ErrorCode::NotFound, err.to_string()),
            DbError::UniqueViolation { .. } => ApiError::new(ErrorCode::Conflict, err.to_string()),
            DbError::CheckViolation { message } => {
                warn!(%message, "Constraint violation reached the database");
                ApiError::validation("Value violates a data constraint")
            }
            DbError::ForeignKeyViolation { message } => {
                warn!(%message, "Foreign key violation");
                ApiError::new(ErrorCode::Conflict, "Invalid reference")
            }
            DbError::Domain(e) => e.into(),
            DbError::ConnectionFailed(_) | DbError::PoolExhausted => {
                error!(error = %err, "Database unavailable");
                ApiError::unavailable("Database unavailable")
            }
            DbError::MigrationFailed(_) | DbError::QueryFailed(_) => {
                // Log the actual error but return a generic message
                error!(error = %err, "Database operation failed");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::Internal(_) => {
                error!(error = %err, "Internal database error");
                ApiError::new(ErrorCode::Internal, "Internal server error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

// =============================================================================
// Extractors
// =============================================================================

/// `Json` extractor whose rejection is an [`ApiError`] envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Query` extractor whose rejection is an [`ApiError`] envelope.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_400() {
        let err: ApiError = ValidationError::Required {
            field: "name".to_string(),
        }
        .into();

        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "name is required");
    }

    #[test]
    fn test_domain_errors_through_db() {
        let stock: ApiError = DbError::from(CoreError::InsufficientStock {
            product: "Rice".to_string(),
            available: 1,
            requested: 2,
        })
        .into();
        assert_eq!(stock.code, ErrorCode::InsufficientStock);
        assert_eq!(stock.status(), StatusCode::BAD_REQUEST);

        let conflict: ApiError = DbError::from(CoreError::StillReferenced {
            entity: "Category",
            id: "c1".to_string(),
            referrer: "products",
            count: 2,
        })
        .into();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let invalid: ApiError =
            DbError::from(CoreError::InvalidOperation("nope".to_string())).into();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_db_errors() {
        let missing: ApiError = DbError::not_found("Sale", "s1").into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.message, "Sale not found: s1");

        let internal: ApiError = DbError::QueryFailed("syntax error near FROM".to_string()).into();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.message, "Database operation failed");

        let down: ApiError = DbError::PoolExhausted.into();
        assert_eq!(down.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_envelope_shape() {
        let body = serde_json::to_value(ApiError::validation("bad")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "code": "VALIDATION_ERROR", "message": "bad" })
        );
    }
}
