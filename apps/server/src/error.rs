//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Tavola                                 │
//! │                                                                         │
//! │  Handler                                                                │
//! │  Result<Json<T>, ApiError>                                              │
//! │         │                                                               │
//! │         ├── CoreError    (pricing, transitions, validation)            │
//! │         ├── DbError      (not found, duplicates, stale writes)         │
//! │         ├── PaymentError (hosted checkout)                             │
//! │         ├── SessionError (unknown or expired cart session)             │
//! │         └── JsonRejection                                              │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │  ApiError { status, code, message } ──► HTTP status + JSON body        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status Mapping
//! | Kind                                      | Status |
//! |-------------------------------------------|--------|
//! | bad input, tampered prices, empty order   | 400    |
//! | missing order/table/session/menu item     | 404    |
//! | illegal transition, stale write, dup      | 409    |
//! | database failure                          | 500    |
//! | payment provider failure                  | 502    |
//!
//! Internal details of 5xx errors are logged, never sent to the client.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tavola_core::{CoreError, ValidationError};
use tavola_db::DbError;
use tracing::{error, warn};

use crate::payment::PaymentError;
use crate::session::SessionError;

/// API error returned from handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Order not found: 3f2a..."
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: ErrorCode,
    pub message: String,
}

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Submitted prices or totals disagree with the menu (400)
    PriceMismatch,

    /// Status change not in the transition table (409)
    InvalidTransition,

    /// Duplicate value or concurrent modification (409)
    Conflict,

    /// Database operation failed (500)
    DatabaseError,

    /// Payment provider error (400/502)
    PaymentError,

    /// Internal server error (500)
    Internal,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: ErrorCode,
    message: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            StatusCode::NOT_FOUND,
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, ErrorCode::ValidationError, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::CONFLICT, ErrorCode::Conflict, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Internal, message)
    }

    fn database(message: &str) -> Self {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::DatabaseError,
            message,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            code: self.code,
            message: &self.message,
        });
        (self.status, body).into_response()
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::PriceMismatch { .. } | CoreError::TotalsMismatch { .. } => {
                ApiError::new(StatusCode::BAD_REQUEST, ErrorCode::PriceMismatch, err.to_string())
            }
            CoreError::InvalidTransition { .. } | CoreError::InvalidPaymentTransition { .. } => {
                ApiError::new(StatusCode::CONFLICT, ErrorCode::InvalidTransition, err.to_string())
            }
            CoreError::Validation(ValidationError::Duplicate { .. }) => {
                ApiError::conflict(err.to_string())
            }
            CoreError::Validation(inner) => ApiError::validation(inner.to_string()),
            CoreError::MenuItemNotFound(_)
            | CoreError::MenuItemUnavailable(_)
            | CoreError::EmptyOrder
            | CoreError::CartTooLarge { .. }
            | CoreError::QuantityTooLarge { .. }
            | CoreError::AmountOverflow => ApiError::validation(err.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::from(CoreError::Validation(err))
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                ApiError::conflict(format!("{} '{}' already exists", field, value))
            }
            DbError::Conflict { entity, id } => ApiError::conflict(format!(
                "{} {} was changed by someone else, reload and retry",
                entity, id
            )),
            DbError::IdempotencyKeyReused { .. } => ApiError::conflict(err.to_string()),
            DbError::Rule(core) => ApiError::from(core),
            DbError::ForeignKeyViolation { message } => {
                warn!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::ConnectionFailed(e) => {
                error!("Database connection failed: {}", e);
                ApiError::database("Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                error!("Database migration failed: {}", e);
                ApiError::database("Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                error!("Database query failed: {}", e);
                ApiError::database("Database operation failed")
            }
            DbError::PoolExhausted => ApiError::database("Database pool exhausted"),
            DbError::Internal(e) => {
                error!("Internal database error: {}", e);
                ApiError::database("Database operation failed")
            }
        }
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::Unavailable(reason) => {
                error!("Payment provider failed: {}", reason);
                ApiError::new(
                    StatusCode::BAD_GATEWAY,
                    ErrorCode::PaymentError,
                    "Payment provider unavailable, try again or pay at the counter",
                )
            }
            other => ApiError::new(
                StatusCode::BAD_REQUEST,
                ErrorCode::PaymentError,
                other.to_string(),
            ),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(id) => ApiError::not_found("Session", &id),
            SessionError::Poisoned => {
                error!("Cart session store poisoned");
                ApiError::internal("Session store unavailable")
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

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
