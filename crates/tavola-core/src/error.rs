//! # Error Types
//!
//! Domain-specific error types for tavola-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tavola-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tavola-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  tavola-server errors                                                  │
//! │  └── ApiError         - What the client sees (status + code + message) │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → HTTP response          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::{OrderStatus, PaymentStatus};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Menu item referenced by a cart line or order line does not exist.
    #[error("Menu item not found: {0}")]
    MenuItemNotFound(String),

    /// Menu item exists but is switched off (sold out, seasonal).
    #[error("Menu item is not available: {0}")]
    MenuItemUnavailable(String),

    /// Order submitted without any line items.
    #[error("Order must contain at least one item")]
    EmptyOrder,

    /// Submitted unit price differs from the catalog price.
    ///
    /// ## When This Occurs
    /// - The guest's page was open across a menu price change
    /// - A client crafted the request by hand
    #[error("Price for {menu_item_id} is {submitted_cents}, catalog price is {catalog_cents}")]
    PriceMismatch {
        menu_item_id: String,
        submitted_cents: i64,
        catalog_cents: i64,
    },

    /// Submitted totals differ from the server-side recomputation.
    #[error("Submitted {field} {submitted_cents} does not match computed {expected_cents}")]
    TotalsMismatch {
        field: &'static str,
        submitted_cents: i64,
        expected_cents: i64,
    },

    /// Requested status change is not in the transition table.
    ///
    /// ## User Workflow
    /// ```text
    /// Admin clicks "Mark Ready" on a PENDING order
    ///      │
    ///      ▼
    /// PENDING → READY is not in the table
    ///      │
    ///      ▼
    /// InvalidTransition { from: Pending, to: Ready }  (HTTP 409)
    /// ```
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Payment status may only move UNPAID → PAID.
    #[error("Cannot change payment status from {from} to {to}")]
    InvalidPaymentTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// An amount left the range an i64 of cents can hold.
    #[error("Amount is too large")]
    AmountOverflow,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Whether the error is a conflict with current state rather than bad input.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidTransition { .. } | CoreError::InvalidPaymentTransition { .. }
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., table number already used).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_error_message() {
        let err = CoreError::InvalidTransition {
            from: OrderStatus::Pending,
            to: OrderStatus::Ready,
        };
        assert_eq!(err.to_string(), "Cannot move order from PENDING to READY");
        assert!(err.is_conflict());
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "email".to_string(),
        };
        assert_eq!(err.to_string(), "email is required");

        let err = ValidationError::MustNotBeNegative {
            field: "tip".to_string(),
        };
        assert_eq!(err.to_string(), "tip must not be negative");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "number".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert!(!core_err.is_conflict());
    }
}
