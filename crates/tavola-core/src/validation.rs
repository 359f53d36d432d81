//! # Validation Module
//!
//! Input validation utilities for Tavola.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: QR menu / admin front end                                    │
//! │  └── Immediate feedback (empty fields, steppers)                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler (Rust)                                          │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK / NOT NULL constraints                                      │
//! │  └── UNIQUE constraints (table number, order number, idempotency key) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tavola_core::validation::{validate_quantity, validate_table_number};
//!
//! validate_table_number("T12").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::types::{NewReservation, ValidReservation};
use crate::{MAX_ITEM_QUANTITY, MAX_PARTY_SIZE, MAX_PRICE_CENTS, MAX_TIP_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed (tap water).
///
/// ```rust
/// use tavola_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(850).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// assert!(validate_price_cents(i64::MAX).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "price".to_string(),
        });
    }

    if cents > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a tip in cents.
///
/// ## Rules
/// - Must not be negative
/// - Must not exceed MAX_TIP_CENTS (€1,000)
pub fn validate_tip_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "tip".to_string(),
        });
    }

    if cents > MAX_TIP_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "tip".to_string(),
            min: 0,
            max: MAX_TIP_CENTS,
        });
    }

    Ok(())
}

/// Validates a table capacity (seats).
pub fn validate_capacity(capacity: i64) -> ValidationResult<()> {
    if !(1..=MAX_PARTY_SIZE).contains(&capacity) {
        return Err(ValidationError::OutOfRange {
            field: "capacity".to_string(),
            min: 1,
            max: MAX_PARTY_SIZE,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a table number.
///
/// ## Rules
/// - Must not be empty
/// - At most 10 characters
/// - Letters, digits and hyphens only
pub fn validate_table_number(number: &str) -> ValidationResult<()> {
    let number = number.trim();

    if number.is_empty() {
        return Err(ValidationError::Required {
            field: "number".to_string(),
        });
    }

    if number.chars().count() > 10 {
        return Err(ValidationError::TooLong {
            field: "number".to_string(),
            max: 10,
        });
    }

    if !number.chars().all(|c| c.is_alphanumeric() || c == '-') {
        return Err(ValidationError::InvalidFormat {
            field: "number".to_string(),
            reason: "must contain only letters, numbers, and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates a client idempotency key (1-100 visible ASCII characters).
pub fn validate_idempotency_key(key: &str) -> ValidationResult<()> {
    if key.is_empty() {
        return Err(ValidationError::Required {
            field: "idempotencyKey".to_string(),
        });
    }

    if key.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "idempotencyKey".to_string(),
            max: 100,
        });
    }

    if !key.chars().all(|c| c.is_ascii_graphic()) {
        return Err(ValidationError::InvalidFormat {
            field: "idempotencyKey".to_string(),
            reason: "must be printable ASCII without spaces".to_string(),
        });
    }

    Ok(())
}

/// Validates a UUID string.
///
/// ```rust
/// use tavola_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

fn required(value: Option<&str>, field: &str, max: usize) -> ValidationResult<String> {
    let value = value.map(str::trim).unwrap_or_default();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

fn validate_email(email: &str) -> ValidationResult<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid || email.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must be an email address".to_string(),
        });
    }

    Ok(())
}

fn validate_phone(phone: &str) -> ValidationResult<()> {
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'));

    if !allowed || !(6..=15).contains(&digits) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must be a phone number".to_string(),
        });
    }

    Ok(())
}

fn validate_time(time: &str) -> ValidationResult<()> {
    chrono::NaiveTime::parse_from_str(time, "%H:%M").map_err(|_| {
        ValidationError::InvalidFormat {
            field: "time".to_string(),
            reason: "must be HH:MM".to_string(),
        }
    })?;
    Ok(())
}

// =============================================================================
// Reservation
// =============================================================================

/// Validates a reservation request.
///
/// ## Rules
/// - `name`, `email`, `phone`, `date`, `time`, `guests` are required
/// - `date` is `YYYY-MM-DD` and not before `today`
/// - `time` is `HH:MM`
/// - `guests` is 1..=50
pub fn validate_reservation(
    req: &NewReservation,
    today: NaiveDate,
) -> ValidationResult<ValidReservation> {
    let name = required(req.name.as_deref(), "name", 100)?;
    let email = required(req.email.as_deref(), "email", 254)?;
    validate_email(&email)?;
    let phone = required(req.phone.as_deref(), "phone", 30)?;
    validate_phone(&phone)?;

    let date_str = required(req.date.as_deref(), "date", 10)?;
    let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|_| {
        ValidationError::InvalidFormat {
            field: "date".to_string(),
            reason: "must be YYYY-MM-DD".to_string(),
        }
    })?;
    if date < today {
        return Err(ValidationError::InvalidFormat {
            field: "date".to_string(),
            reason: "must not be in the past".to_string(),
        });
    }

    let time = required(req.time.as_deref(), "time", 5)?;
    validate_time(&time)?;

    let guests = req.guests.ok_or_else(|| ValidationError::Required {
        field: "guests".to_string(),
    })?;
    if !(1..=MAX_PARTY_SIZE).contains(&guests) {
        return Err(ValidationError::OutOfRange {
            field: "guests".to_string(),
            min: 1,
            max: MAX_PARTY_SIZE,
        });
    }

    let special_requests = req
        .special_requests
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(ValidReservation {
        name,
        email,
        phone,
        date,
        time,
        guests,
        special_requests,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
