//! # Order Numbers
//!
//! Human-readable order numbers of the form `ORD-YYYYMMDD-NNNN`.
//!
//! ```text
//!   ORD-20261018-0042
//!       ────────  ────
//!       │         └── 42nd order of the day (per-day counter, from 1)
//!       └──────────── service day (UTC)
//! ```
//!
//! The sequence comes from a counter row that tavola-db increments in the
//! same transaction as the order insert, and the column is UNIQUE, so two
//! orders can never share a number.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::ValidationError;

const PREFIX: &str = "ORD";
const DAY_FORMAT: &str = "%Y%m%d";

/// A parsed order number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderNumber {
    date: NaiveDate,
    sequence: u32,
}

impl OrderNumber {
    /// Creates an order number. `sequence` starts at 1 each day.
    pub const fn new(date: NaiveDate, sequence: u32) -> Self {
        OrderNumber { date, sequence }
    }

    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    pub const fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Key of the per-day counter row, e.g. `"20261018"`.
    pub fn day_key(date: NaiveDate) -> String {
        date.format(DAY_FORMAT).to_string()
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{:04}",
            PREFIX,
            self.date.format(DAY_FORMAT),
            self.sequence
        )
    }
}

impl FromStr for OrderNumber {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "orderNumber".to_string(),
            reason: reason.to_string(),
        };

        let mut parts = s.split('-');
        let (Some(prefix), Some(day), Some(seq), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid("expected ORD-YYYYMMDD-NNNN"));
        };

        if prefix != PREFIX {
            return Err(invalid("must start with ORD"));
        }

        let date = NaiveDate::parse_from_str(day, DAY_FORMAT)
            .map_err(|_| invalid("date must be YYYYMMDD"))?;

        if seq.len() < 4 || !seq.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("sequence must be at least four digits"));
        }
        let sequence: u32 = seq
            .parse()
            .map_err(|_| invalid("sequence is out of range"))?;
        if sequence == 0 {
            return Err(invalid("sequence starts at 1"));
        }

        Ok(OrderNumber { date, sequence })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
