//! # Domain Types
//!
//! Core domain types used throughout Tavola.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │   │    MenuItem     │   │     Table       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  slug           │◄──│  category_id    │   │  number         │       │
//! │  │  display_order  │   │  price_cents    │   │  ordering_url   │       │
//! │  └─────────────────┘   │  allergens      │   └────────┬────────┘       │
//! │                        └────────┬────────┘            │                 │
//! │                                 │ snapshot            │ optional        │
//! │                        ┌────────▼────────┐            │                 │
//! │                        │    OrderItem    │   ┌────────▼────────┐       │
//! │                        │  name, price,   │──►│     Order       │       │
//! │                        │  quantity       │   │  order_number   │       │
//! │                        └─────────────────┘   │  status         │       │
//! │                                              │  payment_status │       │
//! │  ┌─────────────────┐                         └─────────────────┘       │
//! │  │  Reservation    │                                                    │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Orders and tables carry both a UUID `id` (relations) and a human-readable
//! business key (`order_number`, table `number`).

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

/// Opaque guest choices on a line ("no onions", "extra cheese").
///
/// Compared structurally; an empty map means "no customizations".
pub type Customizations = BTreeMap<String, serde_json::Value>;

// =============================================================================
// Order Status
// =============================================================================

/// Workflow state of a submitted order.
///
/// See [`crate::lifecycle`] for the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Submitted by the guest, not yet seen by staff.
    Pending,
    /// Accepted by staff.
    Confirmed,
    /// In the kitchen or at the bar.
    Preparing,
    /// Waiting at the pass.
    Ready,
    /// At the table.
    Delivered,
    /// Closed out.
    Completed,
    /// Abandoned before preparation started.
    Cancelled,
}

impl OrderStatus {
    /// All statuses in workflow order.
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Delivered,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// Wire name, e.g. `"PREPARING"`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "UNPAID",
            PaymentStatus::Paid => "PAID",
        }
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Unpaid
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order
// =============================================================================

/// A submitted order with its frozen line items and totals.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    /// Business key, `ORD-YYYYMMDD-NNNN`.
    pub order_number: String,
    pub table_id: Option<String>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub tip_cents: i64,
    pub total_cents: i64,
    pub items: Vec<OrderItem>,
    /// Client token that made this order's creation idempotent.
    pub idempotency_key: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Total number of units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A line item in an order.
/// Uses snapshot pattern to freeze menu data at time of ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub menu_item_id: String,
    /// Menu item name at time of ordering (frozen).
    pub name: String,
    pub quantity: i64,
    /// Unit price in cents at time of ordering (frozen).
    pub unit_price_cents: i64,
    /// unit_price × quantity.
    pub line_total_cents: i64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub customizations: Customizations,
    pub special_notes: Option<String>,
}

impl OrderItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Menu
// =============================================================================

/// EU-regulated allergens (Regulation 1169/2011, Annex II).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Allergen {
    Gluten,
    Dairy,
    Eggs,
    Fish,
    Shellfish,
    Nuts,
    Peanuts,
    Soy,
    Celery,
    Mustard,
    Sesame,
    Sulfites,
    Lupin,
    Molluscs,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub name_it: String,
    pub display_order: i64,
}

/// A dish or drink on the menu.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub category_id: String,
    pub name: String,
    pub name_it: String,
    pub description: Option<String>,
    pub description_it: Option<String>,
    pub price_cents: i64,
    pub allergens: Vec<Allergen>,
    /// Off when sold out; unavailable items cannot be ordered.
    pub available: bool,
    pub featured: bool,
    /// Beer facts, only set for draught and bottled beers.
    pub abv: Option<f64>,
    pub origin: Option<String>,
    pub style: Option<String>,
}

impl MenuItem {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// One category with its orderable items, as shown on the QR menu.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MenuSection {
    pub category: Category,
    pub items: Vec<MenuItem>,
}

// =============================================================================
// Table
// =============================================================================

/// A physical table with the URL its QR code points at.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: String,
    /// Number painted on the table ("7", "T12", "Garden-2").
    pub number: String,
    pub capacity: i64,
    pub active: bool,
    pub ordering_url: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Table {
    /// URL encoded in a table's QR code: `{app_url}/qr-menu/{table_id}`.
    pub fn ordering_url_for(app_url: &str, table_id: &str) -> String {
        format!("{}/qr-menu/{}", app_url.trim_end_matches('/'), table_id)
    }
}

/// Input for creating a table.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewTable {
    pub number: String,
    pub capacity: Option<i64>,
}

/// Default seats for a new table.
pub const DEFAULT_TABLE_CAPACITY: i64 = 4;

// =============================================================================
// Reservation
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl Default for ReservationStatus {
    fn default() -> Self {
        ReservationStatus::Pending
    }
}

impl ReservationStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "PENDING",
            ReservationStatus::Confirmed => "CONFIRMED",
            ReservationStatus::Cancelled => "CANCELLED",
            ReservationStatus::Completed => "COMPLETED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    /// Local time of arrival, `HH:MM`.
    pub time: String,
    pub guests: i64,
    pub special_requests: Option<String>,
    pub status: ReservationStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Reservation request as submitted by a guest.
///
/// Fields are optional at the type level so that a missing field is reported
/// as a validation error naming it, not as a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewReservation {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub guests: Option<i64>,
    pub special_requests: Option<String>,
}

/// A reservation request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidReservation {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub date: NaiveDate,
    pub time: String,
    pub guests: i64,
    pub special_requests: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_wire_names() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        let parsed: OrderStatus = serde_json::from_str("\"DELIVERED\"").unwrap();
        assert_eq!(parsed, OrderStatus::Delivered);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!(PaymentStatus::default(), PaymentStatus::Unpaid);
        assert_eq!(ReservationStatus::default(), ReservationStatus::Pending);
    }

    #[test]
    fn test_order_item_omits_empty_customizations() {
        let item = OrderItem {
            id: "l1".to_string(),
            order_id: "o1".to_string(),
            menu_item_id: "m1".to_string(),
            name: "Nachos".to_string(),
            quantity: 2,
            unit_price_cents: 850,
            line_total_cents: 1700,
            customizations: Customizations::new(),
            special_notes: None,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert!(json.get("customizations").is_none());
        assert_eq!(json["lineTotalCents"], 1700);
        assert_eq!(item.line_total().cents(), 1700);
    }

    #[test]
    fn test_allergen_names() {
        let json = serde_json::to_string(&vec![Allergen::Gluten, Allergen::Sulfites]).unwrap();
        assert_eq!(json, "[\"GLUTEN\",\"SULFITES\"]");
    }

    #[test]
    fn test_ordering_url() {
        assert_eq!(
            Table::ordering_url_for("https://tavola.example/", "t-7"),
            "https://tavola.example/qr-menu/t-7"
        );
    }
}
