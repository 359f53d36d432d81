//! # Order Submission
//!
//! Turns what a client claims an order costs into what it actually costs.
//!
//! ## Repricing Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OrderSubmission (from client)                                          │
//! │       │                                                                 │
//! │       ├── no items? ───────────────────────► EmptyOrder                 │
//! │       ├── quantity outside 1..=999? ───────► Validation                 │
//! │       ├── menu item unknown / switched off? ► MenuItemNotFound/Unavail. │
//! │       ├── unit price ≠ catalog price? ─────► PriceMismatch              │
//! │       ├── tip outside 0..=€1,000? ─────────► Validation                 │
//! │       ├── amounts overflow? ───────────────► AmountOverflow             │
//! │       ├── subtotal/tax/total ≠ recomputed? ► TotalsMismatch             │
//! │       ▼                                                                 │
//! │  PricedOrder (name snapshots, line totals, server totals)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::{checked_subtotal, CartTotals};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Customizations, MenuItem, Order, PaymentStatus};
use crate::validation::{validate_idempotency_key, validate_quantity, validate_tip_cents};
use crate::MAX_CART_ITEMS;

/// One line of a submitted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedLine {
    pub menu_item_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    #[serde(default)]
    pub customizations: Customizations,
    pub special_notes: Option<String>,
}

/// An order as submitted by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderSubmission {
    pub table_id: Option<String>,
    #[serde(default)]
    pub items: Vec<SubmittedLine>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    #[serde(default)]
    pub tip_cents: i64,
    pub total_cents: i64,
    pub payment_status: Option<PaymentStatus>,
    pub idempotency_key: Option<String>,
}

/// A line after repricing against the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub menu_item_id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
    pub customizations: Customizations,
    pub special_notes: Option<String>,
}

/// An order ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedOrder {
    pub table_id: Option<String>,
    pub lines: Vec<PricedLine>,
    pub totals: CartTotals,
    pub payment_status: PaymentStatus,
    pub idempotency_key: Option<String>,
}

impl OrderSubmission {
    /// Validates the submission against the catalog and recomputes totals.
    ///
    /// `catalog` maps menu item id to the current menu item; it must contain
    /// at least every item the submission references.
    pub fn price(&self, catalog: &HashMap<String, MenuItem>) -> CoreResult<PricedOrder> {
        if self.items.is_empty() {
            return Err(CoreError::EmptyOrder);
        }
        if self.items.len() > MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }
        if let Some(key) = &self.idempotency_key {
            validate_idempotency_key(key)?;
        }

        // Orders start unpaid; PAID is only set by the payment callback.
        let payment_status = match self.payment_status.unwrap_or_default() {
            PaymentStatus::Unpaid => PaymentStatus::Unpaid,
            PaymentStatus::Paid => {
                return Err(ValidationError::NotAllowed {
                    field: "paymentStatus".to_string(),
                    allowed: vec![PaymentStatus::Unpaid.to_string()],
                }
                .into())
            }
        };

        let mut lines = Vec::with_capacity(self.items.len());
        for item in &self.items {
            validate_quantity(item.quantity)?;

            let menu_item = catalog
                .get(&item.menu_item_id)
                .ok_or_else(|| CoreError::MenuItemNotFound(item.menu_item_id.clone()))?;
            if !menu_item.available {
                return Err(CoreError::MenuItemUnavailable(menu_item.name.clone()));
            }
            if item.unit_price_cents != menu_item.price_cents {
                return Err(CoreError::PriceMismatch {
                    menu_item_id: item.menu_item_id.clone(),
                    submitted_cents: item.unit_price_cents,
                    catalog_cents: menu_item.price_cents,
                });
            }

            let line_total = menu_item
                .price()
                .checked_mul(item.quantity)
                .ok_or(CoreError::AmountOverflow)?;

            lines.push(PricedLine {
                menu_item_id: menu_item.id.clone(),
                name: menu_item.name.clone(),
                quantity: item.quantity,
                unit_price_cents: menu_item.price_cents,
                line_total_cents: line_total.cents(),
                customizations: item.customizations.clone(),
                special_notes: item.special_notes.clone(),
            });
        }

        validate_tip_cents(self.tip_cents)?;

        let subtotal = checked_subtotal(lines.iter().map(|l| (l.unit_price_cents, l.quantity)))?;
        let totals = CartTotals::compute(subtotal, Money::from_cents(self.tip_cents))?;

        for (field, submitted, expected) in [
            ("subtotal", self.subtotal_cents, totals.subtotal_cents),
            ("tax", self.tax_cents, totals.tax_cents),
            ("total", self.total_cents, totals.total_cents),
        ] {
            if submitted != expected {
                return Err(CoreError::TotalsMismatch {
                    field,
                    submitted_cents: submitted,
                    expected_cents: expected,
                });
            }
        }

        Ok(PricedOrder {
            table_id: self.table_id.clone(),
            lines,
            totals,
            payment_status,
            idempotency_key: self.idempotency_key.clone(),
        })
    }

    /// Whether `order` is what this submission would have created: same
    /// table, same lines in the same order, same totals.
    ///
    /// Used to tell an idempotent retry from an idempotency key reused for a
    /// different cart.
    pub fn matches_order(&self, order: &Order) -> bool {
        self.table_id == order.table_id
            && self.subtotal_cents == order.subtotal_cents
            && self.tax_cents == order.tax_cents
            && self.tip_cents == order.tip_cents
            && self.total_cents == order.total_cents
            && self.items.len() == order.items.len()
            && self.items.iter().zip(&order.items).all(|(line, stored)| {
                line.menu_item_id == stored.menu_item_id
                    && line.quantity == stored.quantity
                    && line.unit_price_cents == stored.unit_price_cents
                    && line.customizations == stored.customizations
                    && line.special_notes == stored.special_notes
            })
    }

    /// Ids of every menu item the submission references.
    pub fn menu_item_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.items.iter().map(|i| i.menu_item_id.clone()).collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
