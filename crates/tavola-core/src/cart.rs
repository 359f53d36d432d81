//! # Cart Engine
//!
//! The in-memory cart for one table visit. Every mutation recomputes the
//! stored totals from the lines, so the totals can never drift.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Guest Action             Operation               Cart Change           │
//! │  ────────────             ─────────               ───────────           │
//! │                                                                         │
//! │  Tap "Add" ─────────────► add_item() ───────────► merge (qty + 1)      │
//! │                                                   or push (qty 1)       │
//! │                                                                         │
//! │  +/- stepper ───────────► update_quantity() ────► qty = n              │
//! │                                                   (n <= 0 → remove)     │
//! │                                                                         │
//! │  Swipe to remove ───────► remove_item() ────────► line gone             │
//! │                                                                         │
//! │  Pick a tip ────────────► set_tip() ────────────► total only            │
//! │                                                                         │
//! │  Order placed ──────────► clear() ──────────────► empty, zero totals   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants (hold after every operation)
//! - `subtotal = Σ unit_price × quantity`
//! - `tax = subtotal × 22%`, rounded half-up to the cent
//! - `total = subtotal + tax + tip`
//! - every line has `quantity >= 1`
//! - lines are unique by `(menu_item_id, customizations)`

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, VAT_RATE};
use crate::submission::{OrderSubmission, SubmittedLine};
use crate::types::{Customizations, MenuItem, PaymentStatus};
use crate::validation::{validate_price_cents, validate_tip_cents};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// What the guest picked, before it becomes a cart line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartLine {
    pub menu_item_id: String,
    pub name: String,
    pub name_it: String,
    pub unit_price_cents: i64,
    #[serde(default)]
    pub customizations: Customizations,
    pub special_notes: Option<String>,
}

impl NewCartLine {
    pub fn new(
        menu_item_id: impl Into<String>,
        name: impl Into<String>,
        name_it: impl Into<String>,
        unit_price_cents: i64,
    ) -> Self {
        NewCartLine {
            menu_item_id: menu_item_id.into(),
            name: name.into(),
            name_it: name_it.into(),
            unit_price_cents,
            customizations: Customizations::new(),
            special_notes: None,
        }
    }

    /// Builds a line from the catalog, freezing the current price.
    pub fn from_menu_item(item: &MenuItem) -> Self {
        NewCartLine::new(&item.id, &item.name, &item.name_it, item.price_cents)
    }

    pub fn with_customizations(mut self, customizations: Customizations) -> Self {
        self.customizations = customizations;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.special_notes = Some(notes.into());
        self
    }
}

/// A line in the cart.
///
/// ## Price Freezing
/// `unit_price_cents` is captured when the line is created. A menu price
/// change afterwards does not touch lines already in a cart; the order
/// submission check catches the difference at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Line id (UUID v4), unique within the cart.
    pub id: String,
    pub menu_item_id: String,
    pub name: String,
    pub name_it: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    #[serde(default)]
    pub customizations: Customizations,
    pub special_notes: Option<String>,
}

impl CartItem {
    /// unit price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }

    fn matches(&self, line: &NewCartLine) -> bool {
        self.menu_item_id == line.menu_item_id && self.customizations == line.customizations
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Subtotal, VAT, tip and grand total of a cart or order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub tip_cents: i64,
    pub total_cents: i64,
}

impl CartTotals {
    /// Derives all totals from a subtotal and a tip.
    ///
    /// Shared by the cart and by order submission so both price identically.
    /// Fails with `AmountOverflow` instead of wrapping.
    pub fn compute(subtotal: Money, tip: Money) -> CoreResult<Self> {
        let tax = subtotal.calculate_tax(VAT_RATE);
        let total = subtotal
            .checked_add(tax)
            .and_then(|t| t.checked_add(tip))
            .ok_or(CoreError::AmountOverflow)?;

        Ok(CartTotals {
            subtotal_cents: subtotal.cents(),
            tax_cents: tax.cents(),
            tip_cents: tip.cents(),
            total_cents: total.cents(),
        })
    }
}

/// Σ unit price × quantity over `(unit_price_cents, quantity)` pairs.
pub(crate) fn checked_subtotal<I>(lines: I) -> CoreResult<Money>
where
    I: IntoIterator<Item = (i64, i64)>,
{
    lines
        .into_iter()
        .try_fold(Money::zero(), |acc, (unit_price_cents, quantity)| {
            Money::from_cents(unit_price_cents)
                .checked_mul(quantity)
                .and_then(|line| acc.checked_add(line))
        })
        .ok_or(CoreError::AmountOverflow)
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart for one ordering session.
///
/// Serialize-only: a cart is only ever built through its operations.
#[derive(Debug, Clone, Default, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    items: Vec<CartItem>,
    #[serde(flatten)]
    totals: CartTotals,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds one unit of a menu item.
    ///
    /// ## Behavior
    /// - Same menu item with structurally equal customizations already in
    ///   the cart: that line's quantity goes up by one
    /// - Otherwise: a new line with quantity 1 is appended
    ///
    /// Tip is left untouched. Returns the id of the line that received the
    /// unit.
    pub fn add_item(&mut self, line: NewCartLine) -> CoreResult<String> {
        validate_price_cents(line.unit_price_cents)?;

        let mut items = self.items.clone();

        if let Some(existing) = items.iter_mut().find(|i| i.matches(&line)) {
            let new_qty = existing.quantity + 1;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            existing.quantity = new_qty;
            let id = existing.id.clone();
            self.commit(items)?;
            return Ok(id);
        }

        if items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        let id = Uuid::new_v4().to_string();
        items.push(CartItem {
            id: id.clone(),
            menu_item_id: line.menu_item_id,
            name: line.name,
            name_it: line.name_it,
            unit_price_cents: line.unit_price_cents,
            quantity: 1,
            customizations: line.customizations,
            special_notes: line.special_notes,
        });
        self.commit(items)?;
        Ok(id)
    }

    /// Removes a line. Returns `false` when no such line exists.
    pub fn remove_item(&mut self, line_id: &str) -> bool {
        let mut items = self.items.clone();
        items.retain(|i| i.id != line_id);
        if items.len() == self.items.len() {
            return false;
        }
        // Dropping a line only lowers the totals, so this cannot overflow.
        self.commit(items).is_ok()
    }

    /// Sets the quantity of a line.
    ///
    /// ## Behavior
    /// - `quantity <= 0`: removes the line
    /// - unknown line id: no-op
    pub fn update_quantity(&mut self, line_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            self.remove_item(line_id);
            return Ok(());
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        let mut items = self.items.clone();
        match items.iter_mut().find(|i| i.id == line_id) {
            Some(item) => item.quantity = quantity,
            None => return Ok(()),
        }
        self.commit(items)
    }

    /// Sets the tip. Only the total changes.
    ///
    /// Rejects negative tips and tips above `MAX_TIP_CENTS`; the cart is left
    /// untouched on error.
    pub fn set_tip(&mut self, tip: Money) -> CoreResult<()> {
        validate_tip_cents(tip.cents())?;
        self.totals = CartTotals::compute(self.subtotal(), tip)?;
        Ok(())
    }

    /// Empties the cart and zeroes every total, tip included.
    pub fn clear(&mut self) {
        self.items.clear();
        self.totals = CartTotals::default();
    }

    /// Prices `items` with the current tip and swaps them in. On error the
    /// cart keeps its previous lines and totals.
    fn commit(&mut self, items: Vec<CartItem>) -> CoreResult<()> {
        let subtotal = checked_subtotal(items.iter().map(|i| (i.unit_price_cents, i.quantity)))?;
        self.totals = CartTotals::compute(subtotal, self.tip())?;
        self.items = items;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Read access
    // -------------------------------------------------------------------------

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn item(&self, line_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.id == line_id)
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Number of units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn totals(&self) -> CartTotals {
        self.totals
    }

    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.totals.subtotal_cents)
    }

    pub fn tax(&self) -> Money {
        Money::from_cents(self.totals.tax_cents)
    }

    pub fn tip(&self) -> Money {
        Money::from_cents(self.totals.tip_cents)
    }

    pub fn total(&self) -> Money {
        Money::from_cents(self.totals.total_cents)
    }

    /// Snapshot of the cart as an order submission.
    pub fn to_submission(
        &self,
        table_id: Option<String>,
        idempotency_key: Option<String>,
    ) -> OrderSubmission {
        OrderSubmission {
            table_id,
            items: self
                .items
                .iter()
                .map(|i| SubmittedLine {
                    menu_item_id: i.menu_item_id.clone(),
                    quantity: i.quantity,
                    unit_price_cents: i.unit_price_cents,
                    customizations: i.customizations.clone(),
                    special_notes: i.special_notes.clone(),
                })
                .collect(),
            subtotal_cents: self.totals.subtotal_cents,
            tax_cents: self.totals.tax_cents,
            tip_cents: self.totals.tip_cents,
            total_cents: self.totals.total_cents,
            payment_status: Some(PaymentStatus::Unpaid),
            idempotency_key,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
