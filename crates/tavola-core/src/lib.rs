//! # tavola-core: Pure Business Logic for Tavola
//!
//! Everything that decides *what* an order costs and *where* it may go next
//! lives here, with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tavola Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            QR Menu (guests)      Admin Panel (staff)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP / JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tavola-server (axum)                         │   │
//! │  │    sessions, cart, checkout, orders, tables, reservations       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tavola-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌───────────┐ ┌────────────┐         │   │
//! │  │   │  money  │ │  cart   │ │ lifecycle │ │ submission │         │   │
//! │  │   │ Money   │ │ Cart    │ │ status    │ │ repricing  │         │   │
//! │  │   │ TaxRate │ │ Totals  │ │ machine   │ │ checks     │         │   │
//! │  │   └─────────┘ └─────────┘ └───────────┘ └────────────┘         │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tavola-db (Database Layer)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money and TaxRate with integer arithmetic
//! - [`types`] - Domain records (Order, MenuItem, Table, Reservation, ...)
//! - [`cart`] - The cart engine
//! - [`lifecycle`] - Order status transition table
//! - [`order_number`] - `ORD-YYYYMMDD-NNNN` order numbers
//! - [`submission`] - Server-side repricing of submitted orders
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use tavola_core::cart::{Cart, NewCartLine};
//! use tavola_core::money::Money;
//!
//! let mut cart = Cart::new();
//! cart.add_item(NewCartLine::new("burger-classic", "Cheeseburger", "Cheeseburger", 1200))
//!     .unwrap();
//! cart.set_tip(Money::from_cents(200)).unwrap();
//!
//! assert_eq!(cart.subtotal().cents(), 1200);
//! assert_eq!(cart.tax().cents(), 264);
//! assert_eq!(cart.total().cents(), 1664);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod lifecycle;
pub mod money;
pub mod order_number;
pub mod submission;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartItem, CartTotals, NewCartLine};
pub use error::{CoreError, CoreResult, ValidationError};
pub use lifecycle::{LifecycleState, OrderUpdate};
pub use money::{Money, TaxRate, VAT_RATE};
pub use order_number::OrderNumber;
pub use submission::{OrderSubmission, PricedLine, PricedOrder, SubmittedLine};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart or order.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// Guards against a guest typing 100 instead of 10 on a phone keypad.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum catalog price of a single menu item (€10,000).
pub const MAX_PRICE_CENTS: i64 = 1_000_000;

/// Maximum tip on a single cart or order (€1,000).
pub const MAX_TIP_CENTS: i64 = 100_000;

/// Maximum party size accepted by reservation intake.
pub const MAX_PARTY_SIZE: i64 = 50;
