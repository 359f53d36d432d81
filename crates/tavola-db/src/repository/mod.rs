//! # Repository Module
//!
//! Database repository implementations for Tavola.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.orders().create(&submission)                               │
//! │       ▼                                                                 │
//! │  OrderRepository                                                       │
//! │  ├── create(&self, submission)     idempotent, prices, numbers         │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── list(&self, filter)                                               │
//! │  └── update_lifecycle(&self, id, update)                               │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Queries are runtime-checked (`sqlx::query_as::<_, Row>`) against private
//! `FromRow` row structs, then converted into tavola-core domain types.
//!
//! ## Available Repositories
//!
//! - [`order::OrderRepository`] - Orders, order items, order numbers
//! - [`menu::MenuRepository`] - Categories and menu items
//! - [`table::TableRepository`] - Tables and their ordering URLs
//! - [`reservation::ReservationRepository`] - Reservation intake

pub mod menu;
pub mod order;
pub mod reservation;
pub mod table;
