//! # tavola-db: Database Layer for Tavola
//!
//! SQLite storage for menu, tables, orders and reservations, via sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tavola Data Flow                                 │
//! │                                                                         │
//! │  HTTP handler (POST /api/orders)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tavola-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌─────────────────┐  ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories   │  │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                 │  │  (embedded)  │  │   │
//! │  │   │               │    │ OrderRepository │  │              │  │   │
//! │  │   │ SqlitePool    │◄───│ MenuRepository  │  │ 001_initial  │  │   │
//! │  │   │               │    │ TableRepository │  │   _schema    │  │   │
//! │  │   │               │    │ Reservation...  │  │              │  │   │
//! │  │   └───────────────┘    └─────────────────┘  └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tavola_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("tavola.db")).await?;
//! let created = db.orders().create(&submission).await?;
//! println!("{}", created.order.order_number);
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::menu::MenuRepository;
pub use repository::order::{CreatedOrder, OrderFilter, OrderRepository};
pub use repository::reservation::{ReservationFilter, ReservationRepository};
pub use repository::table::TableRepository;
