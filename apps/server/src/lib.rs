//! # Tavola Server
//!
//! HTTP JSON API for QR table ordering.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Tavola Server                                   │
//! │                                                                         │
//! │  Guests' phones ──┐                                                     │
//! │                   ├──► axum Router ──► handlers (routes/)               │
//! │  Admin panel ─────┘        │               │                            │
//! │                      TraceLayer,           ├──► CartSessions (memory)   │
//! │                      CorsLayer             ├──► tavola-db (SQLite)      │
//! │                                            └──► PaymentGateway          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ServerConfig`]. Environment variables:
//! - `TAVOLA_CONFIG` - path to a TOML config file
//! - `TAVOLA_PORT` - HTTP port (default: 8080)
//! - `TAVOLA_DATABASE_PATH` - SQLite file (default: tavola.db)
//! - `TAVOLA_APP_URL` - public URL encoded in table QR codes
//! - `TAVOLA_CHECKOUT_URL` - hosted checkout page
//! - `TAVOLA_PAYMENT_SECRET` - key the provider signs success callbacks with
//! - `RUST_LOG` - log filter

pub mod config;
pub mod error;
pub mod payment;
pub mod routes;
pub mod session;
pub mod state;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use error::{ApiError, ErrorCode};
pub use payment::{
    sign_confirmation, CheckoutRequest, CheckoutSession, HostedCheckoutGateway, PaymentConfirmation,
    PaymentError, PaymentGateway,
};
pub use session::CartSessions;
pub use state::AppState;

/// Builds the application router with request tracing and CORS.
pub fn build_router(state: AppState) -> Router {
    routes::api_routes()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
