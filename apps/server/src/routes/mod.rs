//! # HTTP Routes
//!
//! ## Route Map
//! ```text
//! GET    /health
//!
//! GET    /api/menu                               menu sections
//! GET    /api/menu/items/{id}
//!
//! POST   /api/sessions                           open ordering session
//! DELETE /api/sessions/{sid}
//! GET    /api/sessions/{sid}/cart
//! DELETE /api/sessions/{sid}/cart                clear
//! POST   /api/sessions/{sid}/cart/items          add item
//! PATCH  /api/sessions/{sid}/cart/items/{line}   set quantity
//! DELETE /api/sessions/{sid}/cart/items/{line}   remove
//! PUT    /api/sessions/{sid}/cart/tip
//! POST   /api/sessions/{sid}/checkout
//!
//! POST   /api/orders                             create (idempotent)
//! GET    /api/orders?status=&tableId=&orderNumber=
//! GET    /api/orders/{id}
//! PATCH  /api/orders/{id}                        status / payment status
//! POST   /api/orders/{id}/checkout               hosted checkout handle
//! POST   /api/payments/confirm                 provider-signed success callback
//!
//! GET    /api/tables
//! POST   /api/tables
//! GET    /api/tables/{id}/link
//!
//! POST   /api/reservations
//! GET    /api/reservations?status=&date=
//! PATCH  /api/reservations/{id}
//! ```

use axum::extract::{FromRequest, FromRequestParts};
use axum::routing::{delete, get, patch, post, put};
use axum::Router;

use crate::error::ApiError;
use crate::state::AppState;

pub mod health;
pub mod menu;
pub mod orders;
pub mod payments;
pub mod reservations;
pub mod sessions;
pub mod tables;

/// JSON body extractor that rejects with an [`ApiError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor that rejects with an [`ApiError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// All API routes, without middleware.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/menu", get(menu::list_menu))
        .route("/api/menu/items/{id}", get(menu::get_item))
        .route("/api/sessions", post(sessions::open_session))
        .route("/api/sessions/{sid}", delete(sessions::close_session))
        .route(
            "/api/sessions/{sid}/cart",
            get(sessions::get_cart).delete(sessions::clear_cart),
        )
        .route("/api/sessions/{sid}/cart/items", post(sessions::add_item))
        .route(
            "/api/sessions/{sid}/cart/items/{line_id}",
            patch(sessions::update_quantity).delete(sessions::remove_item),
        )
        .route("/api/sessions/{sid}/cart/tip", put(sessions::set_tip))
        .route("/api/sessions/{sid}/checkout", post(sessions::checkout))
        .route(
            "/api/orders",
            post(orders::create_order).get(orders::list_orders),
        )
        .route(
            "/api/orders/{id}",
            get(orders::get_order).patch(orders::update_order),
        )
        .route("/api/orders/{id}/checkout", post(orders::start_checkout))
        .route("/api/payments/confirm", post(payments::confirm))
        .route(
            "/api/tables",
            get(tables::list_tables).post(tables::create_table),
        )
        .route("/api/tables/{id}/link", get(tables::table_link))
        .route(
            "/api/reservations",
            post(reservations::create_reservation).get(reservations::list_reservations),
        )
        .route(
            "/api/reservations/{id}",
            patch(reservations::update_reservation),
        )
}
