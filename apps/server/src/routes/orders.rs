//! # Order Endpoints
//!
//! Creation, staff queries, status updates and the payment hand-off.
//!
//! ## Creation Contract
//! ```text
//! POST /api/orders
//! {
//!   "tableId": "…", "items": [{ "menuItemId", "quantity", "unitPriceCents", … }],
//!   "subtotalCents", "taxCents", "tipCents", "totalCents",
//!   "paymentStatus"?, "idempotencyKey"?
//! }
//!
//! 201 { orderId, orderNumber, order, replayed: false }   new order
//! 200 { orderId, orderNumber, order, replayed: true }    same idempotencyKey seen
//! 400 empty items, tampered price, totals mismatch
//! 404 unknown table
//! 409 idempotencyKey already used for a different order
//! ```

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tavola_core::validation::validate_idempotency_key;
use tavola_core::{Order, OrderNumber, OrderStatus, OrderSubmission, OrderUpdate, PaymentStatus};
use tavola_db::{CreatedOrder, OrderFilter};
use tracing::{debug, info};

use super::{ApiJson, ApiQuery};
use crate::error::{ApiError, ApiResult};
use crate::payment::{return_urls, CheckoutRequest, CheckoutSession};
use crate::state::AppState;

/// Body returned when an order is created or replayed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    pub order_id: String,
    pub order_number: String,
    pub order: Order,
    pub replayed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout: Option<CheckoutSession>,
}

impl OrderCreated {
    pub fn new(created: CreatedOrder) -> Self {
        OrderCreated {
            order_id: created.order.id.clone(),
            order_number: created.order.order_number.clone(),
            order: created.order,
            replayed: created.replayed,
            checkout: None,
        }
    }

    /// 201 for a new order, 200 for a replay.
    pub fn status(&self) -> StatusCode {
        if self.replayed {
            StatusCode::OK
        } else {
            StatusCode::CREATED
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub table_id: Option<String>,
    /// `ORD-YYYYMMDD-NNNN`, as read out by a guest at the counter.
    pub order_number: Option<String>,
}

/// `POST /api/orders`
pub async fn create_order(
    State(state): State<AppState>,
    ApiJson(submission): ApiJson<OrderSubmission>,
) -> ApiResult<(StatusCode, Json<OrderCreated>)> {
    if let Some(key) = &submission.idempotency_key {
        validate_idempotency_key(key)?;
    }

    let created = OrderCreated::new(state.db.orders().create(&submission).await?);
    Ok((created.status(), Json(created)))
}

/// `GET /api/orders?status=&tableId=&orderNumber=` - newest first.
///
/// A malformed order number is a 400, not an empty list.
pub async fn list_orders(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OrderQuery>,
) -> ApiResult<Json<Value>> {
    let order_number = match query.order_number.as_deref().map(str::trim) {
        Some(number) if !number.is_empty() => Some(number.parse::<OrderNumber>()?),
        _ => None,
    };

    let filter = OrderFilter {
        status: query.status,
        table_id: query.table_id.filter(|t| !t.is_empty()),
        order_number,
    };

    let orders = state.db.orders().list(&filter).await?;
    debug!(count = orders.len(), "list_orders");

    Ok(Json(json!({ "orders": orders })))
}

/// `GET /api/orders/{id}`
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let order = find_order(&state, &id).await?;
    Ok(Json(json!({ "order": order })))
}

/// `PATCH /api/orders/{id}`
///
/// Applies whichever of `status` / `paymentStatus` is present. Both go
/// through the transition table; entering COMPLETED stamps `completedAt`.
pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<OrderUpdate>,
) -> ApiResult<Json<Value>> {
    if update.status.is_none() && update.payment_status.is_none() {
        return Err(ApiError::validation(
            "At least one of status or paymentStatus is required",
        ));
    }

    let order = state.db.orders().update_lifecycle(&id, update).await?;
    Ok(Json(json!({ "order": order })))
}

/// `POST /api/orders/{id}/checkout` - hosted checkout handle for an unpaid order.
pub async fn start_checkout(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CheckoutSession>> {
    let order = find_order(&state, &id).await?;
    Ok(Json(open_checkout(&state, &order).await?))
}

pub(crate) async fn find_order(state: &AppState, id: &str) -> ApiResult<Order> {
    state
        .db
        .orders()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", id))
}

/// Asks the payment gateway for a checkout session.
///
/// The order itself is not touched. Failures leave it UNPAID.
pub(crate) async fn open_checkout(state: &AppState, order: &Order) -> ApiResult<CheckoutSession> {
    if order.payment_status == PaymentStatus::Paid {
        return Err(ApiError::conflict(format!(
            "Order {} is already paid",
            order.order_number
        )));
    }
    if order.status == OrderStatus::Cancelled {
        return Err(ApiError::conflict(format!(
            "Order {} is cancelled",
            order.order_number
        )));
    }

    let (success_url, cancel_url) =
        return_urls(state.config.app_url(), order.table_id.as_deref(), &order.id);

    let session = state
        .payments
        .create_checkout(CheckoutRequest {
            order_id: order.id.clone(),
            order_number: order.order_number.clone(),
            table_id: order.table_id.clone(),
            amount_cents: order.total_cents,
            currency: state.config.payments.currency.clone(),
            success_url,
            cancel_url,
        })
        .await?;

    info!(order = %order.order_number, "Checkout handed to payment provider");
    Ok(session)
}
