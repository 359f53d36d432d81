//! # Session & Cart Endpoints
//!
//! ## User Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Scan QR on table 7                                                    │
//! │     POST /api/sessions { tableId }            → { sessionId }          │
//! │                                                                         │
//! │  Tap "Add" on a burger                                                 │
//! │     POST /api/sessions/{sid}/cart/items       → price frozen from menu │
//! │                                                                         │
//! │  Pick a 10% tip                                                        │
//! │     PUT  /api/sessions/{sid}/cart/tip                                  │
//! │                                                                         │
//! │  "Pay at the counter" or "Pay online"                                  │
//! │     POST /api/sessions/{sid}/checkout                                  │
//! │        counter → order PENDING/UNPAID, cart cleared                    │
//! │        online  → order + checkout handle, cart cleared                 │
//! │                  gateway down → 502, cart kept, retry is safe          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tavola_core::validation::validate_idempotency_key;
use tavola_core::{
    Cart, CartItem, CartTotals, CoreError, Customizations, Money, NewCartLine, PaymentStatus,
};
use tavola_db::DbError;
use tracing::{debug, info, warn};

use super::orders::{open_checkout, OrderCreated};
use super::ApiJson;
use crate::error::{ApiError, ApiResult};
use crate::session::SessionInfo;
use crate::state::AppState;

// =============================================================================
// Request / Response Bodies
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSession {
    #[serde(default)]
    pub table_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItem {
    pub menu_item_id: String,
    #[serde(default)]
    pub customizations: Customizations,
    pub special_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetQuantity {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTip {
    pub tip_cents: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Online,
    Counter,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutBody {
    pub payment: PaymentMethod,
    pub idempotency_key: Option<String>,
}

/// Cart as the QR menu renders it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub session_id: String,
    pub table_id: Option<String>,
    pub items: Vec<CartItem>,
    pub item_count: usize,
    pub total_quantity: i64,
    #[serde(flatten)]
    pub totals: CartTotals,
}

impl CartResponse {
    fn new(session: &SessionInfo, cart: &Cart) -> Self {
        CartResponse {
            session_id: session.session_id.clone(),
            table_id: session.table_id.clone(),
            items: cart.items().to_vec(),
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            totals: cart.totals(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemAdded {
    pub line_id: String,
    pub cart: CartResponse,
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /api/sessions`
pub async fn open_session(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<OpenSession>,
) -> ApiResult<(StatusCode, Json<SessionInfo>)> {
    let table_id = body.table_id.filter(|t| !t.trim().is_empty());

    if let Some(id) = &table_id {
        let table = state
            .db
            .tables()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Table", id))?;

        if !table.active {
            return Err(ApiError::validation(format!(
                "Table {} is not taking orders",
                table.number
            )));
        }
    }

    let session = state.sessions.create(table_id)?;
    info!(session = %session.session_id, table = ?session.table_id, "Ordering session opened");

    Ok((StatusCode::CREATED, Json(session)))
}

/// `DELETE /api/sessions/{sid}`
pub async fn close_session(
    State(state): State<AppState>,
    Path(sid): Path<String>,
) -> ApiResult<StatusCode> {
    if state.sessions.remove(&sid)? {
        debug!(session = %sid, "Ordering session closed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Session", &sid))
    }
}

/// `GET /api/sessions/{sid}/cart`
pub async fn get_cart(
    State(state): State<AppState>,
    Path(sid): Path<String>,
) -> ApiResult<Json<CartResponse>> {
    cart_response(&state, &sid)
}

/// `POST /api/sessions/{sid}/cart/items`
///
/// The price comes from the menu, never from the client.
pub async fn add_item(
    State(state): State<AppState>,
    Path(sid): Path<String>,
    ApiJson(body): ApiJson<AddItem>,
) -> ApiResult<(StatusCode, Json<ItemAdded>)> {
    // Fail fast on a dead session before touching the database
    let session = state.sessions.info(&sid)?;

    let item = state
        .db
        .menu()
        .get_item(&body.menu_item_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Menu item", &body.menu_item_id))?;

    if !item.available {
        return Err(CoreError::MenuItemUnavailable(item.name).into());
    }

    let mut line = NewCartLine::from_menu_item(&item).with_customizations(body.customizations);
    if let Some(notes) = body.special_notes.filter(|n| !n.trim().is_empty()) {
        line = line.with_notes(notes);
    }

    let (line_id, cart) = state.sessions.with_cart_mut(&sid, |cart| {
        cart.add_item(line).map(|id| (id, CartResponse::new(&session, cart)))
    })??;

    debug!(session = %sid, item = %item.id, "add_item");

    Ok((StatusCode::CREATED, Json(ItemAdded { line_id, cart })))
}

/// `PATCH /api/sessions/{sid}/cart/items/{line_id}` - zero or less removes.
pub async fn update_quantity(
    State(state): State<AppState>,
    Path((sid, line_id)): Path<(String, String)>,
    ApiJson(body): ApiJson<SetQuantity>,
) -> ApiResult<Json<CartResponse>> {
    state
        .sessions
        .with_cart_mut(&sid, |cart| cart.update_quantity(&line_id, body.quantity))??;
    cart_response(&state, &sid)
}

/// `DELETE /api/sessions/{sid}/cart/items/{line_id}` - unknown line is a no-op.
pub async fn remove_item(
    State(state): State<AppState>,
    Path((sid, line_id)): Path<(String, String)>,
) -> ApiResult<Json<CartResponse>> {
    state
        .sessions
        .with_cart_mut(&sid, |cart| cart.remove_item(&line_id))?;
    cart_response(&state, &sid)
}

/// `PUT /api/sessions/{sid}/cart/tip`
pub async fn set_tip(
    State(state): State<AppState>,
    Path(sid): Path<String>,
    ApiJson(body): ApiJson<SetTip>,
) -> ApiResult<Json<CartResponse>> {
    state
        .sessions
        .with_cart_mut(&sid, |cart| cart.set_tip(Money::from_cents(body.tip_cents)))??;
    cart_response(&state, &sid)
}

/// `DELETE /api/sessions/{sid}/cart`
pub async fn clear_cart(
    State(state): State<AppState>,
    Path(sid): Path<String>,
) -> ApiResult<Json<CartResponse>> {
    state.sessions.with_cart_mut(&sid, Cart::clear)?;
    cart_response(&state, &sid)
}

/// `POST /api/sessions/{sid}/checkout`
///
/// ## Steps
/// 1. Snapshot the cart under the session's checkout key
/// 2. Create the order (idempotent on the key)
/// 3. Online: ask the gateway for a checkout handle
/// 4. Clear the cart
///
/// Any failure before step 4 leaves the cart as it was.
pub async fn checkout(
    State(state): State<AppState>,
    Path(sid): Path<String>,
    ApiJson(body): ApiJson<CheckoutBody>,
) -> ApiResult<(StatusCode, Json<OrderCreated>)> {
    if let Some(key) = &body.idempotency_key {
        validate_idempotency_key(key)?;
    }

    let ticket = state.sessions.begin_checkout(&sid, body.idempotency_key)??;

    let created = match state.db.orders().create(&ticket.submission).await {
        Ok(created) => created,
        Err(err @ DbError::IdempotencyKeyReused { .. }) => {
            state
                .sessions
                .abandon_checkout(&sid, &ticket.idempotency_key)?;
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };
    let mut created = OrderCreated::new(created);

    if body.payment == PaymentMethod::Online && created.order.payment_status == PaymentStatus::Unpaid
    {
        match open_checkout(&state, &created.order).await {
            Ok(session) => created.checkout = Some(session),
            Err(err) => {
                warn!(
                    session = %sid,
                    order = %created.order_number,
                    "Online checkout failed, cart kept for retry"
                );
                return Err(err);
            }
        }
    }

    state
        .sessions
        .finish_checkout(&sid, &ticket.idempotency_key)?;

    info!(
        session = %sid,
        order = %created.order_number,
        payment = ?body.payment,
        replayed = created.replayed,
        "Cart checked out"
    );

    Ok((created.status(), Json(created)))
}

fn cart_response(state: &AppState, sid: &str) -> ApiResult<Json<CartResponse>> {
    let session = state.sessions.info(sid)?;
    let response = state
        .sessions
        .with_cart(sid, |cart| CartResponse::new(&session, cart))?;
    Ok(Json(response))
}
