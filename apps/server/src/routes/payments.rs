//! Payment success callback.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tavola_core::PaymentStatus;
use tracing::{debug, info};

use super::orders::find_order;
use super::ApiJson;
use crate::error::ApiResult;
use crate::payment::PaymentConfirmation;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPayment {
    pub order_id: String,
    pub session_id: String,
    /// Provider signature over session, order and amount.
    pub signature: String,
}

/// `POST /api/payments/confirm`
///
/// Verifies the provider's signed confirmation for the order's stored
/// total, then marks the order PAID. Confirming an already paid order
/// returns it unchanged.
pub async fn confirm(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ConfirmPayment>,
) -> ApiResult<Json<Value>> {
    let order = find_order(&state, &body.order_id).await?;
    if order.payment_status == PaymentStatus::Paid {
        debug!(order = %order.order_number, "Payment already confirmed");
        return Ok(Json(json!({ "order": order })));
    }

    state
        .payments
        .confirm_payment(&PaymentConfirmation {
            order_id: order.id.clone(),
            session_id: body.session_id,
            amount_cents: order.total_cents,
            signature: body.signature,
        })
        .await?;

    let order = state.db.orders().mark_paid(&order.id).await?;
    info!(order = %order.order_number, "Payment confirmed");

    Ok(Json(json!({ "order": order })))
}
