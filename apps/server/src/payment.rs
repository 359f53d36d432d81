//! # Payment Collaborator
//!
//! Hands an unpaid order to a hosted checkout page and verifies the
//! provider's success callback.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Guest taps "Pay online"                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  create_checkout(order) ──► { sessionId, redirectUrl }                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Browser → hosted checkout page → provider charges the card            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  POST /api/payments/confirm { orderId, sessionId, signature }          │
//! │       │     signature = hex(HMAC-SHA256(secret,                        │
//! │       │                     "{sessionId}.{orderId}.{amountCents}"))     │
//! │       ▼                                                                 │
//! │  confirm_payment() ok ──► order marked PAID                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only the provider holds the signing secret, so a guest who skips the
//! payment page cannot produce a valid confirmation from the session id.
//!
//! A gateway failure never touches the order or the cart. The guest may
//! retry or pay at the counter.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Payment collaborator errors.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Nothing to charge.
    #[error("Amount must be positive, got {0}")]
    InvalidAmount(i64),

    /// The session id was never issued by this gateway, was already
    /// confirmed, or has expired.
    #[error("Unknown checkout session: {0}")]
    UnknownSession(String),

    /// The session was issued for a different order or amount.
    #[error("Checkout session {session_id} does not belong to order {order_id}")]
    SessionMismatch { session_id: String, order_id: String },

    /// The confirmation was not signed by the provider.
    #[error("Payment confirmation signature is invalid")]
    InvalidSignature,

    /// The provider could not be reached or refused the request.
    #[error("Payment provider unavailable: {0}")]
    Unavailable(String),
}

/// What the gateway needs to open a checkout for one order.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub order_id: String,
    pub order_number: String,
    pub table_id: Option<String>,
    pub amount_cents: i64,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// Handle the client follows to pay.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub session_id: String,
    pub redirect_url: String,
}

/// A success callback as relayed to the confirm endpoint.
///
/// `amount_cents` comes from the stored order, never from the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentConfirmation {
    pub order_id: String,
    pub session_id: String,
    pub amount_cents: i64,
    /// Hex HMAC-SHA256 produced by the provider.
    pub signature: String,
}

/// A payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens a checkout session for an order.
    async fn create_checkout(&self, request: CheckoutRequest)
        -> Result<CheckoutSession, PaymentError>;

    /// Verifies that the provider reports `confirmation` as paid.
    async fn confirm_payment(&self, confirmation: &PaymentConfirmation)
        -> Result<(), PaymentError>;
}

/// Success and cancel URLs the hosted page sends the guest back to.
///
/// ```text
/// success: {app}/qr-menu/{tableId}/order-confirmation?orderId={orderId}
/// cancel:  {app}/qr-menu/{tableId}/checkout
/// ```
pub fn return_urls(app_url: &str, table_id: Option<&str>, order_id: &str) -> (String, String) {
    let app = app_url.trim_end_matches('/');
    let base = match table_id {
        Some(table) => format!("{}/qr-menu/{}", app, table),
        None => app.to_string(),
    };

    (
        format!("{}/order-confirmation?orderId={}", base, order_id),
        format!("{}/checkout", base),
    )
}

fn confirmation_mac(
    secret: &str,
    session_id: &str,
    order_id: &str,
    amount_cents: i64,
) -> Result<HmacSha256, PaymentError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| PaymentError::Unavailable("invalid signing key".to_string()))?;
    mac.update(format!("{}.{}.{}", session_id, order_id, amount_cents).as_bytes());
    Ok(mac)
}

/// Signs a success callback the way the hosted checkout page does.
pub fn sign_confirmation(
    secret: &str,
    session_id: &str,
    order_id: &str,
    amount_cents: i64,
) -> Result<String, PaymentError> {
    let mac = confirmation_mac(secret, session_id, order_id, amount_cents)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

// =============================================================================
// Hosted Checkout
// =============================================================================

#[derive(Debug, Clone)]
struct IssuedSession {
    order_id: String,
    amount_cents: i64,
    issued_at: Instant,
}

/// Redirects to a hosted checkout page configured by URL.
///
/// Issued sessions are remembered in memory until confirmed or until
/// `session_ttl` passes, so a confirmation can be checked against the order
/// and amount it was opened for.
pub struct HostedCheckoutGateway {
    checkout_url: Url,
    currency: String,
    signing_secret: String,
    session_ttl: Duration,
    issued: Mutex<HashMap<String, IssuedSession>>,
}

impl HostedCheckoutGateway {
    pub fn new(
        checkout_url: Url,
        currency: impl Into<String>,
        signing_secret: impl Into<String>,
        session_ttl: Duration,
    ) -> Self {
        HostedCheckoutGateway {
            checkout_url,
            currency: currency.into(),
            signing_secret: signing_secret.into(),
            session_ttl,
            issued: Mutex::new(HashMap::new()),
        }
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Sessions still awaiting confirmation.
    pub fn pending_sessions(&self) -> Result<usize, PaymentError> {
        Ok(self.sessions()?.len())
    }

    fn sessions(&self) -> Result<MutexGuard<'_, HashMap<String, IssuedSession>>, PaymentError> {
        self.issued
            .lock()
            .map_err(|_| PaymentError::Unavailable("session store poisoned".to_string()))
    }

    fn purge_expired(&self, sessions: &mut HashMap<String, IssuedSession>) {
        let before = sessions.len();
        sessions.retain(|_, s| s.issued_at.elapsed() < self.session_ttl);
        let purged = before - sessions.len();
        if purged > 0 {
            debug!(purged, "Expired checkout sessions dropped");
        }
    }
}

#[async_trait]
impl PaymentGateway for HostedCheckoutGateway {
    async fn create_checkout(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        if request.amount_cents <= 0 {
            return Err(PaymentError::InvalidAmount(request.amount_cents));
        }

        let session_id = format!("cs_{}", Uuid::new_v4().simple());

        let mut redirect = self.checkout_url.clone();
        redirect
            .query_pairs_mut()
            .append_pair("session_id", &session_id)
            .append_pair("order_id", &request.order_id)
            .append_pair("reference", &request.order_number)
            .append_pair("amount", &request.amount_cents.to_string())
            .append_pair("currency", &request.currency.to_lowercase())
            .append_pair("success_url", &request.success_url)
            .append_pair("cancel_url", &request.cancel_url);

        {
            let mut sessions = self.sessions()?;
            self.purge_expired(&mut sessions);
            sessions.insert(
                session_id.clone(),
                IssuedSession {
                    order_id: request.order_id.clone(),
                    amount_cents: request.amount_cents,
                    issued_at: Instant::now(),
                },
            );
        }

        info!(
            order = %request.order_number,
            amount_cents = request.amount_cents,
            session = %session_id,
            "Checkout session created"
        );

        Ok(CheckoutSession {
            session_id,
            redirect_url: redirect.to_string(),
        })
    }

    async fn confirm_payment(
        &self,
        confirmation: &PaymentConfirmation,
    ) -> Result<(), PaymentError> {
        let session_id = confirmation.session_id.as_str();
        let mut sessions = self.sessions()?;
        self.purge_expired(&mut sessions);

        let Some(issued) = sessions.get(session_id) else {
            warn!(session = %session_id, "Confirm for unknown or expired checkout session");
            return Err(PaymentError::UnknownSession(session_id.to_string()));
        };

        if issued.order_id != confirmation.order_id
            || issued.amount_cents != confirmation.amount_cents
        {
            warn!(
                session = %session_id,
                order_id = %confirmation.order_id,
                "Checkout session/order mismatch"
            );
            return Err(PaymentError::SessionMismatch {
                session_id: session_id.to_string(),
                order_id: confirmation.order_id.clone(),
            });
        }

        let signature =
            hex::decode(confirmation.signature.trim()).map_err(|_| PaymentError::InvalidSignature)?;
        confirmation_mac(
            &self.signing_secret,
            session_id,
            &issued.order_id,
            issued.amount_cents,
        )?
        .verify_slice(&signature)
        .map_err(|_| {
            warn!(session = %session_id, "Payment confirmation signature mismatch");
            PaymentError::InvalidSignature
        })?;

        sessions.remove(session_id);
        debug!(session = %session_id, "Checkout session confirmed");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
