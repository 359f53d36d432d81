//! # Cart Sessions
//!
//! One cart per ordering session, addressed by an explicit session id.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Guest scans QR ──► POST /api/sessions { tableId } ──► { sessionId }   │
//! │                                                                         │
//! │  Every cart call carries the session id in the path:                   │
//! │     /api/sessions/{sid}/cart/items ...                                 │
//! │                                                                         │
//! │  Checkout ──► order created ──► cart cleared, session stays open       │
//! │                                                                         │
//! │  Idle longer than the configured timeout ──► treated as gone,          │
//! │  purged the next time a session is opened                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Checkout Retries
//! The first checkout attempt on a cart mints an idempotency key and keeps
//! it on the session. A retry after a failure reuses the key, so the same
//! order comes back instead of a duplicate. Any cart mutation drops the key.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tavola_core::{Cart, CoreError, OrderSubmission};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Session store poisoned")]
    Poisoned,
}

/// Public view of a session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: String,
    pub table_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A cart snapshot ready to be submitted as an order.
#[derive(Debug, Clone)]
pub struct CheckoutTicket {
    pub table_id: Option<String>,
    pub idempotency_key: String,
    pub submission: OrderSubmission,
}

struct CartSession {
    info: SessionInfo,
    cart: Cart,
    pending_checkout: Option<String>,
    last_seen: Instant,
}

impl CartSession {
    fn is_expired(&self, idle_timeout: Duration) -> bool {
        self.last_seen.elapsed() >= idle_timeout
    }
}

/// Registry of open cart sessions.
pub struct CartSessions {
    sessions: Mutex<HashMap<String, CartSession>>,
    idle_timeout: Duration,
}

impl CartSessions {
    pub fn new(idle_timeout: Duration) -> Self {
        CartSessions {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, CartSession>>, SessionError> {
        self.sessions.lock().map_err(|_| SessionError::Poisoned)
    }

    /// Opens a session with an empty cart, purging idle ones first.
    pub fn create(&self, table_id: Option<String>) -> Result<SessionInfo, SessionError> {
        let mut sessions = self.lock()?;

        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(self.idle_timeout));
        let purged = before - sessions.len();
        if purged > 0 {
            debug!(purged, "Purged idle cart sessions");
        }

        let info = SessionInfo {
            session_id: Uuid::new_v4().to_string(),
            table_id,
            created_at: Utc::now(),
        };

        sessions.insert(
            info.session_id.clone(),
            CartSession {
                info: info.clone(),
                cart: Cart::new(),
                pending_checkout: None,
                last_seen: Instant::now(),
            },
        );

        Ok(info)
    }

    /// Discards a session and its cart. Returns whether it existed.
    pub fn remove(&self, id: &str) -> Result<bool, SessionError> {
        Ok(self.lock()?.remove(id).is_some())
    }

    pub fn info(&self, id: &str) -> Result<SessionInfo, SessionError> {
        self.with_session(id, |s| s.info.clone())
    }

    /// Reads the cart.
    pub fn with_cart<F, R>(&self, id: &str, f: F) -> Result<R, SessionError>
    where
        F: FnOnce(&Cart) -> R,
    {
        self.with_session(id, |s| f(&s.cart))
    }

    /// Mutates the cart. Any pending checkout key is dropped, since the
    /// cart no longer matches what was submitted under it.
    pub fn with_cart_mut<F, R>(&self, id: &str, f: F) -> Result<R, SessionError>
    where
        F: FnOnce(&mut Cart) -> R,
    {
        self.with_session(id, |s| {
            s.pending_checkout = None;
            f(&mut s.cart)
        })
    }

    /// Snapshots the cart for submission.
    ///
    /// A client-supplied key wins; otherwise the session's pending key is
    /// reused, or a new one minted.
    pub fn begin_checkout(
        &self,
        id: &str,
        client_key: Option<String>,
    ) -> Result<Result<CheckoutTicket, CoreError>, SessionError> {
        self.with_session(id, |s| {
            if s.cart.is_empty() {
                return Err(CoreError::EmptyOrder);
            }

            let key = client_key
                .or_else(|| s.pending_checkout.clone())
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            s.pending_checkout = Some(key.clone());

            Ok(CheckoutTicket {
                table_id: s.info.table_id.clone(),
                submission: s
                    .cart
                    .to_submission(s.info.table_id.clone(), Some(key.clone())),
                idempotency_key: key,
            })
        })
    }

    /// Clears the cart after a successful checkout, unless it was changed
    /// since the ticket was issued.
    pub fn finish_checkout(&self, id: &str, key: &str) -> Result<bool, SessionError> {
        self.with_session(id, |s| {
            if s.pending_checkout.as_deref() != Some(key) {
                return false;
            }
            s.cart.clear();
            s.pending_checkout = None;
            true
        })
    }

    /// Forgets the pending key after the store refused it, so the next
    /// checkout mints a fresh one. The cart is kept.
    pub fn abandon_checkout(&self, id: &str, key: &str) -> Result<(), SessionError> {
        self.with_session(id, |s| {
            if s.pending_checkout.as_deref() == Some(key) {
                s.pending_checkout = None;
            }
        })
    }

    /// Number of sessions held, expired ones included until purged.
    pub fn len(&self) -> Result<usize, SessionError> {
        Ok(self.lock()?.len())
    }

    fn with_session<F, R>(&self, id: &str, f: F) -> Result<R, SessionError>
    where
        F: FnOnce(&mut CartSession) -> R,
    {
        let mut sessions = self.lock()?;
        match sessions.get_mut(id) {
            Some(s) if !s.is_expired(self.idle_timeout) => {
                s.last_seen = Instant::now();
                Ok(f(s))
            }
            _ => Err(SessionError::NotFound(id.to_string())),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
