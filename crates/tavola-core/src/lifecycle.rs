//! # Order Lifecycle
//!
//! The staff-driven workflow of a submitted order.
//!
//! ## Transition Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  PENDING ──► CONFIRMED ──► PREPARING ──► READY ──► DELIVERED ──► COMPLETED
//! │     │            │                                                      │
//! │     └────────────┴──────► CANCELLED                                     │
//! │                                                                         │
//! │  COMPLETED and CANCELLED are terminal.                                  │
//! │  Entering COMPLETED stamps `completed_at`.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Payment status runs alongside and only ever moves `UNPAID → PAID`.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{OrderStatus, PaymentStatus};

// =============================================================================
// Order Status Transitions
// =============================================================================

impl OrderStatus {
    /// Statuses reachable from `self` in one step.
    pub const fn allowed_next(self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Confirmed, OrderStatus::Cancelled],
            OrderStatus::Confirmed => &[OrderStatus::Preparing, OrderStatus::Cancelled],
            OrderStatus::Preparing => &[OrderStatus::Ready],
            OrderStatus::Ready => &[OrderStatus::Delivered],
            OrderStatus::Delivered => &[OrderStatus::Completed],
            OrderStatus::Completed | OrderStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, to: OrderStatus) -> bool {
        self.allowed_next().contains(&to)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Validates a move to `to`, returning the new status.
    ///
    /// ## Example
    /// ```rust
    /// use tavola_core::OrderStatus;
    ///
    /// assert_eq!(
    ///     OrderStatus::Pending.transition(OrderStatus::Confirmed).unwrap(),
    ///     OrderStatus::Confirmed
    /// );
    /// assert!(OrderStatus::Pending.transition(OrderStatus::Ready).is_err());
    /// ```
    pub fn transition(self, to: OrderStatus) -> CoreResult<OrderStatus> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(CoreError::InvalidTransition { from: self, to })
        }
    }
}

impl PaymentStatus {
    /// Validates a payment status change.
    ///
    /// `UNPAID → PAID` is the only real change; asking for the current value
    /// is accepted as a no-op. Returns whether anything changed.
    pub fn transition(self, to: PaymentStatus) -> CoreResult<bool> {
        match (self, to) {
            (PaymentStatus::Unpaid, PaymentStatus::Paid) => Ok(true),
            (from, to) if from == to => Ok(false),
            (from, to) => Err(CoreError::InvalidPaymentTransition { from, to }),
        }
    }
}

// =============================================================================
// Status Update
// =============================================================================

/// Body of an order status update; absent fields are left alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

/// Current lifecycle fields of a stored order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleState {
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

impl LifecycleState {
    /// Applies an update, validating every requested change.
    ///
    /// ## Rules
    /// - at least one of `status` / `payment_status` must be present
    /// - `status` must follow the transition table (no self-loops)
    /// - `payment_status` must follow [`PaymentStatus::transition`]
    /// - entering `COMPLETED` sets `completed_at = now`
    pub fn apply(self, update: OrderUpdate, now: DateTime<Utc>) -> CoreResult<LifecycleState> {
        if update.status.is_none() && update.payment_status.is_none() {
            return Err(ValidationError::Required {
                field: "status or paymentStatus".to_string(),
            }
            .into());
        }

        let mut next = self;

        if let Some(to) = update.status {
            next.status = self.status.transition(to)?;
            if to == OrderStatus::Completed {
                next.completed_at = Some(now);
            }
        }

        if let Some(to) = update.payment_status {
            self.payment_status.transition(to)?;
            next.payment_status = to;
        }

        Ok(next)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashSet, VecDeque};

    fn state(status: OrderStatus) -> LifecycleState {
        LifecycleState {
            status,
            payment_status: PaymentStatus::Unpaid,
            completed_at: None,
        }
    }

    #[test]
    fn test_happy_path() {
        let path = [
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Delivered,
            OrderStatus::Completed,
        ];
        let mut current = OrderStatus::Pending;
        for next in path {
            current = current.transition(next).unwrap();
        }
        assert!(current.is_terminal());
    }

    #[test]
    fn test_cancel_only_from_pending_or_confirmed() {
        for from in OrderStatus::ALL {
            let allowed = from.can_transition_to(OrderStatus::Cancelled);
            let expected = matches!(from, OrderStatus::Pending | OrderStatus::Confirmed);
            assert_eq!(allowed, expected, "cancel from {}", from);
        }
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in [OrderStatus::Completed, OrderStatus::Cancelled] {
            for to in OrderStatus::ALL {
                assert!(from.transition(to).is_err());
            }
        }
    }

    #[test]
    fn test_no_self_loops() {
        for s in OrderStatus::ALL {
            assert!(!s.can_transition_to(s));
        }
    }

    #[test]
    fn test_skipping_steps_is_rejected() {
        let err = OrderStatus::Pending
            .transition(OrderStatus::Completed)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Completed
            }
        ));
        assert!(OrderStatus::Confirmed.transition(OrderStatus::Ready).is_err());
        assert!(OrderStatus::Preparing.transition(OrderStatus::Cancelled).is_err());
    }

    #[test]
    fn test_completed_only_reachable_through_full_chain() {
        // Walk the graph from PENDING and record the route into COMPLETED.
        let mut queue = VecDeque::from([(OrderStatus::Pending, vec![OrderStatus::Pending])]);
        let mut seen = HashSet::new();
        let mut paths = Vec::new();
        while let Some((s, path)) = queue.pop_front() {
            if !seen.insert(s) {
                continue;
            }
            if s == OrderStatus::Completed {
                paths.push(path.clone());
            }
            for &n in s.allowed_next() {
                let mut p = path.clone();
                p.push(n);
                queue.push_back((n, p));
            }
        }
        assert_eq!(
            paths,
            vec![vec![
                OrderStatus::Pending,
                OrderStatus::Confirmed,
                OrderStatus::Preparing,
                OrderStatus::Ready,
                OrderStatus::Delivered,
                OrderStatus::Completed,
            ]]
        );
    }

    #[test]
    fn test_payment_transitions() {
        assert!(PaymentStatus::Unpaid.transition(PaymentStatus::Paid).unwrap());
        assert!(!PaymentStatus::Paid.transition(PaymentStatus::Paid).unwrap());
        assert!(!PaymentStatus::Unpaid.transition(PaymentStatus::Unpaid).unwrap());
        assert!(PaymentStatus::Paid.transition(PaymentStatus::Unpaid).is_err());
    }

    #[test]
    fn test_apply_stamps_completion() {
        let now = Utc::now();
        let next = state(OrderStatus::Delivered)
            .apply(
                OrderUpdate {
                    status: Some(OrderStatus::Completed),
                    payment_status: None,
                },
                now,
            )
            .unwrap();
        assert_eq!(next.status, OrderStatus::Completed);
        assert_eq!(next.completed_at, Some(now));
    }

    #[test]
    fn test_apply_payment_only() {
        let next = state(OrderStatus::Preparing)
            .apply(
                OrderUpdate {
                    status: None,
                    payment_status: Some(PaymentStatus::Paid),
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(next.status, OrderStatus::Preparing);
        assert_eq!(next.payment_status, PaymentStatus::Paid);
        assert!(next.completed_at.is_none());
    }

    #[test]
    fn test_apply_is_all_or_nothing() {
        let current = LifecycleState {
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Paid,
            completed_at: None,
        };
        let result = current.apply(
            OrderUpdate {
                status: Some(OrderStatus::Confirmed),
                payment_status: Some(PaymentStatus::Unpaid),
            },
            Utc::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_requires_a_field() {
        let err = state(OrderStatus::Pending)
            .apply(OrderUpdate::default(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_update_deserializes_camel_case() {
        let update: OrderUpdate =
            serde_json::from_str(r#"{"status":"CONFIRMED","paymentStatus":"PAID"}"#).unwrap();
        assert_eq!(update.status, Some(OrderStatus::Confirmed));
        assert_eq!(update.payment_status, Some(PaymentStatus::Paid));
    }
}
