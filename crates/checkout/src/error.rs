//! Checkout error types.

use common::OrderId;
use thiserror::Error;
use uuid::Uuid;

use crate::state::CheckoutState;

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The order request is malformed; no remote call was made.
    #[error("{0}")]
    Validation(String),

    /// The payment provider was unreachable or rejected the call.
    #[error("{0}")]
    Provider(String),

    /// An order creation or capture is already running.
    #[error("Checkout already in progress ({state})")]
    AlreadyInFlight { state: CheckoutState },

    /// The requested transition is not allowed from the current state.
    #[error("Cannot {action} while checkout is {state}")]
    InvalidState {
        action: &'static str,
        state: CheckoutState,
    },

    /// Approval named an order other than the one awaiting approval.
    #[error("Order {actual} does not match pending order {expected}")]
    OrderMismatch { expected: OrderId, actual: OrderId },

    /// A provider response arrived for an attempt that has since moved on.
    #[error("Ignored response for superseded checkout attempt {attempt_id}")]
    Stale { attempt_id: Uuid },
}

impl CheckoutError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
