//! Checkout state machine.

use serde::{Deserialize, Serialize};

/// The state of one checkout attempt.
///
/// State transitions:
/// ```text
/// Idle ──► CreatingOrder ──► AwaitingApproval ──► Capturing ──┬──► Settled
///   ▲            │                  │                         └──► Failed
///   │            └──► Failed        └──► Idle (cancel)
///   └── Settled / Failed (reset or new checkout)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CheckoutState {
    /// No attempt in progress.
    #[default]
    Idle,

    /// The order request has been sent to the provider.
    CreatingOrder,

    /// The provider holds an order waiting for the shopper to approve it.
    AwaitingApproval,

    /// Capture of the approved order has been requested.
    Capturing,

    /// Payment captured and cart cleared (terminal for the attempt).
    Settled,

    /// Creation or capture failed; the cart is untouched (terminal for the attempt).
    Failed,
}

impl CheckoutState {
    /// Returns true if a new checkout may start from this state.
    pub fn can_begin(&self) -> bool {
        matches!(
            self,
            CheckoutState::Idle | CheckoutState::Settled | CheckoutState::Failed
        )
    }

    /// Returns true if the shopper can approve or cancel the pending order.
    pub fn is_awaiting_approval(&self) -> bool {
        matches!(self, CheckoutState::AwaitingApproval)
    }

    /// Returns true while a provider call is outstanding.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, CheckoutState::CreatingOrder | CheckoutState::Capturing)
    }

    /// Returns true if the attempt can be aborted.
    pub fn can_abort(&self) -> bool {
        self.is_in_flight() || self.is_awaiting_approval()
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckoutState::Settled | CheckoutState::Failed)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::Idle => "Idle",
            CheckoutState::CreatingOrder => "CreatingOrder",
            CheckoutState::AwaitingApproval => "AwaitingApproval",
            CheckoutState::Capturing => "Capturing",
            CheckoutState::Settled => "Settled",
            CheckoutState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
