//! Checkout orchestration for the storefront cart.
//!
//! A checkout turns the cart into a provider order, waits for the shopper to
//! approve it, captures it, and only then clears the cart:
//! 1. Create order (one line item per cart unit)
//! 2. Await approval, or cancel back to idle
//! 3. Capture and clear the cart
//!
//! Any failure leaves the cart untouched. At most one attempt is active at a
//! time; responses for superseded attempts are ignored.

pub mod error;
pub mod orchestrator;
pub mod order;
pub mod provider;
pub mod state;

pub use error::{CheckoutError, Result};
pub use orchestrator::{CheckoutOrchestrator, CheckoutStatus, Settlement};
pub use order::{LineItem, OrderContext, OrderRequest};
pub use provider::{
    CaptureResult, CreatedOrder, InMemoryPaymentProvider, OrderDetails, PaymentProvider,
};
pub use state::CheckoutState;
