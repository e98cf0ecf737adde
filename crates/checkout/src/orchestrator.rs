//! Checkout orchestrator driving one attempt at a time.

use std::sync::Arc;
use std::time::Instant;

use cart::CartStore;
use common::{Money, OrderId};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{CheckoutError, Result};
use crate::order::{OrderContext, OrderRequest};
use crate::provider::{CaptureResult, PaymentProvider};
use crate::state::CheckoutState;

/// Outcome of a settled checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub order_id: OrderId,
    pub capture: CaptureResult,
    #[serde(serialize_with = "common::money::decimal::serialize")]
    pub total: Money,
    pub units: usize,
    /// False when the cart was cleared in memory but the write failed.
    pub cart_persisted: bool,
}

/// Snapshot of the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutStatus {
    pub state: CheckoutState,
    pub attempt_id: Option<Uuid>,
    pub order_id: Option<OrderId>,
    pub failure: Option<String>,
    pub settlement: Option<Settlement>,
}

#[derive(Debug)]
struct Attempt {
    id: Uuid,
    state: CheckoutState,
    order_id: Option<OrderId>,
    total: Money,
    units: usize,
    failure: Option<String>,
    settlement: Option<Settlement>,
    started: Instant,
}

impl Attempt {
    fn idle() -> Self {
        Self {
            id: Uuid::nil(),
            state: CheckoutState::Idle,
            order_id: None,
            total: Money::zero(),
            units: 0,
            failure: None,
            settlement: None,
            started: Instant::now(),
        }
    }

    fn start(total: Money, units: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: CheckoutState::CreatingOrder,
            total,
            units,
            ..Self::idle()
        }
    }

    fn is_current(&self, id: Uuid, expected: CheckoutState) -> bool {
        self.id == id && self.state == expected
    }

    fn fail(&mut self, reason: String) {
        self.state = CheckoutState::Failed;
        self.failure = Some(reason);
        metrics::counter!("checkout_failed_total").increment(1);
        metrics::histogram!("checkout_duration_seconds")
            .record(self.started.elapsed().as_secs_f64());
    }

    fn status(&self) -> CheckoutStatus {
        CheckoutStatus {
            state: self.state,
            attempt_id: (self.state != CheckoutState::Idle).then_some(self.id),
            order_id: self.order_id.clone(),
            failure: self.failure.clone(),
            settlement: self.settlement.clone(),
        }
    }
}

/// Coordinates order creation, approval and capture against the cart.
///
/// The attempt lock is never held across a provider call, so a second
/// checkout or an abort is answered immediately while a call is
/// outstanding. Responses are applied only if the attempt they belong to is
/// still current and in the state that issued the call.
pub struct CheckoutOrchestrator {
    cart: Arc<Mutex<CartStore>>,
    provider: Arc<dyn PaymentProvider>,
    context: OrderContext,
    attempt: Mutex<Attempt>,
}

impl CheckoutOrchestrator {
    /// Creates a new orchestrator.
    pub fn new(
        cart: Arc<Mutex<CartStore>>,
        provider: Arc<dyn PaymentProvider>,
        context: OrderContext,
    ) -> Self {
        Self {
            cart,
            provider,
            context,
            attempt: Mutex::new(Attempt::idle()),
        }
    }

    /// Returns the shared cart.
    pub fn cart(&self) -> &Arc<Mutex<CartStore>> {
        &self.cart
    }

    pub fn context(&self) -> &OrderContext {
        &self.context
    }

    /// Returns a snapshot of the current attempt.
    pub async fn status(&self) -> CheckoutStatus {
        self.attempt.lock().await.status()
    }

    /// Starts a checkout from the current cart.
    ///
    /// Rejected while another attempt is creating or capturing an order, or
    /// while an order awaits approval. A settled or failed attempt is
    /// replaced by a fresh one.
    #[tracing::instrument(skip(self))]
    pub async fn begin_checkout(&self) -> Result<OrderId> {
        let (attempt_id, request) = {
            let mut attempt = self.attempt.lock().await;
            if attempt.state.is_in_flight() {
                metrics::counter!("checkout_rejected_total").increment(1);
                tracing::info!(state = %attempt.state, "duplicate checkout rejected");
                return Err(CheckoutError::AlreadyInFlight {
                    state: attempt.state,
                });
            }
            if !attempt.state.can_begin() {
                metrics::counter!("checkout_rejected_total").increment(1);
                return Err(CheckoutError::InvalidState {
                    action: "begin checkout",
                    state: attempt.state,
                });
            }

            let request = {
                let cart = self.cart.lock().await;
                OrderRequest::from_entries(cart.entries(), &self.context)
            };
            let total = request.validate()?;

            *attempt = Attempt::start(total, request.unit_count());
            (attempt.id, request)
        };

        metrics::counter!("checkout_attempts_total").increment(1);
        tracing::info!(%attempt_id, units = request.unit_count(), "creating order");

        let outcome = self.provider.create_order(&request).await;

        let mut attempt = self.attempt.lock().await;
        if !attempt.is_current(attempt_id, CheckoutState::CreatingOrder) {
            metrics::counter!("checkout_stale_responses_total").increment(1);
            tracing::warn!(%attempt_id, ok = outcome.is_ok(), "ignoring stale order creation response");
            return Err(CheckoutError::Stale { attempt_id });
        }

        match outcome {
            Ok(created) => {
                tracing::info!(%attempt_id, order_id = %created.id, "order awaiting approval");
                attempt.state = CheckoutState::AwaitingApproval;
                attempt.order_id = Some(created.id.clone());
                Ok(created.id)
            }
            Err(e) => {
                tracing::warn!(%attempt_id, error = %e, "order creation failed");
                attempt.fail(e.to_string());
                Err(e)
            }
        }
    }

    /// Captures the approved order and clears the cart on success.
    ///
    /// On capture failure the cart is left exactly as it was.
    #[tracing::instrument(skip(self))]
    pub async fn approve(&self, order_id: &OrderId) -> Result<Settlement> {
        let attempt_id = {
            let mut attempt = self.attempt.lock().await;
            if !attempt.state.is_awaiting_approval() {
                return Err(CheckoutError::InvalidState {
                    action: "approve",
                    state: attempt.state,
                });
            }
            match &attempt.order_id {
                Some(pending) if pending == order_id => {}
                Some(pending) => {
                    return Err(CheckoutError::OrderMismatch {
                        expected: pending.clone(),
                        actual: order_id.clone(),
                    });
                }
                None => {
                    return Err(CheckoutError::InvalidState {
                        action: "approve",
                        state: attempt.state,
                    });
                }
            }
            attempt.state = CheckoutState::Capturing;
            attempt.id
        };

        let outcome = match self.provider.capture_order(order_id).await {
            Ok(capture) if capture.is_completed() => Ok(capture),
            Ok(capture) => Err(CheckoutError::provider(format!(
                "Capture not completed: status {}",
                capture.status
            ))),
            Err(e) => Err(e),
        };

        let mut attempt = self.attempt.lock().await;
        if !attempt.is_current(attempt_id, CheckoutState::Capturing) {
            metrics::counter!("checkout_stale_responses_total").increment(1);
            if outcome.is_ok() {
                tracing::error!(%attempt_id, %order_id, "capture completed for an abandoned attempt; cart left untouched");
            } else {
                tracing::warn!(%attempt_id, %order_id, "ignoring stale capture response");
            }
            return Err(CheckoutError::Stale { attempt_id });
        }

        let capture = match outcome {
            Ok(capture) => capture,
            Err(e) => {
                tracing::warn!(%attempt_id, %order_id, error = %e, "capture failed, cart kept");
                attempt.fail(e.to_string());
                return Err(e);
            }
        };

        let cart_persisted = match self.cart.lock().await.clear_and_persist().await {
            Ok(()) => true,
            Err(e) => {
                metrics::counter!("checkout_post_capture_clear_failures_total").increment(1);
                tracing::error!(%order_id, error = %e, "payment captured but cleared cart was not persisted");
                false
            }
        };

        let settlement = Settlement {
            order_id: order_id.clone(),
            capture,
            total: attempt.total,
            units: attempt.units,
            cart_persisted,
        };
        attempt.state = CheckoutState::Settled;
        attempt.settlement = Some(settlement.clone());

        metrics::counter!("checkout_settled_total").increment(1);
        metrics::histogram!("checkout_duration_seconds")
            .record(attempt.started.elapsed().as_secs_f64());
        tracing::info!(%order_id, total = %settlement.total, "checkout settled");

        Ok(settlement)
    }

    /// Abandons the order awaiting approval. The cart is kept.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self) -> Result<()> {
        let mut attempt = self.attempt.lock().await;
        if !attempt.state.is_awaiting_approval() {
            return Err(CheckoutError::InvalidState {
                action: "cancel",
                state: attempt.state,
            });
        }
        tracing::info!(order_id = ?attempt.order_id, "checkout cancelled");
        *attempt = Attempt::idle();
        Ok(())
    }

    /// Fails the active attempt, e.g. when the provider's buyer flow errors.
    ///
    /// Any provider response still outstanding for it will be ignored.
    #[tracing::instrument(skip(self))]
    pub async fn abort(&self, reason: &str) -> Result<()> {
        let mut attempt = self.attempt.lock().await;
        if !attempt.state.can_abort() {
            return Err(CheckoutError::InvalidState {
                action: "abort",
                state: attempt.state,
            });
        }
        tracing::warn!(state = %attempt.state, reason, "checkout aborted");
        attempt.fail(reason.to_string());
        Ok(())
    }

    /// Returns a finished attempt to `Idle`.
    pub async fn reset(&self) -> Result<()> {
        let mut attempt = self.attempt.lock().await;
        match attempt.state {
            CheckoutState::Idle => Ok(()),
            state if state.is_terminal() => {
                *attempt = Attempt::idle();
                Ok(())
            }
            state => Err(CheckoutError::InvalidState {
                action: "reset",
                state,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use cart_storage::InMemoryBlobStore;
    use common::Product;

    use super::*;
    use crate::provider::InMemoryPaymentProvider;

    async fn setup(units: usize) -> (Arc<CheckoutOrchestrator>, InMemoryPaymentProvider) {
        let mut cart = CartStore::open(Arc::new(InMemoryBlobStore::new()), "tmn-cart")
            .await
            .unwrap();
        let product = Product::new("A", "Widget", Money::from_cents(1000));
        for _ in 0..units {
            cart.add_to_cart(&product).await;
        }

        let provider = InMemoryPaymentProvider::new();
        let orchestrator = CheckoutOrchestrator::new(
            Arc::new(Mutex::new(cart)),
            Arc::new(provider.clone()),
            OrderContext::default(),
        );
        (Arc::new(orchestrator), provider)
    }

    #[tokio::test]
    async fn happy_path_settles_and_clears_cart() {
        let (orchestrator, provider) = setup(2).await;

        let order_id = orchestrator.begin_checkout().await.unwrap();
        assert_eq!(orchestrator.status().await.state, CheckoutState::AwaitingApproval);

        let settlement = orchestrator.approve(&order_id).await.unwrap();

        assert_eq!(settlement.total, Money::from_cents(2000));
        assert_eq!(settlement.units, 2);
        assert!(settlement.cart_persisted);
        assert!(orchestrator.cart().lock().await.is_empty());
        assert_eq!(orchestrator.status().await.state, CheckoutState::Settled);
        assert_eq!(provider.capture_calls(), 1);
    }

    #[tokio::test]
    async fn empty_cart_is_rejected_without_remote_call() {
        let (orchestrator, provider) = setup(0).await;

        let result = orchestrator.begin_checkout().await;

        assert!(matches!(result, Err(CheckoutError::Validation(_))));
        assert_eq!(provider.create_calls(), 0);
        assert_eq!(orchestrator.status().await.state, CheckoutState::Idle);
    }

    #[tokio::test]
    async fn create_failure_moves_to_failed_and_allows_retry() {
        let (orchestrator, provider) = setup(1).await;
        provider.set_fail_on_create(true);

        let result = orchestrator.begin_checkout().await;
        assert!(matches!(result, Err(CheckoutError::Provider(_))));

        let status = orchestrator.status().await;
        assert_eq!(status.state, CheckoutState::Failed);
        assert!(status.failure.unwrap().contains("provider unavailable"));

        provider.set_fail_on_create(false);
        assert!(orchestrator.begin_checkout().await.is_ok());
        assert_eq!(provider.create_calls(), 2);
    }

    #[tokio::test]
    async fn cancel_returns_to_idle_without_capture() {
        let (orchestrator, provider) = setup(1).await;
        orchestrator.begin_checkout().await.unwrap();

        orchestrator.cancel().await.unwrap();

        assert_eq!(orchestrator.status().await.state, CheckoutState::Idle);
        assert_eq!(provider.capture_calls(), 0);
        assert_eq!(orchestrator.cart().lock().await.get_item_count(), 1);
    }

    #[tokio::test]
    async fn cancel_outside_approval_is_rejected() {
        let (orchestrator, _) = setup(1).await;
        assert!(matches!(
            orchestrator.cancel().await,
            Err(CheckoutError::InvalidState { action: "cancel", .. })
        ));
    }

    #[tokio::test]
    async fn approve_rejects_other_order() {
        let (orchestrator, provider) = setup(1).await;
        orchestrator.begin_checkout().await.unwrap();

        let result = orchestrator.approve(&OrderId::new("ORDER-9999")).await;

        assert!(matches!(result, Err(CheckoutError::OrderMismatch { .. })));
        assert_eq!(provider.capture_calls(), 0);
        assert_eq!(orchestrator.status().await.state, CheckoutState::AwaitingApproval);
    }

    #[tokio::test]
    async fn begin_while_awaiting_approval_is_rejected() {
        let (orchestrator, provider) = setup(1).await;
        orchestrator.begin_checkout().await.unwrap();

        let result = orchestrator.begin_checkout().await;

        assert!(matches!(result, Err(CheckoutError::InvalidState { .. })));
        assert_eq!(provider.create_calls(), 1);
    }

    #[tokio::test]
    async fn incomplete_capture_is_a_failure() {
        let (orchestrator, provider) = setup(1).await;
        provider.set_capture_status("PENDING").await;
        let order_id = orchestrator.begin_checkout().await.unwrap();

        let result = orchestrator.approve(&order_id).await;

        assert!(matches!(result, Err(CheckoutError::Provider(m)) if m.contains("PENDING")));
        assert_eq!(orchestrator.cart().lock().await.get_item_count(), 1);
    }

    #[tokio::test]
    async fn reset_only_from_finished_attempts() {
        let (orchestrator, _) = setup(1).await;
        orchestrator.reset().await.unwrap();

        orchestrator.begin_checkout().await.unwrap();
        assert!(orchestrator.reset().await.is_err());

        orchestrator.abort("popup closed").await.unwrap();
        orchestrator.reset().await.unwrap();
        let status = orchestrator.status().await;
        assert_eq!(status.state, CheckoutState::Idle);
        assert_eq!(status.attempt_id, None);
    }
}
