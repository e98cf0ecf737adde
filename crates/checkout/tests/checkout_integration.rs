//! Integration tests for the checkout orchestrator.

use std::sync::Arc;

use cart::CartStore;
use cart_storage::{BlobStore, InMemoryBlobStore};
use checkout::{
    CheckoutError, CheckoutOrchestrator, CheckoutState, InMemoryPaymentProvider, OrderContext,
    PaymentProvider,
};
use common::{Money, Product};
use tokio::sync::Mutex;

const CART_KEY: &str = "tmn-cart";

struct TestHarness {
    orchestrator: Arc<CheckoutOrchestrator>,
    provider: InMemoryPaymentProvider,
    storage: InMemoryBlobStore,
}

impl TestHarness {
    async fn new() -> Self {
        let storage = InMemoryBlobStore::new();
        let mut cart = CartStore::open(Arc::new(storage.clone()), CART_KEY)
            .await
            .unwrap();

        let sticker = Product::new("p1", "Sticker", Money::from_decimal(9.99));
        let ebook = Product::new("p2", "E-book", Money::from_decimal(4.5));
        cart.add_to_cart(&sticker).await;
        cart.add_to_cart(&sticker).await;
        cart.add_to_cart(&ebook).await;

        let provider = InMemoryPaymentProvider::new();
        let orchestrator = CheckoutOrchestrator::new(
            Arc::new(Mutex::new(cart)),
            Arc::new(provider.clone()),
            OrderContext::default(),
        );

        Self {
            orchestrator: Arc::new(orchestrator),
            provider,
            storage,
        }
    }

    async fn entry_ids(&self) -> Vec<common::EntryId> {
        self.orchestrator.cart().lock().await.entry_ids()
    }

    async fn reopen_cart(&self) -> CartStore {
        let store: Arc<dyn BlobStore> = Arc::new(self.storage.clone());
        CartStore::open(store, CART_KEY).await.unwrap()
    }
}

#[tokio::test]
async fn test_happy_path_clears_persisted_cart() {
    let h = TestHarness::new().await;

    let order_id = h.orchestrator.begin_checkout().await.unwrap();
    let settlement = h.orchestrator.approve(&order_id).await.unwrap();

    assert_eq!(settlement.total, Money::from_cents(2448));
    assert_eq!(settlement.units, 3);
    assert!(settlement.capture.is_completed());
    assert!(settlement.cart_persisted);

    let status = h.orchestrator.status().await;
    assert_eq!(status.state, CheckoutState::Settled);
    assert_eq!(status.order_id, Some(order_id));
    assert!(h.reopen_cart().await.is_empty());
}

#[tokio::test]
async fn test_double_submit_creates_one_order() {
    let h = TestHarness::new().await;
    h.provider.hold_create_orders();

    let first = {
        let orchestrator = h.orchestrator.clone();
        tokio::spawn(async move { orchestrator.begin_checkout().await })
    };
    h.provider.wait_for_create_calls(1).await;

    let second = h.orchestrator.begin_checkout().await;
    assert!(matches!(
        second,
        Err(CheckoutError::AlreadyInFlight {
            state: CheckoutState::CreatingOrder
        })
    ));

    h.provider.release_create_orders();
    assert!(first.await.unwrap().is_ok());

    assert_eq!(h.provider.create_calls(), 1);
    assert_eq!(h.provider.order_count().await, 1);
    assert_eq!(
        h.orchestrator.status().await.state,
        CheckoutState::AwaitingApproval
    );
}

#[tokio::test]
async fn test_capture_failure_leaves_cart_untouched() {
    let h = TestHarness::new().await;
    let before = h.entry_ids().await;
    h.provider.set_fail_on_capture(true);

    let order_id = h.orchestrator.begin_checkout().await.unwrap();
    let result = h.orchestrator.approve(&order_id).await;

    assert!(matches!(result, Err(CheckoutError::Provider(_))));
    assert_eq!(h.entry_ids().await, before);
    assert_eq!(h.reopen_cart().await.entry_ids(), before);

    let status = h.orchestrator.status().await;
    assert_eq!(status.state, CheckoutState::Failed);
    assert!(status.failure.unwrap().contains("payment declined"));
}

#[tokio::test]
async fn test_fresh_attempt_after_failure() {
    let h = TestHarness::new().await;
    h.provider.set_fail_on_capture(true);
    let first = h.orchestrator.begin_checkout().await.unwrap();
    assert!(h.orchestrator.approve(&first).await.is_err());
    let failed_attempt = h.orchestrator.status().await.attempt_id;

    h.provider.set_fail_on_capture(false);
    let second = h.orchestrator.begin_checkout().await.unwrap();
    assert_ne!(first, second);
    assert_ne!(h.orchestrator.status().await.attempt_id, failed_attempt);

    h.orchestrator.approve(&second).await.unwrap();
    assert!(h.orchestrator.cart().lock().await.is_empty());
}

#[tokio::test]
async fn test_cancel_keeps_cart_and_skips_capture() {
    let h = TestHarness::new().await;
    let before = h.entry_ids().await;

    let order_id = h.orchestrator.begin_checkout().await.unwrap();
    h.orchestrator.cancel().await.unwrap();

    assert_eq!(h.orchestrator.status().await.state, CheckoutState::Idle);
    assert_eq!(h.provider.capture_calls(), 0);
    assert_eq!(h.entry_ids().await, before);

    let result = h.orchestrator.approve(&order_id).await;
    assert!(matches!(result, Err(CheckoutError::InvalidState { .. })));
}

#[tokio::test]
async fn test_late_response_after_abort_is_ignored() {
    let h = TestHarness::new().await;
    h.provider.hold_create_orders();

    let pending = {
        let orchestrator = h.orchestrator.clone();
        tokio::spawn(async move { orchestrator.begin_checkout().await })
    };
    h.provider.wait_for_create_calls(1).await;

    h.orchestrator.abort("buyer closed the window").await.unwrap();
    h.provider.release_create_orders();

    let result = pending.await.unwrap();
    assert!(matches!(result, Err(CheckoutError::Stale { .. })));

    let status = h.orchestrator.status().await;
    assert_eq!(status.state, CheckoutState::Failed);
    assert_eq!(status.order_id, None);
    assert_eq!(status.failure.as_deref(), Some("buyer closed the window"));
}

#[tokio::test]
async fn test_capture_after_abort_leaves_cart_untouched() {
    let h = TestHarness::new().await;
    let before = h.entry_ids().await;
    let order_id = h.orchestrator.begin_checkout().await.unwrap();
    h.provider.hold_captures();

    let pending = {
        let orchestrator = h.orchestrator.clone();
        let order_id = order_id.clone();
        tokio::spawn(async move { orchestrator.approve(&order_id).await })
    };
    h.provider.wait_for_capture_calls(1).await;
    assert_eq!(h.orchestrator.status().await.state, CheckoutState::Capturing);

    h.orchestrator.abort("payment window crashed").await.unwrap();
    h.provider.release_captures();

    let result = pending.await.unwrap();
    assert!(matches!(result, Err(CheckoutError::Stale { .. })));

    assert_eq!(h.entry_ids().await, before);
    assert_eq!(h.reopen_cart().await.entry_ids(), before);

    let status = h.orchestrator.status().await;
    assert_eq!(status.state, CheckoutState::Failed);
    assert_eq!(status.failure.as_deref(), Some("payment window crashed"));
    assert_eq!(status.settlement, None);
}

#[tokio::test]
async fn test_clear_failure_after_capture_is_reported() {
    let h = TestHarness::new().await;
    let order_id = h.orchestrator.begin_checkout().await.unwrap();
    h.storage.set_fail_on_save(true);

    let settlement = h.orchestrator.approve(&order_id).await.unwrap();

    assert!(!settlement.cart_persisted);
    assert!(h.orchestrator.cart().lock().await.is_empty());
    assert_eq!(h.orchestrator.status().await.state, CheckoutState::Settled);

    h.storage.set_fail_on_save(false);
    assert_eq!(h.reopen_cart().await.get_item_count(), 3);
}

#[tokio::test]
async fn test_empty_cart_makes_no_remote_call() {
    let h = TestHarness::new().await;
    h.orchestrator.cart().lock().await.clear_cart().await;

    let result = h.orchestrator.begin_checkout().await;

    assert!(matches!(result, Err(CheckoutError::Validation(m)) if m == "Missing items or total"));
    assert_eq!(h.provider.create_calls(), 0);
    assert_eq!(h.orchestrator.status().await.state, CheckoutState::Idle);
}

#[tokio::test]
async fn test_provider_order_total_matches_cart() {
    let h = TestHarness::new().await;
    let order_id = h.orchestrator.begin_checkout().await.unwrap();

    let details = h.provider.get_order(&order_id).await.unwrap();
    assert_eq!(details.total, Some(Money::from_cents(2448)));
    assert_eq!(details.status, "CREATED");
}
