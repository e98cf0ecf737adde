//! Payment provider trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::{Money, OrderId};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, watch};

use crate::error::{CheckoutError, Result};
use crate::order::OrderRequest;

pub const STATUS_CREATED: &str = "CREATED";
pub const STATUS_COMPLETED: &str = "COMPLETED";

/// Order accepted by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedOrder {
    pub id: OrderId,
    pub status: String,
}

/// Outcome of capturing an approved order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureResult {
    pub order_id: OrderId,
    pub status: String,
    pub capture_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer_email: Option<String>,
}

impl CaptureResult {
    /// Returns true if the provider reports the funds as captured.
    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }
}

/// Provider view of an existing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub id: OrderId,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Money>,
}

/// Trait for remote payment operations.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Creates an order awaiting buyer approval.
    async fn create_order(&self, request: &OrderRequest) -> Result<CreatedOrder>;

    /// Captures an approved order.
    async fn capture_order(&self, order_id: &OrderId) -> Result<CaptureResult>;

    /// Looks up an order.
    async fn get_order(&self, order_id: &OrderId) -> Result<OrderDetails>;
}

#[derive(Debug, Default)]
struct InMemoryProviderState {
    orders: HashMap<OrderId, (Money, String)>,
    next_id: u32,
    capture_status: Option<String>,
}

/// In-memory payment provider for testing.
///
/// Order creation and capture can be held open with [`hold_create_orders`]
/// and [`hold_captures`] so tests can race a second checkout, or abort,
/// against an outstanding call.
///
/// [`hold_create_orders`]: InMemoryPaymentProvider::hold_create_orders
/// [`hold_captures`]: InMemoryPaymentProvider::hold_captures
#[derive(Debug, Clone)]
pub struct InMemoryPaymentProvider {
    state: Arc<Mutex<InMemoryProviderState>>,
    fail_on_create: Arc<AtomicBool>,
    fail_on_capture: Arc<AtomicBool>,
    create_calls: Arc<watch::Sender<usize>>,
    capture_calls: Arc<watch::Sender<usize>>,
    hold_create: Arc<watch::Sender<bool>>,
    hold_capture: Arc<watch::Sender<bool>>,
}

impl Default for InMemoryPaymentProvider {
    fn default() -> Self {
        Self {
            state: Arc::default(),
            fail_on_create: Arc::default(),
            fail_on_capture: Arc::default(),
            create_calls: Arc::new(watch::Sender::new(0)),
            capture_calls: Arc::new(watch::Sender::new(0)),
            hold_create: Arc::new(watch::Sender::new(false)),
            hold_capture: Arc::new(watch::Sender::new(false)),
        }
    }
}

impl InMemoryPaymentProvider {
    /// Creates a new in-memory payment provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the provider to fail every order creation.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.fail_on_create.store(fail, Ordering::SeqCst);
    }

    /// Configures the provider to fail every capture.
    pub fn set_fail_on_capture(&self, fail: bool) {
        self.fail_on_capture.store(fail, Ordering::SeqCst);
    }

    /// Overrides the status reported by captures.
    pub async fn set_capture_status(&self, status: impl Into<String>) {
        self.state.lock().await.capture_status = Some(status.into());
    }

    /// Makes `create_order` wait until [`release_create_orders`] is called.
    ///
    /// [`release_create_orders`]: InMemoryPaymentProvider::release_create_orders
    pub fn hold_create_orders(&self) {
        self.hold_create.send_replace(true);
    }

    pub fn release_create_orders(&self) {
        self.hold_create.send_replace(false);
    }

    /// Number of `create_order` calls received, including failed ones.
    pub fn create_calls(&self) -> usize {
        *self.create_calls.borrow()
    }

    /// Waits until at least `n` `create_order` calls have been received.
    pub async fn wait_for_create_calls(&self, n: usize) {
        let mut rx = self.create_calls.subscribe();
        let _ = rx.wait_for(|count| *count >= n).await;
    }

    /// Makes `capture_order` wait until [`release_captures`] is called.
    ///
    /// [`release_captures`]: InMemoryPaymentProvider::release_captures
    pub fn hold_captures(&self) {
        self.hold_capture.send_replace(true);
    }

    pub fn release_captures(&self) {
        self.hold_capture.send_replace(false);
    }

    pub fn capture_calls(&self) -> usize {
        *self.capture_calls.borrow()
    }

    /// Waits until at least `n` `capture_order` calls have been received.
    pub async fn wait_for_capture_calls(&self, n: usize) {
        let mut rx = self.capture_calls.subscribe();
        let _ = rx.wait_for(|count| *count >= n).await;
    }

    /// Returns the number of orders created.
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }
}

#[async_trait]
impl PaymentProvider for InMemoryPaymentProvider {
    async fn create_order(&self, request: &OrderRequest) -> Result<CreatedOrder> {
        self.create_calls.send_modify(|count| *count += 1);

        let mut held = self.hold_create.subscribe();
        let _ = held.wait_for(|hold| !*hold).await;

        if self.fail_on_create.load(Ordering::SeqCst) {
            return Err(CheckoutError::provider(
                "Failed to create order: provider unavailable",
            ));
        }

        let total = request.validate()?;
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let id = OrderId::new(format!("ORDER-{:04}", state.next_id));
        state
            .orders
            .insert(id.clone(), (total, STATUS_CREATED.to_string()));

        Ok(CreatedOrder {
            id,
            status: STATUS_CREATED.to_string(),
        })
    }

    async fn capture_order(&self, order_id: &OrderId) -> Result<CaptureResult> {
        self.capture_calls.send_modify(|count| *count += 1);

        let mut held = self.hold_capture.subscribe();
        let _ = held.wait_for(|hold| !*hold).await;

        if self.fail_on_capture.load(Ordering::SeqCst) {
            return Err(CheckoutError::provider(
                "Failed to capture order: payment declined",
            ));
        }

        let mut state = self.state.lock().await;
        let status = state
            .capture_status
            .clone()
            .unwrap_or_else(|| STATUS_COMPLETED.to_string());
        let next = state.next_id;
        let order = state
            .orders
            .get_mut(order_id)
            .ok_or_else(|| CheckoutError::provider(format!("Order not found: {order_id}")))?;
        order.1 = status.clone();

        Ok(CaptureResult {
            order_id: order_id.clone(),
            status,
            capture_ids: vec![format!("CAPTURE-{next:04}")],
            payer_email: Some("buyer@example.com".to_string()),
        })
    }

    async fn get_order(&self, order_id: &OrderId) -> Result<OrderDetails> {
        let state = self.state.lock().await;
        let (total, status) = state
            .orders
            .get(order_id)
            .ok_or_else(|| CheckoutError::provider(format!("Order not found: {order_id}")))?;

        Ok(OrderDetails {
            id: order_id.clone(),
            status: status.clone(),
            total: Some(*total),
        })
    }
}

#[cfg(test)]
mod tests {
    use cart::CartEntry;
    use common::Product;

    use super::*;
    use crate::order::OrderContext;

    fn request() -> OrderRequest {
        let entry = CartEntry::from_product(&Product::new("p1", "Sticker", Money::from_cents(999)));
        OrderRequest::from_entries(&[entry], &OrderContext::default())
    }

    #[tokio::test]
    async fn test_create_and_capture() {
        let provider = InMemoryPaymentProvider::new();

        let created = provider.create_order(&request()).await.unwrap();
        assert_eq!(created.id.as_str(), "ORDER-0001");
        assert_eq!(created.status, STATUS_CREATED);

        let capture = provider.capture_order(&created.id).await.unwrap();
        assert!(capture.is_completed());
        assert_eq!(capture.order_id, created.id);

        let details = provider.get_order(&created.id).await.unwrap();
        assert_eq!(details.status, STATUS_COMPLETED);
        assert_eq!(details.total, Some(Money::from_cents(999)));
    }

    #[tokio::test]
    async fn test_fail_on_create_counts_call() {
        let provider = InMemoryPaymentProvider::new();
        provider.set_fail_on_create(true);

        assert!(provider.create_order(&request()).await.is_err());
        assert_eq!(provider.create_calls(), 1);
        assert_eq!(provider.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_capture_unknown_order() {
        let provider = InMemoryPaymentProvider::new();
        let result = provider.capture_order(&OrderId::new("nope")).await;
        assert!(matches!(result, Err(CheckoutError::Provider(_))));
    }

    #[tokio::test]
    async fn test_hold_blocks_until_released() {
        let provider = InMemoryPaymentProvider::new();
        provider.hold_create_orders();

        let task = {
            let provider = provider.clone();
            tokio::spawn(async move { provider.create_order(&request()).await })
        };
        provider.wait_for_create_calls(1).await;
        assert!(!task.is_finished());

        provider.release_create_orders();
        let created = task.await.unwrap().unwrap();
        assert_eq!(created.id.as_str(), "ORDER-0001");
    }

    #[tokio::test]
    async fn test_sequential_order_ids() {
        let provider = InMemoryPaymentProvider::new();
        let a = provider.create_order(&request()).await.unwrap();
        let b = provider.create_order(&request()).await.unwrap();
        assert_eq!(a.id.as_str(), "ORDER-0001");
        assert_eq!(b.id.as_str(), "ORDER-0002");
    }
}
