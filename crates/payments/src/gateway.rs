//! External payment processor trait and in-memory implementation.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::Money;

use crate::error::{PaymentError, Result};

/// Result of creating a gateway order.
#[derive(Debug, Clone)]
pub struct GatewayOrder {
    /// Gateway-side order identifier.
    pub gateway_order_id: String,

    /// Transaction id for the initiation round-trip.
    pub gateway_transaction_id: String,
}

/// Result of a gateway refund.
#[derive(Debug, Clone)]
pub struct GatewayRefund {
    /// Transaction id for the refund round-trip.
    pub gateway_transaction_id: String,
}

/// Trait for the external payment processor.
///
/// The processor itself is an opaque capability; the adapter only needs
/// order creation and refund execution, correlated by payment reference.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates an order on the gateway for the given amount.
    async fn create_order(
        &self,
        payment_reference: &str,
        amount: Money,
        currency: &str,
    ) -> Result<GatewayOrder>;

    /// Executes a refund against a captured payment.
    async fn refund(&self, payment_reference: &str, amount: Money) -> Result<GatewayRefund>;
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    next_id: u32,
    fail_on_create: bool,
    fail_on_refund: bool,
    refund_delay: Option<Duration>,
    created_orders: u32,
    refunds: u32,
}

/// In-memory payment gateway for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new in-memory gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to fail order creation.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create = fail;
    }

    /// Configures the gateway to fail refunds.
    pub fn set_fail_on_refund(&self, fail: bool) {
        self.state.write().unwrap().fail_on_refund = fail;
    }

    /// Makes refund round-trips take the given time, for interleaving
    /// tests.
    pub fn set_refund_delay(&self, delay: Duration) {
        self.state.write().unwrap().refund_delay = Some(delay);
    }

    /// Returns the number of gateway orders created.
    pub fn created_order_count(&self) -> u32 {
        self.state.read().unwrap().created_orders
    }

    /// Returns the number of refunds executed.
    pub fn refund_count(&self) -> u32 {
        self.state.read().unwrap().refunds
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn create_order(
        &self,
        _payment_reference: &str,
        _amount: Money,
        _currency: &str,
    ) -> Result<GatewayOrder> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_create {
            return Err(PaymentError::Gateway {
                message: "gateway rejected order creation".to_string(),
            });
        }
        state.next_id += 1;
        state.created_orders += 1;
        Ok(GatewayOrder {
            gateway_order_id: format!("GW-ORD-{:04}", state.next_id),
            gateway_transaction_id: format!("GW-TXN-{:04}", state.next_id),
        })
    }

    async fn refund(&self, _payment_reference: &str, _amount: Money) -> Result<GatewayRefund> {
        let delay = self.state.read().unwrap().refund_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.write().unwrap();
        if state.fail_on_refund {
            return Err(PaymentError::Gateway {
                message: "gateway rejected refund".to_string(),
            });
        }
        state.next_id += 1;
        state.refunds += 1;
        Ok(GatewayRefund {
            gateway_transaction_id: format!("GW-TXN-R-{:04}", state.next_id),
        })
    }
}
