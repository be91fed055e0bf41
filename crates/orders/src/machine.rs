//! Order state machine and store.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use common::{OrderId, Version};

use crate::error::{OrderError, Result};
use crate::order::Order;
use crate::status::{OrderStatus, PaymentStatus};

/// A requested status transition, carrying the caller's view of the
/// current version.
#[derive(Debug, Clone, Copy)]
pub struct TransitionRequest {
    /// New order status, or `None` to leave it unchanged.
    pub order_status: Option<OrderStatus>,

    /// New payment status, or `None` to leave it unchanged.
    pub payment_status: Option<PaymentStatus>,

    /// The version the caller read; a mismatch rejects the update as stale.
    pub expected_version: Version,
}

#[derive(Debug, Default)]
struct StoreState {
    orders: HashMap<OrderId, Order>,
    order_numbers: HashSet<String>,
}

/// Owns order status fields and accepts only valid transitions.
///
/// Transitions for a single order are totally ordered by the version
/// check; transitions for different orders are independent.
#[derive(Debug, Clone, Default)]
pub struct OrderStateMachine {
    state: Arc<RwLock<StoreState>>,
}

impl OrderStateMachine {
    /// Creates an empty state machine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a freshly created order.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn insert(&self, order: Order) -> Result<Order> {
        if order.items.is_empty() {
            return Err(OrderError::NoItems);
        }

        let mut state = self.state.write().unwrap();
        if !state.order_numbers.insert(order.order_number.clone()) {
            return Err(OrderError::DuplicateOrderNumber {
                order_number: order.order_number,
            });
        }
        state.orders.insert(order.id, order.clone());
        Ok(order)
    }

    /// Loads an order by ID.
    pub async fn get(&self, order_id: OrderId) -> Result<Order> {
        self.state
            .read()
            .unwrap()
            .orders
            .get(&order_id)
            .cloned()
            .ok_or(OrderError::OrderNotFound { order_id })
    }

    /// Applies a status transition under optimistic concurrency.
    ///
    /// Re-applying the statuses already in effect is a no-op that returns
    /// the stored order without bumping the version, making remote status
    /// updates idempotent. Every applied transition is logged with the
    /// version it moved from and to.
    #[tracing::instrument(skip(self))]
    pub async fn transition(&self, order_id: OrderId, request: TransitionRequest) -> Result<Order> {
        let mut state = self.state.write().unwrap();
        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or(OrderError::OrderNotFound { order_id })?;

        let target_status = request.order_status.unwrap_or(order.status);
        let target_payment = request.payment_status.unwrap_or(order.payment_status);

        // Already in effect: a re-delivered update acknowledges without
        // mutating anything.
        if target_status == order.status && target_payment == order.payment_status {
            return Ok(order.clone());
        }

        if request.expected_version != order.version {
            return Err(OrderError::StaleUpdate {
                expected: request.expected_version,
                actual: order.version,
            });
        }

        if target_status != order.status && !order.status.can_transition_to(target_status) {
            return Err(OrderError::InvalidStatusTransition {
                from: order.status,
                to: target_status,
            });
        }

        if target_payment != order.payment_status
            && !order.payment_status.can_transition_to(target_payment)
        {
            return Err(OrderError::InvalidPaymentStatusTransition {
                from: order.payment_status,
                to: target_payment,
            });
        }

        // Joint constraint: a captured payment and a cancelled order can
        // only coexist once the payment has been refunded.
        if target_status == OrderStatus::Cancelled && target_payment == PaymentStatus::Completed {
            return Err(OrderError::StatusConflict {
                status: target_status,
                payment_status: target_payment,
            });
        }

        let from_version = order.version;
        order.status = target_status;
        order.payment_status = target_payment;
        order.version = order.version.next();
        order.updated_at = Utc::now();

        metrics::counter!("order_transitions_total").increment(1);
        tracing::info!(
            %order_id,
            status = %order.status,
            payment_status = %order.payment_status,
            from_version = %from_version,
            to_version = %order.version,
            "order transition applied"
        );

        Ok(order.clone())
    }
}
