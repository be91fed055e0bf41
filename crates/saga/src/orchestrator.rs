//! Saga orchestrator for placing, settling and cancelling orders.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use common::{OrderId, ReservationId};
use inventory::InventoryLedger;
use orders::{Order, OrderError, OrderStateMachine, OrderStatus, PaymentStatus, TransitionRequest};
use payments::{
    CallbackOutcome, GatewayCallback, PaymentAdapter, PaymentGateway, PaymentHandle, PaymentState,
};

use crate::clients::validation::ValidationGateway;
use crate::error::{Result, SagaError};
use crate::instance::SagaInstance;
use crate::order_flow;
use crate::request::PlaceOrderRequest;

/// A successfully placed order, now awaiting its gateway callback.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    /// The stored order, in `Created`.
    pub order: Order,

    /// Handle to the initiated payment.
    pub payment: PaymentHandle,

    /// Snapshot of the saga bookkeeping.
    pub saga: SagaInstance,
}

/// Result of reconciling one gateway callback.
#[derive(Debug, Clone)]
pub enum ReconcileOutcome {
    /// The callback was applied and the order settled accordingly.
    Applied {
        order: Order,
        outcome: CallbackOutcome,
    },

    /// The callback was a replay; nothing changed.
    Duplicate { order_id: OrderId },
}

/// Drives the order placement saga across validation, inventory, orders
/// and payments.
///
/// Forward steps: validate parties → reserve stock → create order →
/// initiate payment. Settlement happens later, when the gateway callback
/// arrives. Any forward failure compensates by releasing every hold taken
/// so far; a failure before the first side effect leaves all state
/// untouched.
pub struct Orchestrator<V, L, G>
where
    V: ValidationGateway,
    L: InventoryLedger,
    G: PaymentGateway,
{
    validation: V,
    ledger: L,
    orders: OrderStateMachine,
    payments: PaymentAdapter<G>,
    sagas: Arc<Mutex<HashMap<OrderId, SagaInstance>>>,
}

impl<V, L, G> Orchestrator<V, L, G>
where
    V: ValidationGateway,
    L: InventoryLedger,
    G: PaymentGateway,
{
    /// Creates a new orchestrator over the given services.
    pub fn new(validation: V, ledger: L, orders: OrderStateMachine, payments: PaymentAdapter<G>) -> Self {
        Self {
            validation,
            ledger,
            orders,
            payments,
            sagas: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The order store, for read paths and direct status updates.
    pub fn orders(&self) -> &OrderStateMachine {
        &self.orders
    }

    /// The payment adapter, for read paths and refunds.
    pub fn payments(&self) -> &PaymentAdapter<G> {
        &self.payments
    }

    /// The inventory ledger, for availability reads and the expiry sweep.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Returns the saga tracked for an order, if any.
    pub fn saga(&self, order_id: OrderId) -> Option<SagaInstance> {
        self.sagas.lock().unwrap().get(&order_id).cloned()
    }

    /// Places an order end to end, leaving it awaiting the gateway
    /// callback.
    #[tracing::instrument(skip(self, request), fields(saga_type = order_flow::SAGA_TYPE))]
    pub async fn place_order(&self, request: PlaceOrderRequest) -> Result<PlacedOrder> {
        metrics::counter!("saga_executions_total").increment(1);
        let saga_start = std::time::Instant::now();

        request
            .validate()
            .map_err(|errors| SagaError::InvalidRequest { errors })?;

        // Step 1: validate the parties, in parallel. No side effects yet,
        // so any failure here leaves every store untouched.
        tracing::info!(step = order_flow::STEP_VALIDATE_PARTIES, "saga step started");
        let (customer, business) = tokio::join!(
            self.validation.validate_customer(request.customer_id),
            self.validation.validate_business(request.business_id),
        );
        let customer = customer?;
        let business = business?;

        if !customer.exists {
            return Err(SagaError::CustomerRejected {
                customer_id: request.customer_id,
                reason: "does not exist",
            });
        }
        if !customer.active {
            return Err(SagaError::CustomerRejected {
                customer_id: request.customer_id,
                reason: "not active",
            });
        }
        // A reported non-customer role cannot place orders; an absent role
        // is accepted as-is.
        if customer.role.as_deref().is_some_and(|role| role != "customer") {
            return Err(SagaError::CustomerRejected {
                customer_id: request.customer_id,
                reason: "wrong role",
            });
        }
        if !business.exists {
            return Err(SagaError::BusinessRejected {
                business_id: request.business_id,
                reason: "does not exist",
            });
        }
        if !business.active {
            return Err(SagaError::BusinessRejected {
                business_id: request.business_id,
                reason: "not active",
            });
        }
        if !business.verified {
            return Err(SagaError::BusinessRejected {
                business_id: request.business_id,
                reason: "not verified",
            });
        }

        let order = Order::new(request.customer_id, request.business_id, request.order_items());
        let mut saga = SagaInstance::new(order.id);
        saga.step_completed(order_flow::STEP_VALIDATE_PARTIES);

        // Step 2: reserve stock line by line. The first line that cannot
        // be covered rolls back every hold already taken.
        tracing::info!(step = order_flow::STEP_RESERVE_INVENTORY, "saga step started");
        for item in &order.items {
            match self
                .ledger
                .reserve(&item.product_id, item.quantity, order.id)
                .await
            {
                Ok(reservation_id) => saga.reservation_ids.push(reservation_id),
                Err(err) => {
                    self.release_all(&saga.reservation_ids).await;
                    self.finish_failed(saga, err.to_string(), saga_start);
                    return Err(err.into());
                }
            }
        }
        saga.step_completed(order_flow::STEP_RESERVE_INVENTORY);

        // Step 3: create the order record.
        tracing::info!(step = order_flow::STEP_CREATE_ORDER, "saga step started");
        let order = match self.orders.insert(order).await {
            Ok(order) => order,
            Err(err) => {
                self.release_all(&saga.reservation_ids).await;
                self.finish_failed(saga, err.to_string(), saga_start);
                return Err(err.into());
            }
        };
        saga.step_completed(order_flow::STEP_CREATE_ORDER);

        // Step 4: initiate payment with the gateway.
        tracing::info!(step = order_flow::STEP_INITIATE_PAYMENT, "saga step started");
        match self
            .payments
            .initiate(
                order.id,
                order.customer_id,
                order.business_id,
                order.total_amount,
                &request.currency,
                request.method,
            )
            .await
        {
            Ok(handle) => {
                saga.payment_id = Some(handle.payment_id);
                saga.step_completed(order_flow::STEP_INITIATE_PAYMENT);
                saga.await_payment();
                self.store_saga(saga.clone());

                metrics::histogram!("saga_duration_seconds")
                    .record(saga_start.elapsed().as_secs_f64());
                tracing::info!(
                    order_id = %order.id,
                    payment_id = %handle.payment_id,
                    "order placed, awaiting gateway callback"
                );
                Ok(PlacedOrder {
                    order,
                    payment: handle,
                    saga,
                })
            }
            Err(err) => {
                self.release_all(&saga.reservation_ids).await;
                if let Err(transition_err) = self
                    .orders
                    .transition(
                        order.id,
                        TransitionRequest {
                            order_status: Some(OrderStatus::Failed),
                            payment_status: Some(PaymentStatus::Failed),
                            expected_version: order.version,
                        },
                    )
                    .await
                {
                    tracing::error!(order_id = %order.id, error = %transition_err, "failed to mark order failed");
                }
                self.finish_failed(saga, err.to_string(), saga_start);
                Err(err.into())
            }
        }
    }

    /// Applies a gateway confirmation callback, settling the order.
    ///
    /// Duplicate callbacks are acknowledged without touching any state.
    #[tracing::instrument(skip(self, callback), fields(reference = %callback.payment_reference))]
    pub async fn reconcile(&self, callback: GatewayCallback) -> Result<ReconcileOutcome> {
        let confirm = self.payments.confirm(callback).await?;
        if !confirm.newly_applied {
            return Ok(ReconcileOutcome::Duplicate {
                order_id: confirm.order_id,
            });
        }

        let order_id = confirm.order_id;
        // The callback is already applied to the payment at this point;
        // a redelivery would be answered as a duplicate. A missing saga
        // record must therefore not strand the order: settle it with an
        // empty reservation list.
        let reservation_ids = match self.saga(order_id) {
            Some(saga) => saga.reservation_ids,
            None => {
                tracing::warn!(%order_id, "no saga record for confirmed payment");
                Vec::new()
            }
        };
        let order = self.orders.get(order_id).await?;

        tracing::info!(step = order_flow::STEP_SETTLE, %order_id, "saga step started");
        let updated = match confirm.outcome {
            CallbackOutcome::Completed => {
                for reservation_id in &reservation_ids {
                    // Commit beats expiry for live holds; a hold the sweep
                    // already released is logged and skipped, never blocks
                    // the settlement.
                    if let Err(err) = self.ledger.commit(*reservation_id).await {
                        tracing::warn!(
                            %order_id,
                            %reservation_id,
                            error = %err,
                            "reservation could not be committed"
                        );
                    }
                }
                let updated = self
                    .orders
                    .transition(
                        order_id,
                        TransitionRequest {
                            order_status: Some(OrderStatus::Confirmed),
                            payment_status: Some(PaymentStatus::Completed),
                            expected_version: order.version,
                        },
                    )
                    .await?;
                self.with_saga(order_id, |saga| {
                    saga.step_completed(order_flow::STEP_SETTLE);
                    saga.completed();
                });
                metrics::counter!("saga_completed").increment(1);
                updated
            }
            CallbackOutcome::Failed => {
                self.release_all(&reservation_ids).await;
                let updated = self
                    .orders
                    .transition(
                        order_id,
                        TransitionRequest {
                            order_status: Some(OrderStatus::Failed),
                            payment_status: Some(PaymentStatus::Failed),
                            expected_version: order.version,
                        },
                    )
                    .await?;
                self.with_saga(order_id, |saga| {
                    saga.compensating("payment failed");
                    saga.failed();
                });
                metrics::counter!("saga_failed").increment(1);
                updated
            }
        };

        tracing::info!(%order_id, status = %updated.status, "gateway callback reconciled");
        Ok(ReconcileOutcome::Applied {
            order: updated,
            outcome: confirm.outcome,
        })
    }

    /// Cancels an order, undoing whatever the saga has done so far:
    /// refunds a captured payment, voids a pending one, releases stock.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: OrderId, reason: &str) -> Result<Order> {
        let order = self.orders.get(order_id).await?;
        if !order.status.can_transition_to(OrderStatus::Cancelled) {
            return Err(OrderError::InvalidStatusTransition {
                from: order.status,
                to: OrderStatus::Cancelled,
            }
            .into());
        }

        // Settle the payment side first so the joint status constraint
        // admits the cancellation.
        let mut target_payment = None;
        if let Some(payment) = self.payments.payments_for_order(order_id).pop() {
            match payment.state {
                PaymentState::Pending => {
                    self.payments.void(payment.id, reason)?;
                    target_payment = Some(PaymentStatus::Failed);
                }
                PaymentState::Completed => {
                    self.payments.refund(payment.id, None, reason).await?;
                    target_payment = Some(PaymentStatus::Refunded);
                }
                PaymentState::Failed | PaymentState::Refunded => {}
            }
        }

        let reservation_ids = self
            .saga(order_id)
            .map(|saga| saga.reservation_ids)
            .unwrap_or_default();
        self.release_all(&reservation_ids).await;

        let updated = self
            .orders
            .transition(
                order_id,
                TransitionRequest {
                    order_status: Some(OrderStatus::Cancelled),
                    payment_status: target_payment,
                    expected_version: order.version,
                },
            )
            .await?;

        self.with_saga(order_id, |saga| {
            if !saga.state.is_terminal() {
                saga.compensating(reason);
                saga.failed();
            }
        });

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(%order_id, reason, "order cancelled");
        Ok(updated)
    }

    /// Releases every listed hold, logging failures instead of aborting.
    async fn release_all(&self, reservation_ids: &[ReservationId]) {
        for reservation_id in reservation_ids {
            if let Err(err) = self.ledger.release(*reservation_id).await {
                tracing::warn!(%reservation_id, error = %err, "failed to release reservation");
            }
        }
    }

    fn store_saga(&self, saga: SagaInstance) {
        self.sagas.lock().unwrap().insert(saga.order_id, saga);
    }

    fn with_saga(&self, order_id: OrderId, update: impl FnOnce(&mut SagaInstance)) {
        if let Some(saga) = self.sagas.lock().unwrap().get_mut(&order_id) {
            update(saga);
        }
    }

    fn finish_failed(&self, mut saga: SagaInstance, reason: String, started: std::time::Instant) {
        saga.compensating(reason.clone());
        saga.failed();
        tracing::warn!(order_id = %saga.order_id, reason, "saga failed");
        self.store_saga(saga);
        metrics::counter!("saga_failed").increment(1);
        metrics::histogram!("saga_duration_seconds").record(started.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::validation::InMemoryValidationGateway;
    use crate::request::PlaceOrderItem;
    use crate::state::SagaState;
    use common::{BusinessId, CustomerId, ProductId};
    use inventory::{InMemoryInventoryLedger, InventoryError};
    use payments::{InMemoryPaymentGateway, PaymentError, PaymentMethod};

    type TestOrchestrator =
        Orchestrator<InMemoryValidationGateway, InMemoryInventoryLedger, InMemoryPaymentGateway>;

    struct Fixture {
        orchestrator: TestOrchestrator,
        validation: InMemoryValidationGateway,
        ledger: InMemoryInventoryLedger,
        gateway: InMemoryPaymentGateway,
        customer_id: CustomerId,
        business_id: BusinessId,
    }

    async fn setup() -> Fixture {
        let validation = InMemoryValidationGateway::new();
        let ledger = InMemoryInventoryLedger::new();
        let gateway = InMemoryPaymentGateway::new();

        let customer_id = CustomerId::new();
        let business_id = BusinessId::new();
        validation.register_customer(customer_id, true);
        validation.register_business(business_id, true);

        ledger
            .register_product(ProductId::new("SKU-A"), 10)
            .await
            .unwrap();
        ledger
            .register_product(ProductId::new("SKU-B"), 1)
            .await
            .unwrap();

        let orchestrator = Orchestrator::new(
            validation.clone(),
            ledger.clone(),
            OrderStateMachine::new(),
            PaymentAdapter::new(gateway.clone()),
        );

        Fixture {
            orchestrator,
            validation,
            ledger,
            gateway,
            customer_id,
            business_id,
        }
    }

    fn request(fixture: &Fixture, items: Vec<(&str, u32)>) -> PlaceOrderRequest {
        PlaceOrderRequest {
            customer_id: fixture.customer_id,
            business_id: fixture.business_id,
            items: items
                .into_iter()
                .map(|(sku, quantity)| PlaceOrderItem {
                    product_id: ProductId::new(sku),
                    quantity,
                    unit_price_cents: 1000,
                })
                .collect(),
            currency: "USD".to_string(),
            method: PaymentMethod::Card,
        }
    }

    fn completed_callback(placed: &PlacedOrder, txn: &str) -> GatewayCallback {
        GatewayCallback {
            payment_reference: placed.payment.payment_reference.clone(),
            gateway_transaction_id: txn.to_string(),
            gateway_payment_id: Some("gw_pay_1".to_string()),
            outcome: CallbackOutcome::Completed,
            failure_reason: None,
        }
    }

    #[tokio::test]
    async fn test_happy_path_settles_on_callback() {
        let fixture = setup().await;
        let placed = fixture
            .orchestrator
            .place_order(request(&fixture, vec![("SKU-A", 3)]))
            .await
            .unwrap();

        assert_eq!(placed.order.status, OrderStatus::Created);
        assert_eq!(placed.saga.state, SagaState::AwaitingPayment);
        assert_eq!(fixture.ledger.available(&ProductId::new("SKU-A")).await.unwrap(), 7);

        let outcome = fixture
            .orchestrator
            .reconcile(completed_callback(&placed, "txn-1"))
            .await
            .unwrap();

        let order = match outcome {
            ReconcileOutcome::Applied { order, .. } => order,
            other => panic!("unexpected outcome: {other:?}"),
        };
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.payment_status, PaymentStatus::Completed);

        // Stock stays committed, not returned.
        assert_eq!(fixture.ledger.available(&ProductId::new("SKU-A")).await.unwrap(), 7);

        let saga = fixture.orchestrator.saga(order.id).unwrap();
        assert_eq!(saga.state, SagaState::Completed);
        assert_eq!(saga.completed_steps.len(), 5);
    }

    #[tokio::test]
    async fn test_reconcile_without_saga_record_still_settles() {
        let fixture = setup().await;
        // An order whose saga bookkeeping was lost, as after a restart:
        // the order and payment exist but nothing tracks the holds.
        let req = request(&fixture, vec![("SKU-A", 2)]);
        let order = fixture
            .orchestrator
            .orders()
            .insert(Order::new(req.customer_id, req.business_id, req.order_items()))
            .await
            .unwrap();
        let handle = fixture
            .orchestrator
            .payments()
            .initiate(
                order.id,
                order.customer_id,
                order.business_id,
                order.total_amount,
                "USD",
                PaymentMethod::Card,
            )
            .await
            .unwrap();

        let outcome = fixture
            .orchestrator
            .reconcile(GatewayCallback {
                payment_reference: handle.payment_reference.clone(),
                gateway_transaction_id: "txn-orphan".to_string(),
                gateway_payment_id: Some("gw_pay_1".to_string()),
                outcome: CallbackOutcome::Completed,
                failure_reason: None,
            })
            .await
            .unwrap();

        let order = match outcome {
            ReconcileOutcome::Applied { order, .. } => order,
            other => panic!("unexpected outcome: {other:?}"),
        };
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.payment_status, PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn test_invalid_fields_rejected_before_any_side_effect() {
        let fixture = setup().await;
        let result = fixture
            .orchestrator
            .place_order(request(&fixture, vec![("SKU-A", 0)]))
            .await;

        assert!(matches!(result, Err(SagaError::InvalidRequest { .. })));
        assert_eq!(fixture.ledger.available(&ProductId::new("SKU-A")).await.unwrap(), 10);
        assert_eq!(fixture.gateway.created_order_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_customer_rejected() {
        let fixture = setup().await;
        let mut req = request(&fixture, vec![("SKU-A", 1)]);
        req.customer_id = CustomerId::new();

        let result = fixture.orchestrator.place_order(req).await;
        assert!(matches!(result, Err(SagaError::CustomerRejected { .. })));
        assert_eq!(fixture.ledger.available(&ProductId::new("SKU-A")).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_inactive_business_rejected() {
        let fixture = setup().await;
        let business_id = BusinessId::new();
        fixture.validation.register_business(business_id, false);
        let mut req = request(&fixture, vec![("SKU-A", 1)]);
        req.business_id = business_id;

        let result = fixture.orchestrator.place_order(req).await;
        assert!(matches!(result, Err(SagaError::BusinessRejected { .. })));
    }

    #[tokio::test]
    async fn test_wrong_customer_role_rejected() {
        let fixture = setup().await;
        let customer_id = CustomerId::new();
        fixture
            .validation
            .register_customer_with_role(customer_id, true, "admin");
        let mut req = request(&fixture, vec![("SKU-A", 1)]);
        req.customer_id = customer_id;

        let result = fixture.orchestrator.place_order(req).await;
        assert!(matches!(
            result,
            Err(SagaError::CustomerRejected { reason: "wrong role", .. })
        ));
    }

    #[tokio::test]
    async fn test_unverified_business_rejected() {
        let fixture = setup().await;
        let business_id = BusinessId::new();
        fixture
            .validation
            .register_business_with(business_id, true, false, true);
        let mut req = request(&fixture, vec![("SKU-A", 1)]);
        req.business_id = business_id;

        let result = fixture.orchestrator.place_order(req).await;
        assert!(matches!(
            result,
            Err(SagaError::BusinessRejected { reason: "not verified", .. })
        ));
        assert_eq!(fixture.ledger.available(&ProductId::new("SKU-A")).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_validation_outage_leaves_state_untouched() {
        let fixture = setup().await;
        fixture.validation.set_customer_service_down(true);

        let result = fixture
            .orchestrator
            .place_order(request(&fixture, vec![("SKU-A", 1)]))
            .await;

        assert!(matches!(result, Err(SagaError::Validation(_))));
        assert_eq!(fixture.ledger.available(&ProductId::new("SKU-A")).await.unwrap(), 10);
        assert_eq!(fixture.gateway.created_order_count(), 0);
    }

    #[tokio::test]
    async fn test_partial_reservation_is_rolled_back() {
        let fixture = setup().await;

        // SKU-B only has 1 in stock; the second line fails after the
        // first line's hold was taken.
        let result = fixture
            .orchestrator
            .place_order(request(&fixture, vec![("SKU-A", 5), ("SKU-B", 2)]))
            .await;

        assert!(matches!(
            result,
            Err(SagaError::Inventory(InventoryError::InsufficientStock { .. }))
        ));
        assert_eq!(fixture.ledger.available(&ProductId::new("SKU-A")).await.unwrap(), 10);
        assert_eq!(fixture.ledger.available(&ProductId::new("SKU-B")).await.unwrap(), 1);
        assert_eq!(fixture.gateway.created_order_count(), 0);
    }

    #[tokio::test]
    async fn test_gateway_failure_compensates_and_fails_order() {
        let fixture = setup().await;
        fixture.gateway.set_fail_on_create(true);

        let result = fixture
            .orchestrator
            .place_order(request(&fixture, vec![("SKU-A", 4)]))
            .await;

        assert!(matches!(result, Err(SagaError::Payment(PaymentError::Gateway { .. }))));
        assert_eq!(fixture.ledger.available(&ProductId::new("SKU-A")).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_failed_callback_releases_stock_and_fails_order() {
        let fixture = setup().await;
        let placed = fixture
            .orchestrator
            .place_order(request(&fixture, vec![("SKU-A", 4)]))
            .await
            .unwrap();

        let outcome = fixture
            .orchestrator
            .reconcile(GatewayCallback {
                payment_reference: placed.payment.payment_reference.clone(),
                gateway_transaction_id: "txn-1".to_string(),
                gateway_payment_id: None,
                outcome: CallbackOutcome::Failed,
                failure_reason: Some("declined".to_string()),
            })
            .await
            .unwrap();

        let order = match outcome {
            ReconcileOutcome::Applied { order, .. } => order,
            other => panic!("unexpected outcome: {other:?}"),
        };
        assert_eq!(order.status, OrderStatus::Failed);
        assert_eq!(order.payment_status, PaymentStatus::Failed);
        assert_eq!(fixture.ledger.available(&ProductId::new("SKU-A")).await.unwrap(), 10);

        let saga = fixture.orchestrator.saga(order.id).unwrap();
        assert_eq!(saga.state, SagaState::Failed);
    }

    #[tokio::test]
    async fn test_duplicate_callback_is_a_noop() {
        let fixture = setup().await;
        let placed = fixture
            .orchestrator
            .place_order(request(&fixture, vec![("SKU-A", 3)]))
            .await
            .unwrap();

        fixture
            .orchestrator
            .reconcile(completed_callback(&placed, "txn-1"))
            .await
            .unwrap();
        let first = fixture.orchestrator.orders().get(placed.order.id).await.unwrap();

        let replay = fixture
            .orchestrator
            .reconcile(completed_callback(&placed, "txn-1"))
            .await
            .unwrap();
        assert!(matches!(replay, ReconcileOutcome::Duplicate { .. }));

        let second = fixture.orchestrator.orders().get(placed.order.id).await.unwrap();
        assert_eq!(second.version, first.version);
        assert_eq!(fixture.ledger.available(&ProductId::new("SKU-A")).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_cancel_before_callback_voids_payment() {
        let fixture = setup().await;
        let placed = fixture
            .orchestrator
            .place_order(request(&fixture, vec![("SKU-A", 3)]))
            .await
            .unwrap();

        let cancelled = fixture
            .orchestrator
            .cancel_order(placed.order.id, "requested by customer")
            .await
            .unwrap();

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(cancelled.payment_status, PaymentStatus::Failed);
        assert_eq!(fixture.ledger.available(&ProductId::new("SKU-A")).await.unwrap(), 10);

        let payment = fixture
            .orchestrator
            .payments()
            .get(placed.payment.payment_id)
            .unwrap();
        assert_eq!(payment.state, PaymentState::Failed);
    }

    #[tokio::test]
    async fn test_cancel_after_settlement_refunds() {
        let fixture = setup().await;
        let placed = fixture
            .orchestrator
            .place_order(request(&fixture, vec![("SKU-A", 3)]))
            .await
            .unwrap();
        fixture
            .orchestrator
            .reconcile(completed_callback(&placed, "txn-1"))
            .await
            .unwrap();

        let cancelled = fixture
            .orchestrator
            .cancel_order(placed.order.id, "requested by customer")
            .await
            .unwrap();

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(cancelled.payment_status, PaymentStatus::Refunded);
        assert_eq!(fixture.gateway.refund_count(), 1);

        let payment = fixture
            .orchestrator
            .payments()
            .get(placed.payment.payment_id)
            .unwrap();
        assert_eq!(payment.state, PaymentState::Refunded);
    }

    #[tokio::test]
    async fn test_cancel_terminal_order_rejected() {
        let fixture = setup().await;
        let placed = fixture
            .orchestrator
            .place_order(request(&fixture, vec![("SKU-A", 3)]))
            .await
            .unwrap();
        fixture
            .orchestrator
            .cancel_order(placed.order.id, "requested by customer")
            .await
            .unwrap();

        let result = fixture
            .orchestrator
            .cancel_order(placed.order.id, "requested by customer")
            .await;
        assert!(matches!(
            result,
            Err(SagaError::Order(OrderError::InvalidStatusTransition { .. }))
        ));
    }
}
