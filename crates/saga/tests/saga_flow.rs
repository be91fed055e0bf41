//! End-to-end saga properties across all services.

use chrono::{Duration, Utc};
use common::{BusinessId, CustomerId, ProductId};
use inventory::{InMemoryInventoryLedger, InventoryLedger};
use orders::{OrderStateMachine, OrderStatus, PaymentStatus};
use payments::{
    CallbackOutcome, GatewayCallback, InMemoryPaymentGateway, PaymentAdapter, PaymentMethod,
};
use saga::{
    InMemoryValidationGateway, Orchestrator, PlaceOrderItem, PlaceOrderRequest, PlacedOrder,
    ReconcileOutcome, SagaError,
};
use std::sync::Arc;

type TestOrchestrator =
    Orchestrator<InMemoryValidationGateway, InMemoryInventoryLedger, InMemoryPaymentGateway>;

struct World {
    orchestrator: Arc<TestOrchestrator>,
    ledger: InMemoryInventoryLedger,
    customer_id: CustomerId,
    business_id: BusinessId,
}

async fn world_with_ledger(ledger: InMemoryInventoryLedger) -> World {
    let validation = InMemoryValidationGateway::new();
    let customer_id = CustomerId::new();
    let business_id = BusinessId::new();
    validation.register_customer(customer_id, true);
    validation.register_business(business_id, true);

    let orchestrator = Orchestrator::new(
        validation,
        ledger.clone(),
        OrderStateMachine::new(),
        PaymentAdapter::new(InMemoryPaymentGateway::new()),
    );

    World {
        orchestrator: Arc::new(orchestrator),
        ledger,
        customer_id,
        business_id,
    }
}

async fn world() -> World {
    world_with_ledger(InMemoryInventoryLedger::new()).await
}

fn request(world: &World, items: Vec<(&str, u32)>) -> PlaceOrderRequest {
    PlaceOrderRequest {
        customer_id: world.customer_id,
        business_id: world.business_id,
        items: items
            .into_iter()
            .map(|(sku, quantity)| PlaceOrderItem {
                product_id: ProductId::new(sku),
                quantity,
                unit_price_cents: 2500,
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

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_placements_never_oversell() {
    let world = world().await;
    world
        .ledger
        .register_product(ProductId::new("SKU-HOT"), 5)
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..20 {
        let orchestrator = Arc::clone(&world.orchestrator);
        let req = request(&world, vec![("SKU-HOT", 1)]);
        handles.push(tokio::spawn(async move { orchestrator.place_order(req).await }));
    }

    let mut placed = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => placed += 1,
            Err(SagaError::Inventory(_)) => rejected += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(placed, 5);
    assert_eq!(rejected, 15);
    assert_eq!(
        world.ledger.available(&ProductId::new("SKU-HOT")).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn failed_placement_frees_stock_for_the_next_order() {
    let world = world().await;
    world
        .ledger
        .register_product(ProductId::new("SKU-A"), 10)
        .await
        .unwrap();
    world
        .ledger
        .register_product(ProductId::new("SKU-B"), 1)
        .await
        .unwrap();

    // First order holds 5 of A, then dies on B.
    let failed = world
        .orchestrator
        .place_order(request(&world, vec![("SKU-A", 5), ("SKU-B", 2)]))
        .await;
    assert!(failed.is_err());

    // A's hold must be gone, so a full-stock order of A succeeds.
    let placed = world
        .orchestrator
        .place_order(request(&world, vec![("SKU-A", 10)]))
        .await
        .unwrap();
    assert_eq!(placed.order.items[0].quantity, 10);
}

#[tokio::test]
async fn expiry_sweep_returns_abandoned_stock() {
    let ledger = InMemoryInventoryLedger::with_ttl(Duration::zero());
    let world = world_with_ledger(ledger).await;
    world
        .ledger
        .register_product(ProductId::new("SKU-A"), 10)
        .await
        .unwrap();

    let placed = world
        .orchestrator
        .place_order(request(&world, vec![("SKU-A", 4)]))
        .await
        .unwrap();
    assert_eq!(
        world.ledger.available(&ProductId::new("SKU-A")).await.unwrap(),
        6
    );

    // Zero TTL: the order's holds lapsed the moment they were taken.
    let released = world.ledger.release_expired(Utc::now()).await.unwrap();
    assert_eq!(released, 1);
    assert_eq!(
        world.ledger.available(&ProductId::new("SKU-A")).await.unwrap(),
        10
    );

    // The payment still settles; the lost hold is logged, not fatal.
    let outcome = world
        .orchestrator
        .reconcile(completed_callback(&placed, "txn-1"))
        .await
        .unwrap();
    let order = match outcome {
        ReconcileOutcome::Applied { order, .. } => order,
        other => panic!("unexpected outcome: {other:?}"),
    };
    assert_eq!(order.status, OrderStatus::Confirmed);
}

#[tokio::test]
async fn settled_order_is_immune_to_the_sweep() {
    let ledger = InMemoryInventoryLedger::with_ttl(Duration::zero());
    let world = world_with_ledger(ledger).await;
    world
        .ledger
        .register_product(ProductId::new("SKU-A"), 10)
        .await
        .unwrap();

    let placed = world
        .orchestrator
        .place_order(request(&world, vec![("SKU-A", 4)]))
        .await
        .unwrap();

    // Callback lands before the sweep: the hold is committed.
    world
        .orchestrator
        .reconcile(completed_callback(&placed, "txn-1"))
        .await
        .unwrap();

    let released = world.ledger.release_expired(Utc::now()).await.unwrap();
    assert_eq!(released, 0);
    assert_eq!(
        world.ledger.available(&ProductId::new("SKU-A")).await.unwrap(),
        6
    );
}

#[tokio::test]
async fn replayed_callbacks_settle_exactly_once() {
    let world = world().await;
    world
        .ledger
        .register_product(ProductId::new("SKU-A"), 10)
        .await
        .unwrap();

    let placed = world
        .orchestrator
        .place_order(request(&world, vec![("SKU-A", 2)]))
        .await
        .unwrap();

    let mut applied = 0;
    let mut duplicates = 0;
    for _ in 0..5 {
        match world
            .orchestrator
            .reconcile(completed_callback(&placed, "txn-1"))
            .await
            .unwrap()
        {
            ReconcileOutcome::Applied { .. } => applied += 1,
            ReconcileOutcome::Duplicate { .. } => duplicates += 1,
        }
    }
    assert_eq!(applied, 1);
    assert_eq!(duplicates, 4);

    let order = world.orchestrator.orders().get(placed.order.id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Confirmed);
    // One settlement: exactly one version bump past the insert.
    assert_eq!(order.version.as_i64(), 2);
}

#[tokio::test]
async fn cancellation_after_settlement_refunds_in_full() {
    let world = world().await;
    world
        .ledger
        .register_product(ProductId::new("SKU-A"), 10)
        .await
        .unwrap();

    let placed = world
        .orchestrator
        .place_order(request(&world, vec![("SKU-A", 2)]))
        .await
        .unwrap();
    world
        .orchestrator
        .reconcile(completed_callback(&placed, "txn-1"))
        .await
        .unwrap();

    let cancelled = world
        .orchestrator
        .cancel_order(placed.order.id, "requested by customer")
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.payment_status, PaymentStatus::Refunded);

    let payment = world
        .orchestrator
        .payments()
        .get(placed.payment.payment_id)
        .unwrap();
    assert_eq!(payment.refundable_balance(), common::Money::zero());
}
