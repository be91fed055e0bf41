//! Inventory ledger trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use common::{OrderId, ProductId, ReservationId};

use crate::error::{InventoryError, Result};
use crate::reservation::{Reservation, ReservationState};

/// Trait for inventory ledger operations.
///
/// All mutations are atomic per product row: no two concurrent
/// reservations may both succeed past capacity.
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Registers a product with its total stock quantity.
    async fn register_product(&self, product_id: ProductId, quantity: u32) -> Result<()>;

    /// Returns the available quantity for a product
    /// (total minus reserved minus committed).
    async fn available(&self, product_id: &ProductId) -> Result<u32>;

    /// Places a hold on stock for an order.
    ///
    /// Fails with [`InventoryError::InsufficientStock`] when the available
    /// quantity cannot cover the request.
    async fn reserve(
        &self,
        product_id: &ProductId,
        quantity: u32,
        order_id: OrderId,
    ) -> Result<ReservationId>;

    /// Converts a hold into a committed sale on payment success.
    /// Committing twice is a no-op, not an error.
    async fn commit(&self, reservation_id: ReservationId) -> Result<()>;

    /// Returns held quantity to available stock. Idempotent; releasing a
    /// committed reservation is a no-op (commit takes precedence).
    async fn release(&self, reservation_id: ReservationId) -> Result<()>;

    /// Releases every active reservation whose TTL has lapsed at `now`.
    /// Returns the number of reservations released. Safe to run
    /// concurrently with in-flight commits.
    async fn release_expired(&self, now: DateTime<Utc>) -> Result<usize>;

    /// Looks up a reservation by ID.
    async fn reservation(&self, reservation_id: ReservationId) -> Result<Reservation>;
}

#[derive(Debug, Default)]
struct ProductStock {
    total: u32,
    reserved: u32,
    committed: u32,
}

impl ProductStock {
    fn available(&self) -> u32 {
        // Invariant: reserved + committed <= total, maintained by every
        // mutation below.
        self.total - self.reserved - self.committed
    }
}

#[derive(Debug)]
struct Inner {
    /// One lock per product row so distinct products are independent.
    rows: RwLock<HashMap<ProductId, Arc<Mutex<ProductStock>>>>,
    /// Reservation records. Lock ordering: `reservations` before any row.
    reservations: Mutex<HashMap<ReservationId, Reservation>>,
    ttl: Duration,
}

/// In-memory inventory ledger.
///
/// Per-product counters live behind row-level locks; reservation state is
/// tracked separately so commit/release/expiry stay idempotent.
#[derive(Debug, Clone)]
pub struct InMemoryInventoryLedger {
    inner: Arc<Inner>,
}

impl InMemoryInventoryLedger {
    /// Creates a ledger with the default 30-minute reservation TTL.
    pub fn new() -> Self {
        Self::with_ttl(Duration::minutes(30))
    }

    /// Creates a ledger with an explicit reservation TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                rows: RwLock::new(HashMap::new()),
                reservations: Mutex::new(HashMap::new()),
                ttl,
            }),
        }
    }

    /// Returns the number of reservations currently holding stock.
    pub fn active_reservation_count(&self) -> usize {
        self.inner
            .reservations
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.state.is_active())
            .count()
    }

    fn row(&self, product_id: &ProductId) -> Result<Arc<Mutex<ProductStock>>> {
        self.inner
            .rows
            .read()
            .unwrap()
            .get(product_id)
            .cloned()
            .ok_or_else(|| InventoryError::ProductNotFound {
                product_id: product_id.clone(),
            })
    }
}

impl Default for InMemoryInventoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InventoryLedger for InMemoryInventoryLedger {
    async fn register_product(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        let mut rows = self.inner.rows.write().unwrap();
        if rows.contains_key(&product_id) {
            return Err(InventoryError::ProductAlreadyRegistered { product_id });
        }
        rows.insert(
            product_id,
            Arc::new(Mutex::new(ProductStock {
                total: quantity,
                reserved: 0,
                committed: 0,
            })),
        );
        Ok(())
    }

    async fn available(&self, product_id: &ProductId) -> Result<u32> {
        let row = self.row(product_id)?;
        let stock = row.lock().unwrap();
        Ok(stock.available())
    }

    async fn reserve(
        &self,
        product_id: &ProductId,
        quantity: u32,
        order_id: OrderId,
    ) -> Result<ReservationId> {
        let row = self.row(product_id)?;

        // Conditional update under the row lock: check and increment are
        // one critical section, never read-then-blind-write.
        {
            let mut stock = row.lock().unwrap();
            let available = stock.available();
            if available < quantity {
                metrics::counter!("inventory_insufficient_stock_total").increment(1);
                return Err(InventoryError::InsufficientStock {
                    product_id: product_id.clone(),
                    requested: quantity,
                    available,
                });
            }
            stock.reserved += quantity;
        }

        let reservation = Reservation {
            id: ReservationId::new(),
            order_id,
            product_id: product_id.clone(),
            quantity,
            state: ReservationState::Reserved,
            expires_at: Utc::now() + self.inner.ttl,
        };
        let reservation_id = reservation.id;

        self.inner
            .reservations
            .lock()
            .unwrap()
            .insert(reservation_id, reservation);

        metrics::counter!("inventory_reservations_total").increment(1);
        tracing::debug!(%reservation_id, %product_id, quantity, %order_id, "stock reserved");
        Ok(reservation_id)
    }

    async fn commit(&self, reservation_id: ReservationId) -> Result<()> {
        let mut reservations = self.inner.reservations.lock().unwrap();
        let reservation = reservations
            .get_mut(&reservation_id)
            .ok_or(InventoryError::ReservationNotFound { reservation_id })?;

        match reservation.state {
            ReservationState::Committed => Ok(()),
            ReservationState::Released => {
                Err(InventoryError::ReservationReleased { reservation_id })
            }
            ReservationState::Reserved => {
                let row = self.row(&reservation.product_id)?;
                let mut stock = row.lock().unwrap();
                stock.reserved -= reservation.quantity;
                stock.committed += reservation.quantity;
                reservation.state = ReservationState::Committed;
                tracing::debug!(%reservation_id, "reservation committed");
                Ok(())
            }
        }
    }

    async fn release(&self, reservation_id: ReservationId) -> Result<()> {
        let mut reservations = self.inner.reservations.lock().unwrap();
        let reservation = reservations
            .get_mut(&reservation_id)
            .ok_or(InventoryError::ReservationNotFound { reservation_id })?;

        match reservation.state {
            // Commit landed first; the hold is a sale now.
            ReservationState::Committed => Ok(()),
            ReservationState::Released => Ok(()),
            ReservationState::Reserved => {
                let row = self.row(&reservation.product_id)?;
                let mut stock = row.lock().unwrap();
                stock.reserved -= reservation.quantity;
                reservation.state = ReservationState::Released;
                tracing::debug!(%reservation_id, "reservation released");
                Ok(())
            }
        }
    }

    async fn release_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut reservations = self.inner.reservations.lock().unwrap();
        let mut released = 0;

        for reservation in reservations.values_mut() {
            if !reservation.is_expired(now) {
                continue;
            }
            let row = self.row(&reservation.product_id)?;
            let mut stock = row.lock().unwrap();
            stock.reserved -= reservation.quantity;
            reservation.state = ReservationState::Released;
            released += 1;
            tracing::info!(
                reservation_id = %reservation.id,
                order_id = %reservation.order_id,
                "expired reservation released"
            );
        }

        if released > 0 {
            metrics::counter!("inventory_reservations_expired_total").increment(released as u64);
        }
        Ok(released)
    }

    async fn reservation(&self, reservation_id: ReservationId) -> Result<Reservation> {
        self.inner
            .reservations
            .lock()
            .unwrap()
            .get(&reservation_id)
            .cloned()
            .ok_or(InventoryError::ReservationNotFound { reservation_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ledger_with(product: &str, quantity: u32) -> InMemoryInventoryLedger {
        let ledger = InMemoryInventoryLedger::new();
        ledger
            .register_product(ProductId::new(product), quantity)
            .await
            .unwrap();
        ledger
    }

    #[tokio::test]
    async fn test_reserve_and_commit() {
        let ledger = ledger_with("SKU-001", 10).await;
        let product = ProductId::new("SKU-001");

        let id = ledger.reserve(&product, 4, OrderId::new()).await.unwrap();
        assert_eq!(ledger.available(&product).await.unwrap(), 6);

        ledger.commit(id).await.unwrap();
        assert_eq!(ledger.available(&product).await.unwrap(), 6);
        assert_eq!(ledger.active_reservation_count(), 0);
    }

    #[tokio::test]
    async fn test_reserve_and_release_restores_available() {
        let ledger = ledger_with("SKU-001", 10).await;
        let product = ProductId::new("SKU-001");

        let id = ledger.reserve(&product, 4, OrderId::new()).await.unwrap();
        ledger.release(id).await.unwrap();

        assert_eq!(ledger.available(&product).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_insufficient_stock_carries_diagnostics() {
        let ledger = ledger_with("SKU-001", 5).await;
        let product = ProductId::new("SKU-001");

        ledger.reserve(&product, 3, OrderId::new()).await.unwrap();
        let err = ledger
            .reserve(&product, 3, OrderId::new())
            .await
            .unwrap_err();

        match err {
            InventoryError::InsufficientStock {
                requested,
                available,
                ..
            } => {
                assert_eq!(requested, 3);
                assert_eq!(available, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let ledger = InMemoryInventoryLedger::new();
        let result = ledger
            .reserve(&ProductId::new("SKU-404"), 1, OrderId::new())
            .await;
        assert!(matches!(
            result,
            Err(InventoryError::ProductNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_product_registration() {
        let ledger = ledger_with("SKU-001", 5).await;
        let result = ledger.register_product(ProductId::new("SKU-001"), 3).await;
        assert!(matches!(
            result,
            Err(InventoryError::ProductAlreadyRegistered { .. })
        ));
    }

    #[tokio::test]
    async fn test_commit_is_idempotent() {
        let ledger = ledger_with("SKU-001", 10).await;
        let product = ProductId::new("SKU-001");

        let id = ledger.reserve(&product, 4, OrderId::new()).await.unwrap();
        ledger.commit(id).await.unwrap();
        ledger.commit(id).await.unwrap();

        assert_eq!(ledger.available(&product).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let ledger = ledger_with("SKU-001", 10).await;
        let product = ProductId::new("SKU-001");

        let id = ledger.reserve(&product, 4, OrderId::new()).await.unwrap();
        ledger.release(id).await.unwrap();
        ledger.release(id).await.unwrap();

        assert_eq!(ledger.available(&product).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_release_after_commit_is_noop() {
        let ledger = ledger_with("SKU-001", 10).await;
        let product = ProductId::new("SKU-001");

        let id = ledger.reserve(&product, 4, OrderId::new()).await.unwrap();
        ledger.commit(id).await.unwrap();
        ledger.release(id).await.unwrap();

        // Committed quantity stays committed.
        assert_eq!(ledger.available(&product).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_commit_after_release_is_rejected() {
        let ledger = ledger_with("SKU-001", 10).await;
        let product = ProductId::new("SKU-001");

        let id = ledger.reserve(&product, 4, OrderId::new()).await.unwrap();
        ledger.release(id).await.unwrap();
        let result = ledger.commit(id).await;

        assert!(matches!(
            result,
            Err(InventoryError::ReservationReleased { .. })
        ));
    }

    #[tokio::test]
    async fn test_expiry_sweep_releases_lapsed_holds() {
        let ledger = InMemoryInventoryLedger::with_ttl(Duration::zero());
        let product = ProductId::new("SKU-001");
        ledger.register_product(product.clone(), 10).await.unwrap();

        ledger.reserve(&product, 4, OrderId::new()).await.unwrap();
        assert_eq!(ledger.available(&product).await.unwrap(), 6);

        let released = ledger
            .release_expired(Utc::now() + Duration::seconds(1))
            .await
            .unwrap();

        assert_eq!(released, 1);
        assert_eq!(ledger.available(&product).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_expiry_sweep_skips_committed() {
        let ledger = InMemoryInventoryLedger::with_ttl(Duration::zero());
        let product = ProductId::new("SKU-001");
        ledger.register_product(product.clone(), 10).await.unwrap();

        let id = ledger.reserve(&product, 4, OrderId::new()).await.unwrap();
        ledger.commit(id).await.unwrap();

        let released = ledger
            .release_expired(Utc::now() + Duration::seconds(1))
            .await
            .unwrap();

        assert_eq!(released, 0);
        assert_eq!(ledger.available(&product).await.unwrap(), 6);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_no_oversell_under_concurrency() {
        let ledger = ledger_with("SKU-001", 5).await;
        let product = ProductId::new("SKU-001");

        let mut handles = Vec::new();
        for _ in 0..20 {
            let ledger = ledger.clone();
            let product = product.clone();
            handles.push(tokio::spawn(async move {
                ledger.reserve(&product, 1, OrderId::new()).await.is_ok()
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap() {
                succeeded += 1;
            }
        }

        // Exactly the total quantity can ever be held.
        assert_eq!(succeeded, 5);
        assert_eq!(ledger.available(&product).await.unwrap(), 0);
    }
}
