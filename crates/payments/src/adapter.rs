//! Payment adapter: initiate, confirm, refund.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use common::{BusinessId, CustomerId, Money, OrderId, PaymentId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PaymentError, Result};
use crate::gateway::PaymentGateway;
use crate::payment::{Payment, PaymentMethod, PaymentState};
use crate::transaction::{PaymentTransaction, TransactionOutcome};

/// Handle returned by a successful payment initiation.
#[derive(Debug, Clone)]
pub struct PaymentHandle {
    /// Internal payment identifier.
    pub payment_id: PaymentId,

    /// Externally-visible idempotency key.
    pub payment_reference: String,

    /// Gateway-side order identifier.
    pub gateway_order_id: String,
}

/// Outcome reported by a gateway confirmation callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallbackOutcome {
    Completed,
    Failed,
}

/// A gateway confirmation callback, delivered at least once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayCallback {
    /// The payment reference the callback applies to.
    pub payment_reference: String,

    /// Gateway transaction id, the dedup key.
    pub gateway_transaction_id: String,

    /// Gateway-side payment id, if capture succeeded.
    pub gateway_payment_id: Option<String>,

    /// What the gateway reports.
    pub outcome: CallbackOutcome,

    /// Failure detail when the outcome is `Failed`.
    pub failure_reason: Option<String>,
}

/// Result of applying (or deduplicating) a confirmation callback.
#[derive(Debug, Clone)]
pub struct ConfirmOutcome {
    /// The payment the callback resolved to.
    pub payment_id: PaymentId,

    /// The order the payment pays for.
    pub order_id: OrderId,

    /// The reported outcome.
    pub outcome: CallbackOutcome,

    /// False when the callback was a replay and nothing changed.
    pub newly_applied: bool,
}

/// Result of a refund.
#[derive(Debug, Clone)]
pub struct RefundOutcome {
    /// The refunded payment.
    pub payment_id: PaymentId,

    /// Amount refunded by this call.
    pub amount: Money,

    /// Gateway transaction id of the refund round-trip.
    pub gateway_transaction_id: String,

    /// Captured amount still refundable after this call.
    pub remaining_refundable: Money,
}

#[derive(Debug, Default)]
struct AdapterState {
    payments: HashMap<PaymentId, Payment>,
    by_reference: HashMap<String, PaymentId>,
    /// One non-terminal payment per order, enforced here.
    in_flight_by_order: HashMap<OrderId, PaymentId>,
    /// Append-only ledger, one row per gateway round-trip.
    transactions: Vec<PaymentTransaction>,
    /// Dedup index: gateway transaction id -> payment it was applied to.
    seen_transactions: HashMap<String, PaymentId>,
}

impl AdapterState {
    fn append_transaction(
        &mut self,
        payment_id: PaymentId,
        gateway_transaction_id: String,
        outcome: TransactionOutcome,
    ) {
        self.seen_transactions
            .insert(gateway_transaction_id.clone(), payment_id);
        self.transactions.push(PaymentTransaction::new(
            payment_id,
            gateway_transaction_id,
            outcome,
        ));
    }
}

/// Wraps the external processor behind initiate/confirm/refund.
///
/// Every gateway round-trip appends one [`PaymentTransaction`] row
/// regardless of outcome; the row's unique gateway transaction id is the
/// dedup source for replayed callbacks.
#[derive(Debug, Clone)]
pub struct PaymentAdapter<G: PaymentGateway> {
    gateway: G,
    state: Arc<RwLock<AdapterState>>,
}

impl<G: PaymentGateway> PaymentAdapter<G> {
    /// Creates an adapter over the given gateway.
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            state: Arc::new(RwLock::new(AdapterState::default())),
        }
    }

    /// Initiates a payment for an order.
    ///
    /// Creates a pending payment row first, so the one-in-flight-per-order
    /// constraint holds even while the gateway call is outstanding.
    #[tracing::instrument(skip(self))]
    pub async fn initiate(
        &self,
        order_id: OrderId,
        customer_id: CustomerId,
        business_id: BusinessId,
        amount: Money,
        currency: &str,
        method: PaymentMethod,
    ) -> Result<PaymentHandle> {
        let (payment_id, payment_reference) = {
            let mut state = self.state.write().unwrap();
            if state.in_flight_by_order.contains_key(&order_id) {
                return Err(PaymentError::PaymentInFlight { order_id });
            }
            let payment =
                Payment::new(order_id, customer_id, business_id, amount, currency, method);
            let payment_id = payment.id;
            let payment_reference = payment.payment_reference.clone();
            state.by_reference.insert(payment_reference.clone(), payment_id);
            state.in_flight_by_order.insert(order_id, payment_id);
            state.payments.insert(payment_id, payment);
            (payment_id, payment_reference)
        };

        match self
            .gateway
            .create_order(&payment_reference, amount, currency)
            .await
        {
            Ok(gateway_order) => {
                let mut state = self.state.write().unwrap();
                if let Some(payment) = state.payments.get_mut(&payment_id) {
                    payment.gateway_order_id = Some(gateway_order.gateway_order_id.clone());
                }
                state.append_transaction(
                    payment_id,
                    gateway_order.gateway_transaction_id,
                    TransactionOutcome::Initiated,
                );
                metrics::counter!("payments_initiated_total").increment(1);
                tracing::info!(%payment_id, %order_id, %amount, "payment initiated");
                Ok(PaymentHandle {
                    payment_id,
                    payment_reference,
                    gateway_order_id: gateway_order.gateway_order_id,
                })
            }
            Err(err) => {
                let mut state = self.state.write().unwrap();
                if let Some(payment) = state.payments.get_mut(&payment_id) {
                    let _ = payment.fail(err.to_string());
                }
                state.in_flight_by_order.remove(&order_id);
                // The round-trip failed before the gateway assigned an id;
                // the audit row gets a locally generated one.
                let local_id = format!("local-{}", Uuid::new_v4().simple());
                state.append_transaction(payment_id, local_id, TransactionOutcome::Failed);
                metrics::counter!("payments_initiation_failed_total").increment(1);
                Err(err)
            }
        }
    }

    /// Applies a gateway confirmation callback.
    ///
    /// Replayed callbacks (same gateway transaction id) are detected and
    /// ignored after the first application, still returning success so
    /// at-least-once delivery can be acknowledged.
    #[tracing::instrument(skip(self, callback), fields(reference = %callback.payment_reference))]
    pub async fn confirm(&self, callback: GatewayCallback) -> Result<ConfirmOutcome> {
        let mut state = self.state.write().unwrap();

        if let Some(&payment_id) = state.seen_transactions.get(&callback.gateway_transaction_id) {
            let payment = state
                .payments
                .get(&payment_id)
                .ok_or(PaymentError::PaymentNotFound { payment_id })?;
            metrics::counter!("payments_callback_replays_total").increment(1);
            tracing::info!(
                %payment_id,
                gateway_transaction_id = %callback.gateway_transaction_id,
                "duplicate gateway callback ignored"
            );
            return Ok(ConfirmOutcome {
                payment_id,
                order_id: payment.order_id,
                outcome: callback.outcome,
                newly_applied: false,
            });
        }

        let payment_id = *state
            .by_reference
            .get(&callback.payment_reference)
            .ok_or_else(|| PaymentError::UnknownReference {
                reference: callback.payment_reference.clone(),
            })?;
        let payment = state
            .payments
            .get_mut(&payment_id)
            .ok_or(PaymentError::PaymentNotFound { payment_id })?;

        let outcome = match callback.outcome {
            CallbackOutcome::Completed => {
                payment.complete(callback.gateway_payment_id.clone())?;
                TransactionOutcome::Completed
            }
            CallbackOutcome::Failed => {
                payment.fail(
                    callback
                        .failure_reason
                        .clone()
                        .unwrap_or_else(|| "payment failed".to_string()),
                )?;
                TransactionOutcome::Failed
            }
        };
        let order_id = payment.order_id;

        state.in_flight_by_order.remove(&order_id);
        state.append_transaction(payment_id, callback.gateway_transaction_id.clone(), outcome);

        metrics::counter!("payments_confirmed_total").increment(1);
        tracing::info!(%payment_id, %order_id, ?callback.outcome, "gateway callback applied");

        Ok(ConfirmOutcome {
            payment_id,
            order_id,
            outcome: callback.outcome,
            newly_applied: true,
        })
    }

    /// Refunds a captured payment.
    ///
    /// An omitted amount refunds the full remaining balance. Refunds are
    /// validated against the remaining refundable balance, never the
    /// original amount, so repeated partial refunds cannot overdraw.
    /// The amount is reserved against the balance before the gateway
    /// round-trip, so a racing refund of the same funds is rejected here
    /// instead of reaching the processor twice; a failed round-trip
    /// releases the reservation.
    #[tracing::instrument(skip(self))]
    pub async fn refund(
        &self,
        payment_id: PaymentId,
        amount: Option<Money>,
        reason: &str,
    ) -> Result<RefundOutcome> {
        let (payment_reference, requested) = {
            let mut state = self.state.write().unwrap();
            let payment = state
                .payments
                .get_mut(&payment_id)
                .ok_or(PaymentError::PaymentNotFound { payment_id })?;
            let requested = amount.unwrap_or_else(|| payment.refundable_balance());
            payment.record_refund(requested)?;
            (payment.payment_reference.clone(), requested)
        };

        let gateway_refund = match self.gateway.refund(&payment_reference, requested).await {
            Ok(refund) => refund,
            Err(err) => {
                let mut state = self.state.write().unwrap();
                if let Some(payment) = state.payments.get_mut(&payment_id) {
                    payment.release_refund(requested);
                }
                let local_id = format!("local-{}", Uuid::new_v4().simple());
                state.append_transaction(payment_id, local_id, TransactionOutcome::Failed);
                return Err(err);
            }
        };

        let mut state = self.state.write().unwrap();
        let remaining = state
            .payments
            .get(&payment_id)
            .map(Payment::refundable_balance)
            .unwrap_or(Money::zero());
        state.append_transaction(
            payment_id,
            gateway_refund.gateway_transaction_id.clone(),
            TransactionOutcome::Refunded,
        );

        metrics::counter!("payments_refunded_total").increment(1);
        tracing::info!(%payment_id, amount = %requested, reason, "payment refunded");

        Ok(RefundOutcome {
            payment_id,
            amount: requested,
            gateway_transaction_id: gateway_refund.gateway_transaction_id,
            remaining_refundable: remaining,
        })
    }

    /// Loads a payment by ID.
    pub fn get(&self, payment_id: PaymentId) -> Result<Payment> {
        self.state
            .read()
            .unwrap()
            .payments
            .get(&payment_id)
            .cloned()
            .ok_or(PaymentError::PaymentNotFound { payment_id })
    }

    /// Returns all payments for an order, most recent last.
    pub fn payments_for_order(&self, order_id: OrderId) -> Vec<Payment> {
        let state = self.state.read().unwrap();
        let mut payments: Vec<Payment> = state
            .payments
            .values()
            .filter(|p| p.order_id == order_id)
            .cloned()
            .collect();
        payments.sort_by_key(|p| p.created_at);
        payments
    }

    /// Returns the transaction ledger rows for a payment, in append order.
    pub fn transactions_for(&self, payment_id: PaymentId) -> Vec<PaymentTransaction> {
        self.state
            .read()
            .unwrap()
            .transactions
            .iter()
            .filter(|t| t.payment_id == payment_id)
            .cloned()
            .collect()
    }

    /// Marks a still-pending payment failed without a gateway round-trip
    /// (order cancelled before confirmation). Idempotent on settled
    /// payments.
    pub fn void(&self, payment_id: PaymentId, reason: &str) -> Result<()> {
        let mut state = self.state.write().unwrap();
        let payment = state
            .payments
            .get_mut(&payment_id)
            .ok_or(PaymentError::PaymentNotFound { payment_id })?;
        if payment.state != PaymentState::Pending {
            return Ok(());
        }
        payment.fail(reason)?;
        let order_id = payment.order_id;
        state.in_flight_by_order.remove(&order_id);
        tracing::info!(%payment_id, reason, "pending payment voided");
        Ok(())
    }
}
