//! Payment aggregate.

use chrono::{DateTime, Utc};
use common::{BusinessId, CustomerId, Money, OrderId, PaymentId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PaymentError;

/// The state of a payment in its lifecycle.
///
/// State transitions (monotonic, never backwards):
/// ```text
/// Pending ──┬──► Completed ──► Refunded
///           └──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentState {
    /// Initiated with the gateway, awaiting confirmation.
    #[default]
    Pending,

    /// Captured by the gateway. May still carry a partial refund balance.
    Completed,

    /// Declined or aborted (terminal state).
    Failed,

    /// Captured amount fully returned (terminal state).
    Refunded,
}

impl PaymentState {
    /// Returns true if the payment still awaits gateway resolution.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, PaymentState::Pending)
    }

    /// Returns true if no further state change is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentState::Failed | PaymentState::Refunded)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Pending => "Pending",
            PaymentState::Completed => "Completed",
            PaymentState::Failed => "Failed",
            PaymentState::Refunded => "Refunded",
        }
    }
}

impl std::fmt::Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    Card,
    Upi,
    NetBanking,
    Wallet,
}

impl PaymentMethod {
    /// Returns the method name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "Card",
            PaymentMethod::Upi => "Upi",
            PaymentMethod::NetBanking => "NetBanking",
            PaymentMethod::Wallet => "Wallet",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment aggregate.
///
/// `amount` is immutable after creation; state transitions are monotonic.
/// Never deleted — settled payments are retained for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Internal payment identifier.
    pub id: PaymentId,

    /// Externally-visible unique reference, the idempotency key for
    /// gateway reconciliation.
    pub payment_reference: String,

    /// The order this payment pays for.
    pub order_id: OrderId,

    /// Paying customer.
    pub customer_id: CustomerId,

    /// Business being paid.
    pub business_id: BusinessId,

    /// Amount to capture. Immutable after creation.
    pub amount: Money,

    /// ISO currency code.
    pub currency: String,

    /// Payment method.
    pub method: PaymentMethod,

    /// Current state.
    pub state: PaymentState,

    /// Gateway-side order identifier, set on initiation.
    pub gateway_order_id: Option<String>,

    /// Gateway-side payment identifier, set on confirmation.
    pub gateway_payment_id: Option<String>,

    /// Why the payment failed, if it did.
    pub failure_reason: Option<String>,

    /// Cumulative refunded amount across all refunds.
    pub refunded: Money,

    /// When the payment was created.
    pub created_at: DateTime<Utc>,

    /// When the payment was captured, if it was.
    pub paid_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Creates a new pending payment with a fresh reference.
    pub fn new(
        order_id: OrderId,
        customer_id: CustomerId,
        business_id: BusinessId,
        amount: Money,
        currency: impl Into<String>,
        method: PaymentMethod,
    ) -> Self {
        let id = PaymentId::new();
        Self {
            id,
            payment_reference: generate_reference(),
            order_id,
            customer_id,
            business_id,
            amount,
            currency: currency.into(),
            method,
            state: PaymentState::Pending,
            gateway_order_id: None,
            gateway_payment_id: None,
            failure_reason: None,
            refunded: Money::zero(),
            created_at: Utc::now(),
            paid_at: None,
        }
    }

    /// Marks the payment captured.
    pub fn complete(&mut self, gateway_payment_id: Option<String>) -> Result<(), PaymentError> {
        if self.state != PaymentState::Pending {
            return Err(PaymentError::InvalidTransition {
                from: self.state,
                to: PaymentState::Completed,
            });
        }
        self.state = PaymentState::Completed;
        self.gateway_payment_id = gateway_payment_id;
        self.paid_at = Some(Utc::now());
        Ok(())
    }

    /// Marks the payment failed.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), PaymentError> {
        if self.state != PaymentState::Pending {
            return Err(PaymentError::InvalidTransition {
                from: self.state,
                to: PaymentState::Failed,
            });
        }
        self.state = PaymentState::Failed;
        self.failure_reason = Some(reason.into());
        Ok(())
    }

    /// Returns the captured amount not yet refunded.
    pub fn refundable_balance(&self) -> Money {
        self.amount - self.refunded
    }

    /// Records a refund against the captured amount.
    ///
    /// Rejects amounts exceeding the remaining refundable balance; a full
    /// refund moves the payment to `Refunded`.
    pub fn record_refund(&mut self, amount: Money) -> Result<(), PaymentError> {
        if self.state != PaymentState::Completed {
            return Err(PaymentError::NotRefundable { state: self.state });
        }
        let refundable = self.refundable_balance();
        if !amount.is_positive() || amount > refundable {
            return Err(PaymentError::InvalidRefundAmount {
                requested: amount,
                refundable,
            });
        }
        self.refunded += amount;
        if self.refunded == self.amount {
            self.state = PaymentState::Refunded;
        }
        Ok(())
    }

    /// Releases a recorded refund whose gateway round-trip failed,
    /// restoring the balance it had reserved.
    pub fn release_refund(&mut self, amount: Money) {
        self.refunded -= amount;
        if self.state == PaymentState::Refunded {
            self.state = PaymentState::Completed;
        }
    }
}

/// Generates an externally-visible payment reference.
fn generate_reference() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("PAY-{}", &uuid[..12].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_payment() -> Payment {
        Payment::new(
            OrderId::new(),
            CustomerId::new(),
            BusinessId::new(),
            Money::from_cents(5000),
            "USD",
            PaymentMethod::Card,
        )
    }

    #[test]
    fn test_new_payment_is_pending() {
        let payment = make_payment();
        assert_eq!(payment.state, PaymentState::Pending);
        assert!(payment.state.is_in_flight());
        assert!(payment.payment_reference.starts_with("PAY-"));
        assert!(payment.paid_at.is_none());
    }

    #[test]
    fn test_references_are_distinct() {
        assert_ne!(
            make_payment().payment_reference,
            make_payment().payment_reference
        );
    }

    #[test]
    fn test_complete() {
        let mut payment = make_payment();
        payment.complete(Some("gw_pay_1".to_string())).unwrap();

        assert_eq!(payment.state, PaymentState::Completed);
        assert_eq!(payment.gateway_payment_id.as_deref(), Some("gw_pay_1"));
        assert!(payment.paid_at.is_some());
    }

    #[test]
    fn test_complete_twice_rejected() {
        let mut payment = make_payment();
        payment.complete(None).unwrap();
        let result = payment.complete(None);
        assert!(matches!(result, Err(PaymentError::InvalidTransition { .. })));
    }

    #[test]
    fn test_fail_records_reason() {
        let mut payment = make_payment();
        payment.fail("card declined").unwrap();

        assert_eq!(payment.state, PaymentState::Failed);
        assert_eq!(payment.failure_reason.as_deref(), Some("card declined"));
        assert!(payment.state.is_terminal());
    }

    #[test]
    fn test_fail_after_complete_rejected() {
        let mut payment = make_payment();
        payment.complete(None).unwrap();
        let result = payment.fail("too late");
        assert!(matches!(result, Err(PaymentError::InvalidTransition { .. })));
    }

    #[test]
    fn test_full_refund_moves_to_refunded() {
        let mut payment = make_payment();
        payment.complete(None).unwrap();
        payment.record_refund(Money::from_cents(5000)).unwrap();

        assert_eq!(payment.state, PaymentState::Refunded);
        assert_eq!(payment.refundable_balance(), Money::zero());
    }

    #[test]
    fn test_partial_refunds_accumulate() {
        let mut payment = make_payment();
        payment.complete(None).unwrap();

        payment.record_refund(Money::from_cents(2000)).unwrap();
        assert_eq!(payment.state, PaymentState::Completed);
        assert_eq!(payment.refundable_balance().cents(), 3000);

        payment.record_refund(Money::from_cents(3000)).unwrap();
        assert_eq!(payment.state, PaymentState::Refunded);
    }

    #[test]
    fn test_refund_exceeding_balance_rejected() {
        let mut payment = make_payment();
        payment.complete(None).unwrap();
        payment.record_refund(Money::from_cents(3000)).unwrap();

        let result = payment.record_refund(Money::from_cents(3000));
        match result {
            Err(PaymentError::InvalidRefundAmount {
                requested,
                refundable,
            }) => {
                assert_eq!(requested.cents(), 3000);
                assert_eq!(refundable.cents(), 2000);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_released_refund_restores_balance() {
        let mut payment = make_payment();
        payment.complete(None).unwrap();
        payment.record_refund(Money::from_cents(5000)).unwrap();
        assert_eq!(payment.state, PaymentState::Refunded);

        payment.release_refund(Money::from_cents(5000));
        assert_eq!(payment.state, PaymentState::Completed);
        assert_eq!(payment.refundable_balance().cents(), 5000);
    }

    #[test]
    fn test_refund_of_pending_payment_rejected() {
        let mut payment = make_payment();
        let result = payment.record_refund(Money::from_cents(1000));
        assert!(matches!(result, Err(PaymentError::NotRefundable { .. })));
    }

    #[test]
    fn test_serialization() {
        let payment = make_payment();
        let json = serde_json::to_string(&payment).unwrap();
        let deserialized: Payment = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.id, payment.id);
        assert_eq!(deserialized.payment_reference, payment.payment_reference);
    }
}
