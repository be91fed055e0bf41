//! Append-only ledger of gateway interactions.

use chrono::{DateTime, Utc};
use common::PaymentId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The outcome of one gateway round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionOutcome {
    /// A gateway order was created for the payment.
    Initiated,

    /// The gateway confirmed capture.
    Completed,

    /// The gateway reported failure (or the round-trip itself failed).
    Failed,

    /// A refund was executed.
    Refunded,
}

impl TransactionOutcome {
    /// Returns the outcome name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionOutcome::Initiated => "Initiated",
            TransactionOutcome::Completed => "Completed",
            TransactionOutcome::Failed => "Failed",
            TransactionOutcome::Refunded => "Refunded",
        }
    }
}

impl std::fmt::Display for TransactionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One ledger row per gateway interaction.
///
/// Rows are never mutated or deleted; the unique gateway transaction id is
/// where duplicate callbacks are detected, not re-applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentTransaction {
    /// Internal row identifier.
    pub id: Uuid,

    /// The payment this interaction belongs to.
    pub payment_id: PaymentId,

    /// Gateway-assigned transaction id, unique across all rows.
    pub gateway_transaction_id: String,

    /// What the round-trip produced.
    pub outcome: TransactionOutcome,

    /// When the row was appended.
    pub recorded_at: DateTime<Utc>,
}

impl PaymentTransaction {
    /// Creates a new ledger row, timestamped now.
    pub fn new(
        payment_id: PaymentId,
        gateway_transaction_id: impl Into<String>,
        outcome: TransactionOutcome,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            payment_id,
            gateway_transaction_id: gateway_transaction_id.into(),
            outcome,
            recorded_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_transaction() {
        let payment_id = PaymentId::new();
        let txn = PaymentTransaction::new(payment_id, "gw_txn_1", TransactionOutcome::Completed);

        assert_eq!(txn.payment_id, payment_id);
        assert_eq!(txn.gateway_transaction_id, "gw_txn_1");
        assert_eq!(txn.outcome, TransactionOutcome::Completed);
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(TransactionOutcome::Initiated.to_string(), "Initiated");
        assert_eq!(TransactionOutcome::Refunded.to_string(), "Refunded");
    }
}
