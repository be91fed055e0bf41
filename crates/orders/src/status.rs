//! Order and payment status state machines.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Created ──► Confirmed ──► Processing ──► Shipped ──► Delivered
///    │            │             │             │
///    ├── Failed ──┤             │             │
///    └────────────┴─────────────┴─────────────┴──► Cancelled
/// ```
///
/// `Cancelled` is reachable from any non-terminal status; `Failed` only
/// from `Created` and `Confirmed` (payment failure).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order persisted, payment pending.
    #[default]
    Created,

    /// Payment completed, inventory committed.
    Confirmed,

    /// Order is being prepared by the business.
    Processing,

    /// Order handed to the carrier.
    Shipped,

    /// Order delivered (terminal state).
    Delivered,

    /// Order cancelled (terminal state).
    Cancelled,

    /// Payment failed or initiation broke down (terminal state).
    Failed,
}

impl OrderStatus {
    /// Returns true if the requested transition is in the adjacency table.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Created, Confirmed) | (Created, Failed) => true,
            (Confirmed, Processing) | (Confirmed, Failed) => true,
            (Processing, Shipped) => true,
            (Shipped, Delivered) => true,
            (current, Cancelled) => !current.is_terminal(),
            _ => false,
        }
    }

    /// Returns true if this is a terminal status (retained for audit,
    /// never deleted).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Failed
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "Created",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The payment status on the order aggregate.
///
/// Cycles independently of [`OrderStatus`]:
/// ```text
/// Pending ──┬──► Completed ──► Refunded
///           └──► Failed
/// ```
///
/// Transitions are monotonic; a completed payment never returns to
/// pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    /// Payment initiated, awaiting gateway confirmation.
    #[default]
    Pending,

    /// Payment captured by the gateway.
    Completed,

    /// Payment declined or failed (terminal state).
    Failed,

    /// Captured amount fully returned (terminal state).
    Refunded,
}

impl PaymentStatus {
    /// Returns true if the requested transition is in the adjacency table.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Completed) | (Pending, Failed) | (Completed, Refunded)
        )
    }

    /// Returns true if this is a terminal payment status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Failed | PaymentStatus::Refunded)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Completed => "Completed",
            PaymentStatus::Failed => "Failed",
            PaymentStatus::Refunded => "Refunded",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
