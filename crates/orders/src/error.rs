//! Order error types.

use common::{CodedError, ErrorKind, OrderId, Version};
use thiserror::Error;

use crate::status::{OrderStatus, PaymentStatus};

/// Errors that can occur during order operations.
#[derive(Debug, Clone, Error)]
pub enum OrderError {
    /// No order exists with the given ID.
    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: OrderId },

    /// An order with this order number already exists.
    #[error("Duplicate order number: {order_number}")]
    DuplicateOrderNumber { order_number: String },

    /// The requested order-status transition is not in the adjacency table.
    #[error("Invalid order status transition: {from} -> {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    /// The requested payment-status transition is not in the adjacency table.
    #[error("Invalid payment status transition: {from} -> {to}")]
    InvalidPaymentStatusTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    /// The expected version does not match the stored version; the caller
    /// holds stale state.
    #[error("Stale update: expected version {expected}, stored version {actual}")]
    StaleUpdate { expected: Version, actual: Version },

    /// The requested status pair violates the joint constraint
    /// (a completed payment never coexists with a cancelled order).
    #[error("Inconsistent status pair: {status} with payment {payment_status}")]
    StatusConflict {
        status: OrderStatus,
        payment_status: PaymentStatus,
    },

    /// An order must carry at least one line item.
    #[error("Order has no line items")]
    NoItems,
}

impl CodedError for OrderError {
    fn code(&self) -> &'static str {
        match self {
            OrderError::OrderNotFound { .. } => "ORD_NOT_FOUND",
            OrderError::DuplicateOrderNumber { .. } => "ORD_DUPLICATE_NUMBER",
            OrderError::InvalidStatusTransition { .. } => "ORD_INVALID_TRANSITION",
            OrderError::InvalidPaymentStatusTransition { .. } => "ORD_INVALID_PAYMENT_TRANSITION",
            OrderError::StaleUpdate { .. } => "ORD_STALE_UPDATE",
            OrderError::StatusConflict { .. } => "ORD_STATUS_CONFLICT",
            OrderError::NoItems => "ORD_NO_ITEMS",
        }
    }

    fn kind(&self) -> ErrorKind {
        match self {
            OrderError::OrderNotFound { .. } => ErrorKind::NotFound,
            OrderError::DuplicateOrderNumber { .. } | OrderError::StaleUpdate { .. } => {
                ErrorKind::Conflict
            }
            OrderError::InvalidStatusTransition { .. }
            | OrderError::InvalidPaymentStatusTransition { .. }
            | OrderError::StatusConflict { .. } => ErrorKind::InvalidTransition,
            OrderError::NoItems => ErrorKind::Validation,
        }
    }
}

/// Convenience type alias for order results.
pub type Result<T> = std::result::Result<T, OrderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        let err = OrderError::StaleUpdate {
            expected: Version::new(2),
            actual: Version::new(3),
        };
        assert_eq!(err.code(), "ORD_STALE_UPDATE");
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_invalid_transition_kind() {
        let err = OrderError::InvalidStatusTransition {
            from: OrderStatus::Created,
            to: OrderStatus::Shipped,
        };
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        assert!(err.to_string().contains("Created -> Shipped"));
    }
}
