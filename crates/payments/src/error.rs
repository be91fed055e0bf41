//! Payment error types.

use common::{CodedError, ErrorKind, Money, OrderId, PaymentId};
use thiserror::Error;

use crate::payment::PaymentState;

/// Errors that can occur during payment operations.
#[derive(Debug, Clone, Error)]
pub enum PaymentError {
    /// No payment exists with the given ID.
    #[error("Payment not found: {payment_id}")]
    PaymentNotFound { payment_id: PaymentId },

    /// No payment exists with the given reference.
    #[error("Unknown payment reference: {reference}")]
    UnknownReference { reference: String },

    /// The order already has a non-terminal payment.
    #[error("Order {order_id} already has a payment in flight")]
    PaymentInFlight { order_id: OrderId },

    /// The requested state transition violates payment monotonicity.
    #[error("Invalid payment transition: {from} -> {to}")]
    InvalidTransition { from: PaymentState, to: PaymentState },

    /// The payment is not in a refundable state.
    #[error("Payment is not refundable in state {state}")]
    NotRefundable { state: PaymentState },

    /// The refund amount exceeds the remaining refundable balance or is
    /// not positive.
    #[error("Invalid refund amount: requested {requested}, refundable {refundable}")]
    InvalidRefundAmount { requested: Money, refundable: Money },

    /// The external gateway failed or was unreachable.
    #[error("Payment gateway error: {message}")]
    Gateway { message: String },
}

impl CodedError for PaymentError {
    fn code(&self) -> &'static str {
        match self {
            PaymentError::PaymentNotFound { .. } => "PAY_NOT_FOUND",
            PaymentError::UnknownReference { .. } => "PAY_UNKNOWN_REFERENCE",
            PaymentError::PaymentInFlight { .. } => "PAY_IN_FLIGHT",
            PaymentError::InvalidTransition { .. } => "PAY_INVALID_TRANSITION",
            PaymentError::NotRefundable { .. } => "PAY_NOT_REFUNDABLE",
            PaymentError::InvalidRefundAmount { .. } => "PAY_INVALID_REFUND_AMOUNT",
            PaymentError::Gateway { .. } => "PAY_GATEWAY_UNAVAILABLE",
        }
    }

    fn kind(&self) -> ErrorKind {
        match self {
            PaymentError::PaymentNotFound { .. } | PaymentError::UnknownReference { .. } => {
                ErrorKind::NotFound
            }
            PaymentError::PaymentInFlight { .. } => ErrorKind::Conflict,
            PaymentError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            PaymentError::NotRefundable { .. } | PaymentError::InvalidRefundAmount { .. } => {
                ErrorKind::Validation
            }
            PaymentError::Gateway { .. } => ErrorKind::DependencyUnavailable,
        }
    }
}

/// Convenience type alias for payment results.
pub type Result<T> = std::result::Result<T, PaymentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_kinds() {
        let err = PaymentError::InvalidRefundAmount {
            requested: Money::from_cents(5000),
            refundable: Money::from_cents(3000),
        };
        assert_eq!(err.code(), "PAY_INVALID_REFUND_AMOUNT");
        assert_eq!(err.kind(), ErrorKind::Validation);

        let gateway = PaymentError::Gateway {
            message: "connection refused".to_string(),
        };
        assert_eq!(gateway.kind(), ErrorKind::DependencyUnavailable);
    }
}
