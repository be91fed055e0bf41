//! Saga error types.

use common::{BusinessId, CodedError, CustomerId, ErrorKind};
use inventory::InventoryError;
use orders::OrderError;
use payments::PaymentError;
use thiserror::Error;

use crate::clients::validation::ValidationError;
use crate::request::FieldError;

/// Errors surfacing from saga orchestration.
///
/// Service errors pass through unchanged so their codes and kinds survive
/// to the HTTP layer.
#[derive(Debug, Clone, Error)]
pub enum SagaError {
    /// One or more request fields failed validation.
    #[error("Invalid request: {} field error(s)", errors.len())]
    InvalidRequest { errors: Vec<FieldError> },

    /// The customer does not exist or is not active.
    #[error("Customer {customer_id} rejected: {reason}")]
    CustomerRejected {
        customer_id: CustomerId,
        reason: &'static str,
    },

    /// The business does not exist or is not active.
    #[error("Business {business_id} rejected: {reason}")]
    BusinessRejected {
        business_id: BusinessId,
        reason: &'static str,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Payment(#[from] PaymentError),
}

impl CodedError for SagaError {
    fn code(&self) -> &'static str {
        match self {
            SagaError::InvalidRequest { .. } => "SAGA_INVALID_REQUEST",
            SagaError::CustomerRejected { .. } => "SAGA_CUSTOMER_REJECTED",
            SagaError::BusinessRejected { .. } => "SAGA_BUSINESS_REJECTED",
            SagaError::Validation(err) => err.code(),
            SagaError::Inventory(err) => err.code(),
            SagaError::Order(err) => err.code(),
            SagaError::Payment(err) => err.code(),
        }
    }

    fn kind(&self) -> ErrorKind {
        match self {
            SagaError::InvalidRequest { .. }
            | SagaError::CustomerRejected { .. }
            | SagaError::BusinessRejected { .. } => ErrorKind::Validation,
            SagaError::Validation(err) => err.kind(),
            SagaError::Inventory(err) => err.kind(),
            SagaError::Order(err) => err.kind(),
            SagaError::Payment(err) => err.kind(),
        }
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
