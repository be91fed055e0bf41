//! Inventory error types.

use common::{CodedError, ErrorKind, ProductId, ReservationId};
use thiserror::Error;

/// Errors that can occur during inventory operations.
#[derive(Debug, Clone, Error)]
pub enum InventoryError {
    /// The product is not known to the ledger.
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: ProductId },

    /// A product with this SKU is already registered.
    #[error("Product already registered: {product_id}")]
    ProductAlreadyRegistered { product_id: ProductId },

    /// Not enough stock to satisfy the reservation. Carries the requested
    /// and available quantities for diagnostics.
    #[error(
        "Insufficient stock for {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// No reservation exists with the given ID.
    #[error("Reservation not found: {reservation_id}")]
    ReservationNotFound { reservation_id: ReservationId },

    /// The reservation was already released (cancelled or expired) and can
    /// no longer be committed.
    #[error("Reservation already released: {reservation_id}")]
    ReservationReleased { reservation_id: ReservationId },
}

impl CodedError for InventoryError {
    fn code(&self) -> &'static str {
        match self {
            InventoryError::ProductNotFound { .. } => "INV_PRODUCT_NOT_FOUND",
            InventoryError::ProductAlreadyRegistered { .. } => "INV_DUPLICATE_PRODUCT",
            InventoryError::InsufficientStock { .. } => "INV_INSUFFICIENT_STOCK",
            InventoryError::ReservationNotFound { .. } => "INV_RESERVATION_NOT_FOUND",
            InventoryError::ReservationReleased { .. } => "INV_RESERVATION_RELEASED",
        }
    }

    fn kind(&self) -> ErrorKind {
        match self {
            InventoryError::ProductNotFound { .. }
            | InventoryError::ReservationNotFound { .. } => ErrorKind::NotFound,
            InventoryError::ProductAlreadyRegistered { .. }
            | InventoryError::ReservationReleased { .. } => ErrorKind::Conflict,
            InventoryError::InsufficientStock { .. } => ErrorKind::Validation,
        }
    }
}

/// Convenience type alias for inventory results.
pub type Result<T> = std::result::Result<T, InventoryError>;
