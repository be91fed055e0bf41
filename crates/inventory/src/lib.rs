//! Inventory ledger for the order-fulfillment backend.
//!
//! Tracks available quantity per product and exposes atomic
//! reserve/commit/release operations. Reservations carry a TTL so stock
//! held by abandoned orders is eventually returned by a background sweep.

pub mod error;
pub mod ledger;
pub mod reservation;

pub use error::InventoryError;
pub use ledger::{InMemoryInventoryLedger, InventoryLedger};
pub use reservation::{Reservation, ReservationState};
