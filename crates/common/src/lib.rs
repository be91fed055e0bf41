//! Shared types for the order-fulfillment backend.
//!
//! Typed identifiers, `Money`, the optimistic-concurrency `Version`
//! counter, and the closed error taxonomy every service maps into.

pub mod error;
pub mod ids;
pub mod money;
pub mod version;

pub use error::{CodedError, ErrorKind};
pub use ids::{BusinessId, CustomerId, OrderId, PaymentId, ProductId, ReservationId};
pub use money::Money;
pub use version::Version;
