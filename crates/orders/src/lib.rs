//! Order aggregate and state machine for the order-fulfillment backend.
//!
//! Owns the order-status and payment-status fields on the order aggregate.
//! All status mutations flow through [`OrderStateMachine::transition`],
//! which enforces the adjacency tables, the joint status constraint, and
//! the optimistic version check. No other code path writes status fields.

pub mod error;
pub mod machine;
pub mod order;
pub mod status;

pub use error::OrderError;
pub use machine::{OrderStateMachine, TransitionRequest};
pub use order::{Order, OrderItem};
pub use status::{OrderStatus, PaymentStatus};
