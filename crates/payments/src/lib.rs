//! Payment gateway adapter for the order-fulfillment backend.
//!
//! Wraps an external payment processor behind a uniform
//! initiate/confirm/refund capability. Gateway correlation IDs are tracked
//! in an append-only transaction ledger, which doubles as the dedup source
//! for at-least-once confirmation callbacks.

pub mod adapter;
pub mod error;
pub mod gateway;
pub mod payment;
pub mod transaction;

pub use adapter::{
    CallbackOutcome, ConfirmOutcome, GatewayCallback, PaymentAdapter, PaymentHandle, RefundOutcome,
};
pub use error::PaymentError;
pub use gateway::{GatewayOrder, GatewayRefund, InMemoryPaymentGateway, PaymentGateway};
pub use payment::{Payment, PaymentMethod, PaymentState};
pub use transaction::{PaymentTransaction, TransactionOutcome};
