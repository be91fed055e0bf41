//! Order placement saga for the order-fulfillment backend.
//!
//! The orchestrator owns the cross-service flow: validate the customer
//! and business, reserve stock, create the order, initiate payment, then
//! settle on the gateway callback. Every forward step has a compensating
//! action, so a failure at any point leaves no stock held and no order
//! half-placed.

pub mod clients;
pub mod error;
pub mod instance;
pub mod order_flow;
pub mod orchestrator;
pub mod request;
pub mod retry;
pub mod state;

pub use clients::http::HttpValidationGateway;
pub use clients::transport::{ReqwestTransport, Transport, TransportError, TransportResponse};
pub use clients::validation::{
    BusinessValidation, CustomerValidation, InMemoryValidationGateway, ValidationError,
    ValidationGateway,
};
pub use error::SagaError;
pub use instance::SagaInstance;
pub use orchestrator::{Orchestrator, PlacedOrder, ReconcileOutcome};
pub use request::{FieldError, PlaceOrderItem, PlaceOrderRequest};
pub use retry::RetryPolicy;
pub use state::SagaState;
