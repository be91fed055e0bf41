//! Clients for upstream services.

pub mod http;
pub mod transport;
pub mod validation;
