//! Closed error taxonomy shared by every service.
//!
//! Callers switch on [`ErrorKind`], never on concrete error type identity.
//! Each failure also carries a stable machine-readable code, distinct from
//! its human-readable message.

use serde::{Deserialize, Serialize};

/// The kind of a failure, determining how callers react to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// A referenced entity does not exist. Never retried.
    NotFound,

    /// The entity exists but the request violates a business rule
    /// (inactive entity, insufficient stock, bad field). Never retried.
    Validation,

    /// Concurrent-modification or uniqueness conflict. The caller may
    /// retry with refreshed state.
    Conflict,

    /// A remote dependency exhausted its retry budget. State is left
    /// exactly as before the failing step; the whole operation can be
    /// safely retried.
    DependencyUnavailable,

    /// A state-machine transition outside the allowed adjacency table.
    /// Never silently coerced to the nearest valid state.
    InvalidTransition,

    /// Unexpected internal failure.
    Internal,
}

impl ErrorKind {
    /// Returns true if a failure of this kind may be retried by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Conflict | ErrorKind::DependencyUnavailable)
    }

    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Validation => "Validation",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::DependencyUnavailable => "DependencyUnavailable",
            ErrorKind::InvalidTransition => "InvalidTransition",
            ErrorKind::Internal => "Internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait implemented by every service error enum.
///
/// One code per variant, stable across releases.
pub trait CodedError {
    /// Stable machine-readable error code (e.g. `"INV_INSUFFICIENT_STOCK"`).
    fn code(&self) -> &'static str;

    /// The taxonomy kind of this failure.
    fn kind(&self) -> ErrorKind;
}
