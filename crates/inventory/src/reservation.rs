//! Inventory reservations.

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, ReservationId};
use serde::{Deserialize, Serialize};

/// The state of a reservation in its lifecycle.
///
/// State transitions:
/// ```text
/// Reserved ──┬──► Committed   (payment succeeded)
///            └──► Released    (cancelled, payment failed, or expired)
/// ```
///
/// Both `Committed` and `Released` are terminal. A commit that lands before
/// the expiry sweep wins the race; the sweep skips committed reservations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ReservationState {
    /// Stock is held for an order, awaiting payment resolution.
    #[default]
    Reserved,

    /// The hold was converted to a committed sale (terminal state).
    Committed,

    /// The hold was returned to available stock (terminal state).
    Released,
}

impl ReservationState {
    /// Returns true if the reservation still holds stock.
    pub fn is_active(&self) -> bool {
        matches!(self, ReservationState::Reserved)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReservationState::Committed | ReservationState::Released)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationState::Reserved => "Reserved",
            ReservationState::Committed => "Committed",
            ReservationState::Released => "Released",
        }
    }
}

impl std::fmt::Display for ReservationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A temporary hold on inventory quantity, scoped to one order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    /// Unique reservation identifier.
    pub id: ReservationId,

    /// The order this hold belongs to.
    pub order_id: OrderId,

    /// The product being held.
    pub product_id: ProductId,

    /// Quantity held.
    pub quantity: u32,

    /// Current state of the hold.
    pub state: ReservationState,

    /// When the hold lapses if the order never reaches a terminal
    /// payment state.
    pub expires_at: DateTime<Utc>,
}

impl Reservation {
    /// Returns true if the hold has lapsed at the given instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.state.is_active() && now >= self.expires_at
    }
}
