//! Saga instance bookkeeping.

use chrono::{DateTime, Utc};
use common::{OrderId, PaymentId, ReservationId};
use serde::{Deserialize, Serialize};

use crate::state::SagaState;

/// One run of the order placement saga.
///
/// Records which forward steps completed and which side effects they left
/// behind, so compensation knows exactly what to undo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaInstance {
    /// The order the saga is placing.
    pub order_id: OrderId,

    /// Current lifecycle state.
    pub state: SagaState,

    /// Forward step names, in completion order.
    pub completed_steps: Vec<String>,

    /// Stock holds taken so far, in acquisition order.
    pub reservation_ids: Vec<ReservationId>,

    /// The payment created by the initiate step, if reached.
    pub payment_id: Option<PaymentId>,

    /// Why the saga failed, if it did.
    pub failure_reason: Option<String>,

    /// When the saga started.
    pub started_at: DateTime<Utc>,

    /// When the saga reached a terminal state, if it has.
    pub finished_at: Option<DateTime<Utc>>,
}

impl SagaInstance {
    /// Starts a new saga for an order.
    pub fn new(order_id: OrderId) -> Self {
        Self {
            order_id,
            state: SagaState::Running,
            completed_steps: Vec::new(),
            reservation_ids: Vec::new(),
            payment_id: None,
            failure_reason: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Records a completed forward step.
    pub fn step_completed(&mut self, step: &str) {
        self.completed_steps.push(step.to_string());
    }

    /// Moves the saga to awaiting the gateway callback.
    pub fn await_payment(&mut self) {
        self.state = SagaState::AwaitingPayment;
    }

    /// Marks the saga failed and begins compensation.
    pub fn compensating(&mut self, reason: impl Into<String>) {
        self.state = SagaState::Compensating;
        self.failure_reason = Some(reason.into());
    }

    /// Marks the saga settled (terminal).
    pub fn completed(&mut self) {
        self.state = SagaState::Completed;
        self.finished_at = Some(Utc::now());
    }

    /// Marks compensation finished (terminal).
    pub fn failed(&mut self) {
        self.state = SagaState::Failed;
        self.finished_at = Some(Utc::now());
    }
}
