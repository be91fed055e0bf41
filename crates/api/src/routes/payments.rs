//! Payment webhook and refund endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{Money, PaymentId};
use payments::GatewayCallback;
use saga::{ReconcileOutcome, ValidationGateway};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::orders::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct RefundRequest {
    /// Amount to refund; omitted means the full remaining balance.
    pub amount_cents: Option<i64>,
    pub reason: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct WebhookResponse {
    pub order_id: String,
    pub acknowledged: bool,
    /// True when this delivery was a replay and changed nothing.
    pub duplicate: bool,
}

#[derive(Serialize)]
pub struct RefundResponse {
    pub payment_id: String,
    pub refunded_cents: i64,
    pub remaining_refundable_cents: i64,
    pub gateway_transaction_id: String,
}

// -- Handlers --

/// POST /payments/webhook — gateway confirmation callback.
///
/// Always returns 200 for replays so the gateway stops redelivering.
#[tracing::instrument(skip(state, callback))]
pub async fn webhook<V: ValidationGateway + 'static>(
    State(state): State<Arc<AppState<V>>>,
    Json(callback): Json<GatewayCallback>,
) -> Result<Json<WebhookResponse>, ApiError> {
    let outcome = state.orchestrator.reconcile(callback).await?;

    let response = match outcome {
        ReconcileOutcome::Applied { order, .. } => WebhookResponse {
            order_id: order.id.to_string(),
            acknowledged: true,
            duplicate: false,
        },
        ReconcileOutcome::Duplicate { order_id } => WebhookResponse {
            order_id: order_id.to_string(),
            acknowledged: true,
            duplicate: true,
        },
    };
    Ok(Json(response))
}

/// POST /payments/:id/refund — refund a captured payment, fully or in
/// part.
#[tracing::instrument(skip(state, req))]
pub async fn refund<V: ValidationGateway + 'static>(
    State(state): State<Arc<AppState<V>>>,
    Path(id): Path<String>,
    Json(req): Json<RefundRequest>,
) -> Result<Json<RefundResponse>, ApiError> {
    let payment_id = parse_payment_id(&id)?;
    let amount = req.amount_cents.map(Money::from_cents);
    let reason = req.reason.as_deref().unwrap_or("requested via api");

    let outcome = state
        .orchestrator
        .payments()
        .refund(payment_id, amount, reason)
        .await?;

    Ok(Json(RefundResponse {
        payment_id: outcome.payment_id.to_string(),
        refunded_cents: outcome.amount.cents(),
        remaining_refundable_cents: outcome.remaining_refundable.cents(),
        gateway_transaction_id: outcome.gateway_transaction_id,
    }))
}

fn parse_payment_id(id: &str) -> Result<PaymentId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::bad_request(format!("Invalid payment ID: {e}")))?;
    Ok(PaymentId::from(uuid))
}
