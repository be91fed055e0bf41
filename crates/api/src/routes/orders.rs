//! Order placement, lookup, status update and cancellation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{OrderId, Version};
use inventory::InMemoryInventoryLedger;
use orders::{Order, OrderStatus, PaymentStatus, TransitionRequest};
use payments::InMemoryPaymentGateway;
use saga::{Orchestrator, PlaceOrderRequest, ValidationGateway};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<V: ValidationGateway> {
    pub orchestrator: Orchestrator<V, InMemoryInventoryLedger, InMemoryPaymentGateway>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub order_status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    /// The version the caller last read.
    pub version: i64,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub order_number: String,
    pub customer_id: String,
    pub business_id: String,
    pub status: String,
    pub payment_status: String,
    pub version: i64,
    pub items: Vec<OrderItemResponse>,
    pub total_cents: i64,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let items = order
            .items
            .iter()
            .map(|item| OrderItemResponse {
                product_id: item.product_id.to_string(),
                quantity: item.quantity,
                unit_price_cents: item.unit_price.cents(),
            })
            .collect();
        Self {
            id: order.id.to_string(),
            order_number: order.order_number,
            customer_id: order.customer_id.to_string(),
            business_id: order.business_id.to_string(),
            status: order.status.to_string(),
            payment_status: order.payment_status.to_string(),
            version: order.version.as_i64(),
            items,
            total_cents: order.total_amount.cents(),
        }
    }
}

#[derive(Serialize)]
pub struct PlacedOrderResponse {
    pub order: OrderResponse,
    pub payment_reference: String,
    pub gateway_order_id: String,
}

// -- Handlers --

/// POST /orders — place an order end to end.
#[tracing::instrument(skip(state, req))]
pub async fn create<V: ValidationGateway + 'static>(
    State(state): State<Arc<AppState<V>>>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<PlacedOrderResponse>), ApiError> {
    let placed = state.orchestrator.place_order(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(PlacedOrderResponse {
            order: placed.order.into(),
            payment_reference: placed.payment.payment_reference,
            gateway_order_id: placed.payment.gateway_order_id,
        }),
    ))
}

/// GET /orders/:id — load an order by ID.
#[tracing::instrument(skip(state))]
pub async fn get<V: ValidationGateway + 'static>(
    State(state): State<Arc<AppState<V>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.orchestrator.orders().get(order_id).await?;
    Ok(Json(order.into()))
}

/// PATCH /orders/:id/status — apply a status transition under the
/// caller's version. Re-applying the current statuses is acknowledged
/// without a version bump.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<V: ValidationGateway + 'static>(
    State(state): State<Arc<AppState<V>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;

    let order = state
        .orchestrator
        .orders()
        .transition(
            order_id,
            TransitionRequest {
                order_status: req.order_status,
                payment_status: req.payment_status,
                expected_version: Version::new(req.version),
            },
        )
        .await?;

    Ok(Json(order.into()))
}

/// POST /orders/:id/cancel — cancel an order with full compensation.
/// The body may carry a reason; it is recorded against the payment
/// reversal.
#[tracing::instrument(skip(state, req))]
pub async fn cancel<V: ValidationGateway + 'static>(
    State(state): State<Arc<AppState<V>>>,
    Path(id): Path<String>,
    req: Option<Json<CancelRequest>>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let reason = req
        .and_then(|Json(body)| body.reason)
        .unwrap_or_else(|| "cancelled by caller".to_string());
    let order = state.orchestrator.cancel_order(order_id, &reason).await?;
    Ok(Json(order.into()))
}

pub(crate) fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::bad_request(format!("Invalid order ID: {e}")))?;
    Ok(OrderId::from(uuid))
}
