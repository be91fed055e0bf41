//! Product stock registration and availability endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::ProductId;
use inventory::InventoryLedger;
use saga::ValidationGateway;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::orders::AppState;

#[derive(Deserialize)]
pub struct RegisterProductRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub product_id: String,
    pub available: u32,
}

/// POST /products — register a product's stock.
#[tracing::instrument(skip(state, req))]
pub async fn register<V: ValidationGateway + 'static>(
    State(state): State<Arc<AppState<V>>>,
    Json(req): Json<RegisterProductRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .orchestrator
        .ledger()
        .register_product(ProductId::new(req.product_id), req.quantity)
        .await?;
    Ok(StatusCode::CREATED)
}

/// GET /products/:id/availability — current uncommitted, unreserved stock.
#[tracing::instrument(skip(state))]
pub async fn availability<V: ValidationGateway + 'static>(
    State(state): State<Arc<AppState<V>>>,
    Path(id): Path<String>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let product_id = ProductId::new(id);
    let available = state.orchestrator.ledger().available(&product_id).await?;
    Ok(Json(AvailabilityResponse {
        product_id: product_id.to_string(),
        available,
    }))
}
