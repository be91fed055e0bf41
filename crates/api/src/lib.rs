//! HTTP API server with observability for the order-fulfillment backend.
//!
//! Exposes order placement, status updates, cancellation, the payment
//! webhook, refunds, and product stock administration, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use chrono::Utc;
use inventory::{InMemoryInventoryLedger, InventoryLedger};
use metrics_exporter_prometheus::PrometheusHandle;
use orders::OrderStateMachine;
use payments::{InMemoryPaymentGateway, PaymentAdapter};
use saga::{
    HttpValidationGateway, InMemoryValidationGateway, Orchestrator, ReqwestTransport, RetryPolicy,
    ValidationGateway,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<V: ValidationGateway + 'static>(
    state: Arc<AppState<V>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<V>))
        .route("/orders/{id}", get(routes::orders::get::<V>))
        .route("/orders/{id}/status", patch(routes::orders::update_status::<V>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<V>))
        .route("/payments/webhook", post(routes::payments::webhook::<V>))
        .route("/payments/{id}/refund", post(routes::payments::refund::<V>))
        .route("/products", post(routes::products::register::<V>))
        .route(
            "/products/{id}/availability",
            get(routes::products::availability::<V>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the production application state: HTTP validation against the
/// configured upstream services, in-memory stores behind the service
/// traits.
pub fn create_default_state(
    config: &Config,
) -> Result<Arc<AppState<HttpValidationGateway<ReqwestTransport>>>, saga::TransportError> {
    let transport = ReqwestTransport::new(
        config.validation_timeout,
        config.validation_auth_token.clone(),
    )?;
    let retry = RetryPolicy {
        max_retries: config.validation_max_retries,
        ..RetryPolicy::default()
    };
    let validation = HttpValidationGateway::new(
        transport,
        config.customer_service_url.clone(),
        config.business_service_url.clone(),
        retry,
    );
    let ledger =
        InMemoryInventoryLedger::with_ttl(chrono::Duration::minutes(config.reservation_ttl_minutes));

    Ok(Arc::new(AppState {
        orchestrator: Orchestrator::new(
            validation,
            ledger,
            OrderStateMachine::new(),
            PaymentAdapter::new(InMemoryPaymentGateway::new()),
        ),
    }))
}

/// Creates fully in-memory application state for tests and local runs,
/// returning the fakes so callers can seed and steer them.
pub fn create_in_memory_state() -> (
    Arc<AppState<InMemoryValidationGateway>>,
    InMemoryValidationGateway,
    InMemoryInventoryLedger,
    InMemoryPaymentGateway,
) {
    let validation = InMemoryValidationGateway::new();
    let ledger = InMemoryInventoryLedger::new();
    let gateway = InMemoryPaymentGateway::new();

    let state = Arc::new(AppState {
        orchestrator: Orchestrator::new(
            validation.clone(),
            ledger.clone(),
            OrderStateMachine::new(),
            PaymentAdapter::new(gateway.clone()),
        ),
    });

    (state, validation, ledger, gateway)
}

/// Spawns the background task that returns expired stock holds.
pub fn spawn_expiry_sweep<V: ValidationGateway + 'static>(
    state: Arc<AppState<V>>,
    interval: std::time::Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match state.orchestrator.ledger().release_expired(Utc::now()).await {
                Ok(0) => {}
                Ok(released) => {
                    metrics::counter!("reservations_expired_total").increment(released as u64);
                    tracing::info!(released, "expiry sweep released reservations");
                }
                Err(err) => tracing::error!(error = %err, "expiry sweep failed"),
            }
        }
    })
}
