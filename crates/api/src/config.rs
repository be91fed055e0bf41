//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `CUSTOMER_SERVICE_URL` — customer validation base URL
/// - `BUSINESS_SERVICE_URL` — business validation base URL
/// - `VALIDATION_TIMEOUT_SECS` — per-request deadline for validation calls
/// - `VALIDATION_MAX_RETRIES` — retry budget for validation calls
/// - `VALIDATION_AUTH_TOKEN` — bearer token forwarded to the validation services
/// - `RESERVATION_TTL_MINUTES` — how long a stock hold survives unconfirmed
/// - `SWEEP_INTERVAL_SECS` — how often the expiry sweep runs
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub customer_service_url: String,
    pub business_service_url: String,
    pub validation_timeout: Duration,
    pub validation_max_retries: u32,
    pub validation_auth_token: Option<String>,
    pub reservation_ttl_minutes: i64,
    pub sweep_interval: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            customer_service_url: std::env::var("CUSTOMER_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),
            business_service_url: std::env::var("BUSINESS_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:3002".to_string()),
            validation_timeout: Duration::from_secs(
                std::env::var("VALIDATION_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            ),
            validation_max_retries: std::env::var("VALIDATION_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            validation_auth_token: std::env::var("VALIDATION_AUTH_TOKEN").ok(),
            reservation_ttl_minutes: std::env::var("RESERVATION_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            sweep_interval: Duration::from_secs(
                std::env::var("SWEEP_INTERVAL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60),
            ),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            customer_service_url: "http://localhost:3001".to_string(),
            business_service_url: "http://localhost:3002".to_string(),
            validation_timeout: Duration::from_secs(10),
            validation_max_retries: 3,
            validation_auth_token: None,
            reservation_ttl_minutes: 30,
            sweep_interval: Duration::from_secs(60),
        }
    }
}
