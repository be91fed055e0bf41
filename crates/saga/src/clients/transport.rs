//! HTTP transport behind the validation clients.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Transport-level failures, all retryable.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The request exceeded its deadline.
    #[error("request timed out")]
    Timeout,

    /// The connection could not be established or broke mid-request.
    #[error("connection error: {0}")]
    Connect(String),
}

/// An HTTP response reduced to what the clients need.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,

    /// Response body as JSON, `Null` when absent or unparseable.
    pub body: serde_json::Value,
}

impl TransportResponse {
    /// Returns true for 5xx statuses, which are retried like transport
    /// failures.
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

/// Minimal GET-a-resource transport, mockable in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues a GET and returns status plus JSON body.
    async fn get_json(&self, url: &str) -> Result<TransportResponse, TransportError>;
}

/// Production transport over a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    auth_token: Option<String>,
}

impl ReqwestTransport {
    /// Builds a transport with the given per-request deadline. A token,
    /// when configured, is forwarded as a bearer credential on every call.
    pub fn new(request_timeout: Duration, auth_token: Option<String>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(request_timeout)
            .build()
            .map_err(|err| TransportError::Connect(err.to_string()))?;
        Ok(Self { client, auth_token })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get_json(&self, url: &str) -> Result<TransportResponse, TransportError> {
        let mut request = self.client.get(url);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Connect(err.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .json::<serde_json::Value>()
            .await
            .unwrap_or(serde_json::Value::Null);

        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_detection() {
        let ok = TransportResponse {
            status: 200,
            body: serde_json::Value::Null,
        };
        let unavailable = TransportResponse {
            status: 503,
            body: serde_json::Value::Null,
        };
        assert!(!ok.is_server_error());
        assert!(unavailable.is_server_error());
    }
}
