//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::{CodedError, ErrorKind};
use inventory::InventoryError;
use orders::OrderError;
use payments::PaymentError;
use saga::SagaError;

/// API-level error type that maps to HTTP responses.
///
/// Service errors keep their stable code; the HTTP status is derived from
/// the taxonomy kind, so new variants map correctly without touching this
/// file.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Option<serde_json::Value>,
}

impl ApiError {
    /// Resource not found.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: "NOT_FOUND",
            message: message.into(),
            details: None,
        }
    }

    /// Bad request from the client.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "BAD_REQUEST",
            message: message.into(),
            details: None,
        }
    }

    fn from_coded<E: CodedError + std::fmt::Display>(err: &E) -> Self {
        let status = match err.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Validation | ErrorKind::InvalidTransition => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::DependencyUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            code: err.code(),
            message: err.to_string(),
            details: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = self.code, error = %self.message, "request failed");
        }

        let mut body = serde_json::json!({
            "code": self.code,
            "error": self.message,
        });
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (self.status, axum::Json(body)).into_response()
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        let mut api = ApiError::from_coded(&err);
        // Field violations are machine-readable, not just prose.
        if let SagaError::InvalidRequest { errors } = &err {
            api.details = serde_json::to_value(errors).ok();
        }
        api
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError::from_coded(&err)
    }
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        ApiError::from_coded(&err)
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        ApiError::from_coded(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::OrderId;

    #[test]
    fn test_kind_to_status_mapping() {
        let not_found = ApiError::from(OrderError::OrderNotFound {
            order_id: OrderId::new(),
        });
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);
        assert_eq!(not_found.code, "ORD_NOT_FOUND");

        let unavailable = ApiError::from(PaymentError::Gateway {
            message: "down".to_string(),
        });
        assert_eq!(unavailable.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_invalid_request_carries_field_details() {
        let err = SagaError::InvalidRequest {
            errors: vec![saga::FieldError {
                field: "items".to_string(),
                message: "order must have at least one item".to_string(),
            }],
        };
        let api = ApiError::from(err);
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert!(api.details.is_some());
    }
}
