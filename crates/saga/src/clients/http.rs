//! HTTP validation gateway with bounded retry.

use async_trait::async_trait;
use common::{BusinessId, CustomerId};

use crate::clients::transport::{Transport, TransportResponse};
use crate::clients::validation::{
    BusinessValidation, CustomerValidation, ValidationError, ValidationGateway,
};
use crate::retry::RetryPolicy;

/// Validation gateway backed by the customer and business HTTP services.
///
/// Timeouts, connect errors and 5xx responses consume the retry budget;
/// a 404 is a definitive "does not exist" verdict and any other 4xx is a
/// definitive rejection, neither of which is ever retried.
#[derive(Debug, Clone)]
pub struct HttpValidationGateway<T: Transport> {
    transport: T,
    customer_base_url: String,
    business_base_url: String,
    retry: RetryPolicy,
}

/// Verdict distilled from one upstream response. `details` keeps the
/// response body so each endpoint can read its service-specific flags.
struct EntityVerdict {
    exists: bool,
    active: bool,
    details: serde_json::Value,
}

impl<T: Transport> HttpValidationGateway<T> {
    /// Creates a gateway over the given transport and service base URLs.
    pub fn new(
        transport: T,
        customer_base_url: impl Into<String>,
        business_base_url: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            customer_base_url: customer_base_url.into(),
            business_base_url: business_base_url.into(),
            retry,
        }
    }

    async fn fetch_with_retry(
        &self,
        service: &'static str,
        url: &str,
    ) -> Result<EntityVerdict, ValidationError> {
        let mut last_failure = String::new();

        for attempt in 0..self.retry.max_attempts() {
            if attempt > 0 {
                tokio::time::sleep(self.retry.backoff_for(attempt - 1)).await;
                metrics::counter!("validation_retries_total").increment(1);
            }

            match self.transport.get_json(url).await {
                Ok(response) if response.is_server_error() => {
                    last_failure = format!("upstream returned {}", response.status);
                    tracing::warn!(service, attempt, status = response.status, "validation call failed");
                }
                Ok(response) => return Ok(Self::interpret(service, response)?),
                // Both transport variants are retryable.
                Err(err) => {
                    last_failure = err.to_string();
                    tracing::warn!(service, attempt, error = %err, "validation call failed");
                }
            }
        }

        metrics::counter!("validation_unavailable_total").increment(1);
        Err(ValidationError::Unavailable {
            service,
            message: last_failure,
        })
    }

    fn interpret(
        service: &'static str,
        response: TransportResponse,
    ) -> Result<EntityVerdict, ValidationError> {
        match response.status {
            404 => Ok(EntityVerdict {
                exists: false,
                active: false,
                details: serde_json::Value::Null,
            }),
            status if (400..500).contains(&status) => Err(ValidationError::Rejected {
                service,
                message: format!("upstream returned {status}"),
            }),
            _ => {
                let active = response
                    .body
                    .get("active")
                    .and_then(serde_json::Value::as_bool)
                    .unwrap_or(false);
                Ok(EntityVerdict {
                    exists: true,
                    active,
                    details: response.body,
                })
            }
        }
    }
}

#[async_trait]
impl<T: Transport> ValidationGateway for HttpValidationGateway<T> {
    #[tracing::instrument(skip(self))]
    async fn validate_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<CustomerValidation, ValidationError> {
        let url = format!("{}/customers/{}", self.customer_base_url, customer_id);
        let verdict = self.fetch_with_retry("customer", &url).await?;
        let role = verdict
            .details
            .get("role")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);
        Ok(CustomerValidation {
            exists: verdict.exists,
            active: verdict.active,
            role,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn validate_business(
        &self,
        business_id: BusinessId,
    ) -> Result<BusinessValidation, ValidationError> {
        let url = format!("{}/businesses/{}", self.business_base_url, business_id);
        let verdict = self.fetch_with_retry("business", &url).await?;
        let flag = |name: &str| {
            verdict
                .details
                .get(name)
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(false)
        };
        Ok(BusinessValidation {
            exists: verdict.exists,
            active: verdict.active,
            verified: flag("verified"),
            can_create_products: flag("can_create_products"),
        })
    }
}
