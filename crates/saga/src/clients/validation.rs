//! Customer and business validation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{BusinessId, CodedError, CustomerId, ErrorKind};
use thiserror::Error;

/// Failures reaching the validation services.
///
/// A verdict about the entity itself (missing, inactive) is not an error
/// here; those come back inside the validation structs.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    /// The remote service rejected the request outright (4xx other
    /// than not-found). Never retried.
    #[error("{service} service rejected the request: {message}")]
    Rejected { service: &'static str, message: String },

    /// The remote service stayed unreachable or kept failing after the
    /// retry budget was spent.
    #[error("{service} service unavailable: {message}")]
    Unavailable { service: &'static str, message: String },
}

impl CodedError for ValidationError {
    fn code(&self) -> &'static str {
        match self {
            ValidationError::Rejected { .. } => "VAL_REJECTED",
            ValidationError::Unavailable { .. } => "VAL_UNAVAILABLE",
        }
    }

    fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::Rejected { .. } => ErrorKind::Validation,
            ValidationError::Unavailable { .. } => ErrorKind::DependencyUnavailable,
        }
    }
}

/// Verdict about a customer.
#[derive(Debug, Clone)]
pub struct CustomerValidation {
    pub exists: bool,
    pub active: bool,
    /// Role as reported by the customer service, when it reports one.
    pub role: Option<String>,
}

/// Verdict about a business.
#[derive(Debug, Clone, Copy)]
pub struct BusinessValidation {
    pub exists: bool,
    pub active: bool,
    pub verified: bool,
    pub can_create_products: bool,
}

/// Trait for the upstream customer and business services.
#[async_trait]
pub trait ValidationGateway: Send + Sync {
    /// Checks that a customer exists and is active.
    async fn validate_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<CustomerValidation, ValidationError>;

    /// Checks that a business exists and is active.
    async fn validate_business(
        &self,
        business_id: BusinessId,
    ) -> Result<BusinessValidation, ValidationError>;
}

#[derive(Debug, Clone)]
struct CustomerRecord {
    active: bool,
    role: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct BusinessRecord {
    active: bool,
    verified: bool,
    can_create_products: bool,
}

#[derive(Debug, Default)]
struct InMemoryValidationState {
    customers: HashMap<CustomerId, CustomerRecord>,
    businesses: HashMap<BusinessId, BusinessRecord>,
    customer_service_down: bool,
    business_service_down: bool,
}

/// In-memory validation gateway for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryValidationGateway {
    state: Arc<RwLock<InMemoryValidationState>>,
}

impl InMemoryValidationGateway {
    /// Creates an empty gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a customer with the given active flag and the default
    /// customer role.
    pub fn register_customer(&self, customer_id: CustomerId, active: bool) {
        self.register_customer_with_role(customer_id, active, "customer");
    }

    /// Registers a customer with an explicit role.
    pub fn register_customer_with_role(
        &self,
        customer_id: CustomerId,
        active: bool,
        role: impl Into<String>,
    ) {
        self.state.write().unwrap().customers.insert(
            customer_id,
            CustomerRecord {
                active,
                role: Some(role.into()),
            },
        );
    }

    /// Registers an active, verified business able to sell.
    pub fn register_business(&self, business_id: BusinessId, active: bool) {
        self.register_business_with(business_id, active, true, true);
    }

    /// Registers a business with explicit verification flags.
    pub fn register_business_with(
        &self,
        business_id: BusinessId,
        active: bool,
        verified: bool,
        can_create_products: bool,
    ) {
        self.state.write().unwrap().businesses.insert(
            business_id,
            BusinessRecord {
                active,
                verified,
                can_create_products,
            },
        );
    }

    /// Simulates the customer service being unreachable.
    pub fn set_customer_service_down(&self, down: bool) {
        self.state.write().unwrap().customer_service_down = down;
    }

    /// Simulates the business service being unreachable.
    pub fn set_business_service_down(&self, down: bool) {
        self.state.write().unwrap().business_service_down = down;
    }
}

#[async_trait]
impl ValidationGateway for InMemoryValidationGateway {
    async fn validate_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<CustomerValidation, ValidationError> {
        let state = self.state.read().unwrap();
        if state.customer_service_down {
            return Err(ValidationError::Unavailable {
                service: "customer",
                message: "connection refused".to_string(),
            });
        }
        Ok(match state.customers.get(&customer_id) {
            Some(record) => CustomerValidation {
                exists: true,
                active: record.active,
                role: record.role.clone(),
            },
            None => CustomerValidation {
                exists: false,
                active: false,
                role: None,
            },
        })
    }

    async fn validate_business(
        &self,
        business_id: BusinessId,
    ) -> Result<BusinessValidation, ValidationError> {
        let state = self.state.read().unwrap();
        if state.business_service_down {
            return Err(ValidationError::Unavailable {
                service: "business",
                message: "connection refused".to_string(),
            });
        }
        Ok(match state.businesses.get(&business_id) {
            Some(record) => BusinessValidation {
                exists: true,
                active: record.active,
                verified: record.verified,
                can_create_products: record.can_create_products,
            },
            None => BusinessValidation {
                exists: false,
                active: false,
                verified: false,
                can_create_products: false,
            },
        })
    }
}
