//! Order placement request and field validation.

use common::{BusinessId, CustomerId, Money, ProductId};
use orders::OrderItem;
use payments::PaymentMethod;
use serde::{Deserialize, Serialize};

/// One requested order line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

/// Request to place an order end to end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub customer_id: CustomerId,
    pub business_id: BusinessId,
    pub items: Vec<PlaceOrderItem>,
    pub currency: String,
    pub method: PaymentMethod,
}

/// One rejected field with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl PlaceOrderRequest {
    /// Checks every field and collects all violations, not just the first.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.items.is_empty() {
            errors.push(FieldError::new("items", "order must have at least one item"));
        }
        for (index, item) in self.items.iter().enumerate() {
            if item.product_id.as_str().is_empty() {
                errors.push(FieldError::new(
                    format!("items[{index}].product_id"),
                    "product id must not be empty",
                ));
            }
            if item.quantity == 0 {
                errors.push(FieldError::new(
                    format!("items[{index}].quantity"),
                    "quantity must be positive",
                ));
            }
            if item.unit_price_cents <= 0 {
                errors.push(FieldError::new(
                    format!("items[{index}].unit_price_cents"),
                    "unit price must be positive",
                ));
            }
        }

        if self.currency.len() != 3 || !self.currency.bytes().all(|b| b.is_ascii_uppercase()) {
            errors.push(FieldError::new(
                "currency",
                "currency must be a 3-letter uppercase code",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Converts the request lines into order items.
    pub fn order_items(&self) -> Vec<OrderItem> {
        self.items
            .iter()
            .map(|item| {
                OrderItem::new(
                    item.product_id.clone(),
                    item.quantity,
                    Money::from_cents(item.unit_price_cents),
                )
            })
            .collect()
    }
}
