//! Order aggregate.

use chrono::{DateTime, Utc};
use common::{BusinessId, CustomerId, Money, OrderId, ProductId, Version};
use serde::{Deserialize, Serialize};

use crate::status::{OrderStatus, PaymentStatus};

/// A line item on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// The product identifier.
    pub product_id: ProductId,

    /// Quantity ordered.
    pub quantity: u32,

    /// Price per unit.
    pub unit_price: Money,
}

impl OrderItem {
    /// Creates a new order item.
    pub fn new(product_id: impl Into<ProductId>, quantity: u32, unit_price: Money) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            unit_price,
        }
    }

    /// Returns the total price for this item (quantity * unit_price).
    pub fn total_price(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// Order aggregate root.
///
/// Status fields are mutated only through
/// [`crate::machine::OrderStateMachine::transition`]; orders are never
/// deleted — terminal states are retained for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    pub id: OrderId,

    /// Human-readable order number, unique across all orders.
    pub order_number: String,

    /// Customer who placed the order.
    pub customer_id: CustomerId,

    /// Business fulfilling the order.
    pub business_id: BusinessId,

    /// Ordered line items.
    pub items: Vec<OrderItem>,

    /// Total amount across all line items.
    pub total_amount: Money,

    /// Current order status.
    pub status: OrderStatus,

    /// Current payment status.
    pub payment_status: PaymentStatus,

    /// Explicit integer version for optimistic concurrency.
    pub version: Version,

    /// When the order was created.
    pub created_at: DateTime<Utc>,

    /// When the order was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new order in `Created`/payment `Pending`.
    pub fn new(customer_id: CustomerId, business_id: BusinessId, items: Vec<OrderItem>) -> Self {
        let id = OrderId::new();
        let total_amount = items
            .iter()
            .fold(Money::zero(), |acc, item| acc + item.total_price());
        let now = Utc::now();

        Self {
            id,
            order_number: generate_order_number(id),
            customer_id,
            business_id,
            items,
            total_amount,
            status: OrderStatus::Created,
            payment_status: PaymentStatus::Pending,
            version: Version::first(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if the order is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Derives the human-readable order number from the order id.
fn generate_order_number(id: OrderId) -> String {
    let uuid = id.as_uuid().simple().to_string();
    format!("ORD-{}", &uuid[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_order() -> Order {
        Order::new(
            CustomerId::new(),
            BusinessId::new(),
            vec![
                OrderItem::new("SKU-001", 2, Money::from_cents(1000)),
                OrderItem::new("SKU-002", 1, Money::from_cents(2500)),
            ],
        )
    }

    #[test]
    fn test_new_order_defaults() {
        let order = make_order();
        assert_eq!(order.status, OrderStatus::Created);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.version, Version::first());
        assert!(!order.is_terminal());
    }

    #[test]
    fn test_total_amount() {
        let order = make_order();
        assert_eq!(order.total_amount.cents(), 4500);
    }

    #[test]
    fn test_order_number_format() {
        let order = make_order();
        assert!(order.order_number.starts_with("ORD-"));
        assert_eq!(order.order_number.len(), 12);
    }

    #[test]
    fn test_order_numbers_are_distinct() {
        assert_ne!(make_order().order_number, make_order().order_number);
    }

    #[test]
    fn test_item_total_price() {
        let item = OrderItem::new("SKU-001", 3, Money::from_cents(1000));
        assert_eq!(item.total_price().cents(), 3000);
    }

    #[test]
    fn test_serialization() {
        let order = make_order();
        let json = serde_json::to_string(&order).unwrap();
        let deserialized: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.id, order.id);
        assert_eq!(deserialized.order_number, order.order_number);
        assert_eq!(deserialized.total_amount, order.total_amount);
    }
}
