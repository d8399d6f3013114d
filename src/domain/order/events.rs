use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::aggregate::Order;
use super::value_objects::{OrderItem, OrderStatus};

// ============================================================================
// Order Events
// ============================================================================
//
// Wire shape of `order.created`:
//   {"id", "user_id", "total", "status", "items": [{"id", "product_id", "quantity", "price"}]}
// Money is rendered as JSON numbers.
//
// ============================================================================

pub trait DomainEvent {
    fn topic(&self) -> &'static str;
    fn key(&self) -> String;
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderCreated {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub status: OrderStatus,
    pub items: Vec<OrderItemSnapshot>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderItemSnapshot {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

impl OrderCreated {
    pub const TOPIC: &'static str = "order.created";
}

impl DomainEvent for OrderCreated {
    fn topic(&self) -> &'static str {
        Self::TOPIC
    }

    fn key(&self) -> String {
        self.id.to_string()
    }
}

impl From<&OrderItem> for OrderItemSnapshot {
    fn from(item: &OrderItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            quantity: item.quantity,
            price: item.price,
        }
    }
}

impl From<&Order> for OrderCreated {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            total: order.total,
            status: order.status,
            items: order.items.iter().map(OrderItemSnapshot::from).collect(),
        }
    }
}
