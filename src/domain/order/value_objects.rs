use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::money;
use crate::error::ValidationError;

// ============================================================================
// Order Value Objects
// ============================================================================

/// Frozen copy of a cart line at checkout time.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
}

impl OrderItem {
    pub fn new(product_id: Uuid, quantity: i32, price: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            quantity,
            price,
        }
    }

    pub fn line_total(&self) -> Result<Decimal, ValidationError> {
        money::line_total(self.price, self.quantity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownOrderStatus(s.to_string()))
    }
}

/// Guarded transitions of the order lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    Pay,
    Ship,
    Cancel,
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderAction::Pay => f.write_str("pay"),
            OrderAction::Ship => f.write_str("ship"),
            OrderAction::Cancel => f.write_str("cancel"),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_item_line_total() {
        let item = OrderItem::new(Uuid::new_v4(), 3, Decimal::new(1999, 2));
        assert_eq!(item.line_total(), Ok(Decimal::new(5997, 2)));
    }

    #[test]
    fn test_order_item_line_total_overflow() {
        let item = OrderItem::new(Uuid::new_v4(), 2, Decimal::MAX);
        assert_eq!(item.line_total(), Err(ValidationError::AmountOutOfRange));
    }

    #[test]
    fn test_order_status_wire_names() {
        let json = serde_json::to_string(&OrderStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");

        let parsed: OrderStatus = serde_json::from_str("\"paid\"").unwrap();
        assert_eq!(parsed, OrderStatus::Paid);
    }

    #[test]
    fn test_order_status_from_str() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_order_status_rejected() {
        let result = "refunded".parse::<OrderStatus>();
        assert!(matches!(result, Err(ValidationError::UnknownOrderStatus(s)) if s == "refunded"));
    }
}
