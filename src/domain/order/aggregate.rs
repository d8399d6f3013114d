use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::{OrderAction, OrderItem, OrderStatus};
use crate::domain::money;
use crate::error::ValidationError;

// ============================================================================
// Order Aggregate - Domain Logic
// ============================================================================
//
// Lifecycle:
//
//   pending -> paid -> shipped -> completed
//      |        |
//      +--------+--> cancelled
//
// Guarded transitions: mark_paid, mark_shipped, cancel.
// Unguarded: mark_completed and the administrative set_status override.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    // Identity
    pub id: Uuid,
    pub user_id: Uuid,

    // Snapshot taken at checkout, never edited afterwards
    pub items: Vec<OrderItem>,
    pub total: Decimal,

    pub status: OrderStatus,

    // Audit Trail
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create a pending order; the total is summed over the items in order.
    ///
    /// Fails when the total would not fit the stored money column.
    pub fn new(user_id: Uuid, items: Vec<OrderItem>) -> Result<Self, ValidationError> {
        let total = money::checked_sum(items.iter().map(OrderItem::line_total))?;
        if !money::is_storable(total) {
            return Err(ValidationError::AmountOutOfRange);
        }
        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            items,
            total,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn can_be_paid(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    pub fn can_be_shipped(&self) -> bool {
        self.status == OrderStatus::Paid
    }

    pub fn can_be_cancelled(&self) -> bool {
        matches!(self.status, OrderStatus::Pending | OrderStatus::Paid)
    }

    pub fn mark_paid(&mut self) -> Result<(), ValidationError> {
        self.guard(self.can_be_paid(), OrderAction::Pay)?;
        self.transition(OrderStatus::Paid);
        Ok(())
    }

    pub fn mark_shipped(&mut self) -> Result<(), ValidationError> {
        self.guard(self.can_be_shipped(), OrderAction::Ship)?;
        self.transition(OrderStatus::Shipped);
        Ok(())
    }

    // No predecessor check: completion is accepted from any status.
    pub fn mark_completed(&mut self) {
        self.transition(OrderStatus::Completed);
    }

    pub fn cancel(&mut self) -> Result<(), ValidationError> {
        self.guard(self.can_be_cancelled(), OrderAction::Cancel)?;
        self.transition(OrderStatus::Cancelled);
        Ok(())
    }

    /// Administrative override. Bypasses every transition guard.
    pub fn set_status(&mut self, status: OrderStatus) {
        self.transition(status);
    }

    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|item| i64::from(item.quantity)).sum()
    }

    fn guard(&self, allowed: bool, action: OrderAction) -> Result<(), ValidationError> {
        if allowed {
            Ok(())
        } else {
            Err(ValidationError::InvalidOrderState {
                current: self.status,
                action,
            })
        }
    }

    fn transition(&mut self, status: OrderStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
