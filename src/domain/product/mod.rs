use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::money;
use crate::error::ValidationError;

// ============================================================================
// Product - catalog entity
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        price: Decimal,
        stock: i32,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        validate_name(&name)?;
        validate_price(price)?;
        validate_stock(stock)?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            description,
            price,
            stock,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn has_stock(&self, quantity: i32) -> bool {
        self.stock >= quantity
    }

    pub fn add_stock(&mut self, quantity: i32) -> Result<(), ValidationError> {
        if quantity <= 0 {
            return Err(ValidationError::InvalidQuantity(quantity));
        }
        self.stock = self.stock.saturating_add(quantity);
        self.updated_at = Utc::now();
        Ok(())
    }
}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::InvalidName);
    }
    Ok(())
}

pub fn validate_price(price: Decimal) -> Result<(), ValidationError> {
    if price <= Decimal::ZERO || !money::is_storable(price) {
        return Err(ValidationError::InvalidPrice);
    }
    Ok(())
}

pub fn validate_stock(stock: i32) -> Result<(), ValidationError> {
    if stock < 0 {
        return Err(ValidationError::InvalidStock(stock));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_product_validates_fields() {
        assert!(Product::new("Tea", None, Decimal::new(450, 2), 10).is_ok());
        assert_eq!(
            Product::new("  ", None, Decimal::ONE, 1).unwrap_err(),
            ValidationError::InvalidName
        );
        assert_eq!(
            Product::new("Tea", None, Decimal::ZERO, 1).unwrap_err(),
            ValidationError::InvalidPrice
        );
        assert_eq!(
            Product::new("Tea", None, Decimal::ONE, -1).unwrap_err(),
            ValidationError::InvalidStock(-1)
        );
    }

    #[test]
    fn test_price_must_fit_money_column() {
        assert!(validate_price(Decimal::new(9_999_999_999, 2)).is_ok());
        assert_eq!(validate_price(Decimal::new(1999, 3)), Err(ValidationError::InvalidPrice));
        assert_eq!(validate_price(Decimal::new(100_000_000, 0)), Err(ValidationError::InvalidPrice));
        assert_eq!(
            Product::new("Tea", None, Decimal::MAX, 1).unwrap_err(),
            ValidationError::InvalidPrice
        );
    }

    #[test]
    fn test_has_stock_boundary() {
        let product = Product::new("Tea", None, Decimal::ONE, 3).unwrap();
        assert!(product.has_stock(3));
        assert!(!product.has_stock(4));
    }

    #[test]
    fn test_add_stock() {
        let mut product = Product::new("Tea", None, Decimal::ONE, 3).unwrap();
        product.add_stock(2).unwrap();
        assert_eq!(product.stock, 5);
        assert_eq!(product.add_stock(0), Err(ValidationError::InvalidQuantity(0)));
    }
}
