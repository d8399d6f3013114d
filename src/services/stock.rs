use crate::domain::product::Product;
use crate::error::ValidationError;

/// Compares a requested quantity against the product's current stock.
///
/// Nothing is reserved or decremented. Two callers can both pass the check
/// for the last unit in stock.
#[derive(Debug, Clone, Copy, Default)]
pub struct StockGuard;

impl StockGuard {
    pub fn check(product: &Product, requested: i32) -> Result<(), ValidationError> {
        if product.has_stock(requested) {
            return Ok(());
        }

        Err(ValidationError::InsufficientStock {
            product_id: product.id,
            name: product.name.clone(),
            requested,
            available: product.stock,
        })
    }
}
