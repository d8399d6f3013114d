use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::product::{validate_name, validate_price, validate_stock, Product};
use crate::error::ShopResult;
use crate::store::ProductStore;

/// Partial product update; `None` leaves the field as it is.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
}

#[derive(Clone)]
pub struct CatalogService {
    products: Arc<dyn ProductStore>,
}

impl CatalogService {
    pub fn new(products: Arc<dyn ProductStore>) -> Self {
        Self { products }
    }

    pub async fn create_product(
        &self,
        name: impl Into<String>,
        description: Option<String>,
        price: Decimal,
        stock: i32,
    ) -> ShopResult<Product> {
        let product = Product::new(name, description, price, stock)?;
        self.products.create(&product).await?;

        tracing::info!(product_id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    pub async fn get_product(&self, id: Uuid) -> ShopResult<Product> {
        self.products.get_by_id(id).await
    }

    pub async fn list_products(&self) -> ShopResult<Vec<Product>> {
        self.products.list().await
    }

    pub async fn get_products_by_ids(&self, ids: &[Uuid]) -> ShopResult<Vec<Product>> {
        self.products.get_by_ids(ids).await
    }

    /// Price changes never reach existing cart lines or orders; those keep
    /// their snapshot.
    pub async fn update_product(&self, id: Uuid, update: ProductUpdate) -> ShopResult<Product> {
        let mut product = self.products.get_by_id(id).await?;

        if let Some(name) = update.name {
            validate_name(&name)?;
            product.name = name;
        }
        if let Some(description) = update.description {
            product.description = Some(description);
        }
        if let Some(price) = update.price {
            validate_price(price)?;
            product.price = price;
        }
        if let Some(stock) = update.stock {
            validate_stock(stock)?;
            product.stock = stock;
        }

        self.products.update(&product).await?;
        Ok(product)
    }

    pub async fn delete_product(&self, id: Uuid) -> ShopResult<()> {
        self.products.delete(id).await?;
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    pub async fn set_stock(&self, id: Uuid, stock: i32) -> ShopResult<()> {
        validate_stock(stock)?;
        self.products.update_stock(id, stock).await
    }

    /// Add `quantity` units to the current stock. Read-modify-write, not
    /// atomic against concurrent restocks.
    pub async fn restock(&self, id: Uuid, quantity: i32) -> ShopResult<Product> {
        let mut product = self.products.get_by_id(id).await?;
        product.add_stock(quantity)?;
        self.products.update_stock(id, product.stock).await?;

        tracing::info!(product_id = %id, added = quantity, stock = product.stock, "Product restocked");
        Ok(product)
    }
}
