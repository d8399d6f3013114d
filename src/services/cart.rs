use std::sync::Arc;

use uuid::Uuid;

use super::StockGuard;
use crate::domain::cart::{Cart, CartItem};
use crate::error::{ShopError, ShopResult, ValidationError};
use crate::store::{CartStore, ProductStore};

/// Per-user cart editing. Every mutation is load, mutate, then a full save.
#[derive(Clone)]
pub struct CartService {
    carts: Arc<dyn CartStore>,
    products: Arc<dyn ProductStore>,
}

impl CartService {
    pub fn new(carts: Arc<dyn CartStore>, products: Arc<dyn ProductStore>) -> Self {
        Self { carts, products }
    }

    pub async fn get_or_create_cart(&self, user_id: Uuid) -> ShopResult<Cart> {
        match self.carts.get_by_user_id(user_id).await {
            Ok(cart) => return Ok(cart),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        let cart = Cart::new(user_id);
        match self.carts.create(&cart).await {
            Ok(()) => {
                tracing::debug!(cart_id = %cart.id, user_id = %user_id, "Cart created");
                Ok(cart)
            }
            // Lost a race with a concurrent first add for the same user
            Err(ShopError::AlreadyExists(_)) => self.carts.get_by_user_id(user_id).await,
            Err(e) => Err(e),
        }
    }

    pub async fn get_cart(&self, user_id: Uuid) -> ShopResult<Cart> {
        self.carts.get_by_user_id(user_id).await
    }

    /// Snapshots the product's current price into the cart line.
    pub async fn add_item(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> ShopResult<Cart> {
        validate_quantity(quantity)?;

        let mut cart = self.get_or_create_cart(user_id).await?;
        let product = self.products.get_by_id(product_id).await?;
        StockGuard::check(&product, quantity)?;

        cart.add_item(CartItem::new(product_id, quantity, product.price))?;
        self.carts.save(&cart).await?;

        tracing::debug!(
            user_id = %user_id,
            product_id = %product_id,
            quantity,
            "Item added to cart"
        );
        Ok(cart)
    }

    pub async fn remove_item(&self, user_id: Uuid, product_id: Uuid) -> ShopResult<Cart> {
        let mut cart = self.get_cart(user_id).await?;
        cart.remove_item(product_id)?;
        self.carts.save(&cart).await?;
        Ok(cart)
    }

    pub async fn update_item_quantity(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> ShopResult<Cart> {
        validate_quantity(quantity)?;

        let mut cart = self.get_cart(user_id).await?;
        let product = self.products.get_by_id(product_id).await?;
        StockGuard::check(&product, quantity)?;

        cart.update_quantity(product_id, quantity)?;
        self.carts.save(&cart).await?;
        Ok(cart)
    }

    pub async fn clear_cart(&self, user_id: Uuid) -> ShopResult<Cart> {
        let mut cart = self.get_cart(user_id).await?;
        cart.clear();
        self.carts.save(&cart).await?;
        Ok(cart)
    }
}

fn validate_quantity(quantity: i32) -> Result<(), ValidationError> {
    if quantity <= 0 {
        return Err(ValidationError::InvalidQuantity(quantity));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::Product;
    use crate::error::Entity;
    use crate::store::InMemoryStore;
    use rust_decimal::Decimal;

    async fn setup(stock: i32) -> (CartService, Arc<InMemoryStore>, Product) {
        let store = Arc::new(InMemoryStore::new());
        let product = Product::new("Mug", None, Decimal::new(800, 2), stock).unwrap();
        ProductStore::create(&*store, &product).await.unwrap();

        let service = CartService::new(store.clone(), store.clone());
        (service, store, product)
    }

    #[tokio::test]
    async fn test_add_item_creates_cart_lazily() {
        let (service, _, product) = setup(10).await;
        let user_id = Uuid::new_v4();

        assert!(service.get_cart(user_id).await.unwrap_err().is_not_found());

        let cart = service.add_item(user_id, product.id, 2).await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].price, Decimal::new(800, 2));

        assert_eq!(service.get_cart(user_id).await.unwrap().id, cart.id);
    }

    #[tokio::test]
    async fn test_add_same_product_merges() {
        let (service, _, product) = setup(10).await;
        let user_id = Uuid::new_v4();

        service.add_item(user_id, product.id, 2).await.unwrap();
        let cart = service.add_item(user_id, product.id, 3).await.unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_add_item_validates() {
        let (service, _, product) = setup(1).await;
        let user_id = Uuid::new_v4();

        let err = service.add_item(user_id, product.id, 0).await.unwrap_err();
        assert_eq!(err.validation(), Some(&ValidationError::InvalidQuantity(0)));

        let err = service.add_item(user_id, product.id, 2).await.unwrap_err();
        assert!(matches!(
            err.validation(),
            Some(ValidationError::InsufficientStock { requested: 2, available: 1, .. })
        ));

        let missing = Uuid::new_v4();
        let err = service.add_item(user_id, missing, 1).await.unwrap_err();
        assert!(matches!(err, ShopError::NotFound { entity: Entity::Product, .. }));
    }

    #[tokio::test]
    async fn test_merge_overflow_is_rejected_and_not_saved() {
        let (service, _, product) = setup(i32::MAX).await;
        let user_id = Uuid::new_v4();
        service.add_item(user_id, product.id, i32::MAX).await.unwrap();

        let err = service.add_item(user_id, product.id, i32::MAX).await.unwrap_err();
        assert_eq!(err.validation(), Some(&ValidationError::InvalidQuantity(i32::MAX)));

        let stored = service.get_cart(user_id).await.unwrap();
        assert_eq!(stored.items.len(), 1);
        assert_eq!(stored.items[0].quantity, i32::MAX);
    }

    #[tokio::test]
    async fn test_update_quantity_checks_stock() {
        let (service, _, product) = setup(4).await;
        let user_id = Uuid::new_v4();
        service.add_item(user_id, product.id, 1).await.unwrap();

        let cart = service.update_item_quantity(user_id, product.id, 4).await.unwrap();
        assert_eq!(cart.items[0].quantity, 4);

        let err = service.update_item_quantity(user_id, product.id, 5).await.unwrap_err();
        assert!(matches!(err.validation(), Some(ValidationError::InsufficientStock { .. })));
    }

    #[tokio::test]
    async fn test_remove_missing_item() {
        let (service, _, product) = setup(4).await;
        let user_id = Uuid::new_v4();
        service.add_item(user_id, product.id, 1).await.unwrap();

        let other = Uuid::new_v4();
        let err = service.remove_item(user_id, other).await.unwrap_err();
        assert_eq!(err.validation(), Some(&ValidationError::CartItemNotFound(other)));

        let cart = service.remove_item(user_id, product.id).await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_clear_cart_keeps_cart() {
        let (service, store, product) = setup(4).await;
        let user_id = Uuid::new_v4();
        let cart = service.add_item(user_id, product.id, 1).await.unwrap();

        service.clear_cart(user_id).await.unwrap();

        let stored = CartStore::get_by_id(&*store, cart.id).await.unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_first_add_shares_one_cart() {
        let (service, _, product) = setup(10).await;
        let user_id = Uuid::new_v4();

        let (a, b) = tokio::join!(
            service.get_or_create_cart(user_id),
            service.get_or_create_cart(user_id),
        );

        assert_eq!(a.unwrap().id, b.unwrap().id);
        service.add_item(user_id, product.id, 1).await.unwrap();
    }
}
