use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{CartStore, OrderStore, ProductStore, UserStore};
use crate::domain::cart::Cart;
use crate::domain::order::Order;
use crate::domain::product::Product;
use crate::domain::user::User;
use crate::error::{Entity, ShopError, ShopResult};

// ============================================================================
// In-Memory Store
// ============================================================================
//
// Aggregates are stored as whole values behind one lock per kind, so a
// write is all-or-nothing without any extra bookkeeping.
//
// ============================================================================

#[derive(Default)]
pub struct InMemoryStore {
    users: Mutex<HashMap<Uuid, User>>,
    products: Mutex<HashMap<Uuid, Product>>,
    carts: Mutex<HashMap<Uuid, Cart>>,
    orders: Mutex<HashMap<Uuid, Order>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create(&self, user: &User) -> ShopResult<()> {
        let mut users = self.users.lock().await;
        if users.contains_key(&user.id) || users.values().any(|u| u.email == user.email) {
            return Err(ShopError::AlreadyExists(Entity::User));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> ShopResult<User> {
        self.users
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| ShopError::not_found(Entity::User, id))
    }

    async fn get_by_email(&self, email: &str) -> ShopResult<Option<User>> {
        Ok(self.users.lock().await.values().find(|u| u.email == email).cloned())
    }

    async fn list(&self) -> ShopResult<Vec<User>> {
        let mut all: Vec<User> = self.users.lock().await.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn create(&self, cart: &Cart) -> ShopResult<()> {
        let mut carts = self.carts.lock().await;
        if carts.values().any(|c| c.user_id == cart.user_id) || carts.contains_key(&cart.id) {
            return Err(ShopError::AlreadyExists(Entity::Cart));
        }
        carts.insert(cart.id, cart.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> ShopResult<Cart> {
        self.carts
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| ShopError::not_found(Entity::Cart, id))
    }

    async fn get_by_user_id(&self, user_id: Uuid) -> ShopResult<Cart> {
        self.carts
            .lock()
            .await
            .values()
            .find(|c| c.user_id == user_id)
            .cloned()
            .ok_or_else(|| ShopError::not_found(Entity::Cart, user_id))
    }

    async fn save(&self, cart: &Cart) -> ShopResult<()> {
        let mut carts = self.carts.lock().await;
        let slot = carts
            .get_mut(&cart.id)
            .ok_or_else(|| ShopError::not_found(Entity::Cart, cart.id))?;
        *slot = cart.clone();
        Ok(())
    }
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn create(&self, product: &Product) -> ShopResult<()> {
        let mut products = self.products.lock().await;
        if products.contains_key(&product.id) {
            return Err(ShopError::AlreadyExists(Entity::Product));
        }
        products.insert(product.id, product.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> ShopResult<Product> {
        self.products
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| ShopError::not_found(Entity::Product, id))
    }

    async fn get_by_ids(&self, ids: &[Uuid]) -> ShopResult<Vec<Product>> {
        let products = self.products.lock().await;
        Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
    }

    async fn list(&self) -> ShopResult<Vec<Product>> {
        let mut all: Vec<Product> = self.products.lock().await.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn update(&self, product: &Product) -> ShopResult<()> {
        let mut products = self.products.lock().await;
        let slot = products
            .get_mut(&product.id)
            .ok_or_else(|| ShopError::not_found(Entity::Product, product.id))?;
        *slot = product.clone();
        slot.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> ShopResult<()> {
        let removed = self.products.lock().await.remove(&id);
        if removed.is_none() {
            return Err(ShopError::not_found(Entity::Product, id));
        }

        // Mirrors the ON DELETE CASCADE from cart_items to products
        for cart in self.carts.lock().await.values_mut() {
            cart.items.retain(|item| item.product_id != id);
        }
        Ok(())
    }

    async fn update_stock(&self, id: Uuid, stock: i32) -> ShopResult<()> {
        let mut products = self.products.lock().await;
        let product = products
            .get_mut(&id)
            .ok_or_else(|| ShopError::not_found(Entity::Product, id))?;
        product.stock = stock;
        product.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn create(&self, order: &Order) -> ShopResult<()> {
        let mut orders = self.orders.lock().await;
        if orders.contains_key(&order.id) {
            return Err(ShopError::AlreadyExists(Entity::Order));
        }
        orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> ShopResult<Order> {
        self.orders
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| ShopError::not_found(Entity::Order, id))
    }

    async fn get_by_user_id(&self, user_id: Uuid) -> ShopResult<Vec<Order>> {
        let orders = self.orders.lock().await;
        Ok(newest_first(
            orders.values().filter(|o| o.user_id == user_id).cloned().collect(),
        ))
    }

    async fn list(&self) -> ShopResult<Vec<Order>> {
        Ok(newest_first(self.orders.lock().await.values().cloned().collect()))
    }

    async fn update(&self, order: &Order) -> ShopResult<()> {
        let mut orders = self.orders.lock().await;
        let slot = orders
            .get_mut(&order.id)
            .ok_or_else(|| ShopError::not_found(Entity::Order, order.id))?;
        *slot = order.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::CartItem;
    use crate::domain::order::OrderItem;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_user_email_is_unique() {
        let users: Arc<dyn UserStore> = Arc::new(InMemoryStore::new());
        let ada = User::new("Ada", "ada@example.com", "h".into()).unwrap();
        users.create(&ada).await.unwrap();

        let twin = User::new("Other Ada", "ada@example.com", "h".into()).unwrap();
        let result = users.create(&twin).await;
        assert!(matches!(result, Err(ShopError::AlreadyExists(Entity::User))));

        let found = users.get_by_email("ada@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(ada.id));
        assert!(users.get_by_email("nobody@example.com").await.unwrap().is_none());
        assert!(users.get_by_id(twin.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_one_cart_per_user() {
        let carts: Arc<dyn CartStore> = Arc::new(InMemoryStore::new());
        let user_id = Uuid::new_v4();

        carts.create(&Cart::new(user_id)).await.unwrap();
        let second = carts.create(&Cart::new(user_id)).await;

        assert!(matches!(second, Err(ShopError::AlreadyExists(Entity::Cart))));
    }

    #[tokio::test]
    async fn test_cart_save_replaces_item_set() {
        let carts: Arc<dyn CartStore> = Arc::new(InMemoryStore::new());
        let mut cart = Cart::new(Uuid::new_v4());
        cart.add_item(CartItem::new(Uuid::new_v4(), 1, Decimal::ONE)).unwrap();
        carts.create(&cart).await.unwrap();

        let mut writer_a = carts.get_by_user_id(cart.user_id).await.unwrap();
        let mut writer_b = carts.get_by_user_id(cart.user_id).await.unwrap();
        writer_a.add_item(CartItem::new(Uuid::new_v4(), 2, Decimal::ONE)).unwrap();
        writer_b.clear();

        carts.save(&writer_a).await.unwrap();
        carts.save(&writer_b).await.unwrap();

        // Last writer wins; writer A's line is gone
        let stored = carts.get_by_id(cart.id).await.unwrap();
        assert!(stored.items.is_empty());
    }

    #[tokio::test]
    async fn test_save_unknown_cart_is_not_found() {
        let carts: Arc<dyn CartStore> = Arc::new(InMemoryStore::new());
        let result = carts.save(&Cart::new(Uuid::new_v4())).await;
        assert!(matches!(result, Err(ShopError::NotFound { entity: Entity::Cart, .. })));
    }

    #[tokio::test]
    async fn test_get_by_ids_skips_missing() {
        let products: Arc<dyn ProductStore> = Arc::new(InMemoryStore::new());
        let product = Product::new("Mug", None, Decimal::new(900, 2), 4).unwrap();
        products.create(&product).await.unwrap();

        let found = products
            .get_by_ids(&[product.id, Uuid::new_v4()])
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, product.id);
    }

    #[tokio::test]
    async fn test_deleting_product_cascades_to_cart_lines() {
        let store = Arc::new(InMemoryStore::new());
        let products: Arc<dyn ProductStore> = store.clone();
        let carts: Arc<dyn CartStore> = store.clone();

        let product = Product::new("Mug", None, Decimal::new(900, 2), 4).unwrap();
        products.create(&product).await.unwrap();

        let mut cart = Cart::new(Uuid::new_v4());
        cart.add_item(CartItem::new(product.id, 1, product.price)).unwrap();
        carts.create(&cart).await.unwrap();

        products.delete(product.id).await.unwrap();

        assert!(carts.get_by_id(cart.id).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_orders_for_user_newest_first() {
        let orders: Arc<dyn OrderStore> = Arc::new(InMemoryStore::new());
        let user_id = Uuid::new_v4();

        let mut older =
            Order::new(user_id, vec![OrderItem::new(Uuid::new_v4(), 1, Decimal::ONE)]).unwrap();
        older.created_at -= chrono::Duration::minutes(5);
        let newer =
            Order::new(user_id, vec![OrderItem::new(Uuid::new_v4(), 1, Decimal::ONE)]).unwrap();
        let other = Order::new(Uuid::new_v4(), vec![]).unwrap();

        orders.create(&older).await.unwrap();
        orders.create(&newer).await.unwrap();
        orders.create(&other).await.unwrap();

        let listed = orders.get_by_user_id(user_id).await.unwrap();
        assert_eq!(listed.iter().map(|o| o.id).collect::<Vec<_>>(), vec![newer.id, older.id]);
        assert_eq!(orders.list().await.unwrap().len(), 3);
    }
}
