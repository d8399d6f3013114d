use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use super::StockGuard;
use crate::domain::cart::Cart;
use crate::domain::order::{Order, OrderCreated, OrderItem, OrderStatus};
use crate::domain::product::Product;
use crate::error::{Entity, ShopError, ShopResult, ValidationError};
use crate::messaging::{publish_event, EventPublisher};
use crate::metrics::{CheckoutOutcome, Metrics};
use crate::store::{CartStore, OrderStore, ProductStore};

// ============================================================================
// Checkout Service
// ============================================================================
//
// create_order runs in two phases:
//
// 1. Validate and commit: load cart, batch-load products, check stock,
//    freeze cart lines into order items, write the order in one transaction.
//    Any failure here leaves nothing written.
// 2. Post-commit, best-effort: publish order.created, then clear the cart.
//    Failures are logged and counted, never returned.
//
// Stock is checked, not reserved or decremented.
//
// ============================================================================

#[derive(Clone)]
pub struct CheckoutService {
    carts: Arc<dyn CartStore>,
    products: Arc<dyn ProductStore>,
    orders: Arc<dyn OrderStore>,
    publisher: Option<Arc<dyn EventPublisher>>,
    metrics: Option<Arc<Metrics>>,
}

impl CheckoutService {
    pub fn new(
        carts: Arc<dyn CartStore>,
        products: Arc<dyn ProductStore>,
        orders: Arc<dyn OrderStore>,
    ) -> Self {
        Self {
            carts,
            products,
            orders,
            publisher: None,
            metrics: None,
        }
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Turn the user's cart into a pending order.
    ///
    /// Once the order is written this returns it, whatever happens to the
    /// event publish or the cart clear afterwards.
    pub async fn create_order(&self, user_id: Uuid) -> ShopResult<Order> {
        let started = Instant::now();
        let result = self.place_order(user_id).await;

        let outcome = match &result {
            Ok(_) => CheckoutOutcome::Created,
            Err(ShopError::Infrastructure(_)) => CheckoutOutcome::Failed,
            Err(_) => CheckoutOutcome::Rejected,
        };
        if let Some(metrics) = &self.metrics {
            metrics.record_checkout(outcome, started.elapsed().as_secs_f64());
        }

        let (order, mut cart) = result?;

        self.publish_order_created(&order).await;
        self.clear_cart_after_checkout(&order, &mut cart).await;

        Ok(order)
    }

    async fn place_order(&self, user_id: Uuid) -> ShopResult<(Order, Cart)> {
        let cart = match self.carts.get_by_user_id(user_id).await {
            Ok(cart) => cart,
            Err(e) if e.is_not_found() => return Err(ValidationError::EmptyCart.into()),
            Err(e) => return Err(e),
        };
        if cart.is_empty() {
            return Err(ValidationError::EmptyCart.into());
        }

        let products: HashMap<Uuid, Product> = self
            .products
            .get_by_ids(&cart.product_ids())
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut items = Vec::with_capacity(cart.items.len());
        for line in &cart.items {
            let product = products
                .get(&line.product_id)
                .ok_or_else(|| ShopError::not_found(Entity::Product, line.product_id))?;
            StockGuard::check(product, line.quantity)?;

            // Frozen at the cart's snapshot price, not the live product price
            items.push(OrderItem::new(line.product_id, line.quantity, line.price));
        }

        let order = Order::new(user_id, items)?;
        self.orders.create(&order).await?;

        tracing::info!(
            order_id = %order.id,
            user_id = %user_id,
            total = %order.total,
            items = order.items.len(),
            "Order created"
        );
        Ok((order, cart))
    }

    async fn publish_order_created(&self, order: &Order) {
        let Some(publisher) = &self.publisher else {
            tracing::warn!(order_id = %order.id, "No event publisher configured, skipping order.created");
            return;
        };

        let result = publish_event(publisher.as_ref(), &OrderCreated::from(order)).await;
        if let Some(metrics) = &self.metrics {
            metrics.record_event_publish(result.is_ok());
        }
        if let Err(e) = result {
            tracing::error!(order_id = %order.id, error = %e, "Failed to publish order.created");
        }
    }

    async fn clear_cart_after_checkout(&self, order: &Order, cart: &mut Cart) {
        cart.clear();
        if let Err(e) = self.carts.save(cart).await {
            if let Some(metrics) = &self.metrics {
                metrics.record_cart_clear_failure();
            }
            tracing::error!(
                order_id = %order.id,
                cart_id = %cart.id,
                error = %e,
                "Failed to clear cart after checkout"
            );
        }
    }

    pub async fn get_order(&self, id: Uuid) -> ShopResult<Order> {
        self.orders.get_by_id(id).await
    }

    /// Newest first.
    pub async fn get_user_orders(&self, user_id: Uuid) -> ShopResult<Vec<Order>> {
        self.orders.get_by_user_id(user_id).await
    }

    pub async fn list_orders(&self) -> ShopResult<Vec<Order>> {
        self.orders.list().await
    }

    pub async fn pay_order(&self, id: Uuid) -> ShopResult<Order> {
        self.apply(id, |order| order.mark_paid()).await
    }

    pub async fn ship_order(&self, id: Uuid) -> ShopResult<Order> {
        self.apply(id, |order| order.mark_shipped()).await
    }

    pub async fn complete_order(&self, id: Uuid) -> ShopResult<Order> {
        self.apply(id, |order| {
            order.mark_completed();
            Ok(())
        })
        .await
    }

    pub async fn cancel_order(&self, id: Uuid) -> ShopResult<Order> {
        self.apply(id, |order| order.cancel()).await
    }

    /// Administrative override: any known status, from any status.
    pub async fn update_order_status(&self, id: Uuid, status: &str) -> ShopResult<Order> {
        let status: OrderStatus = status.parse()?;
        self.apply(id, |order| {
            order.set_status(status);
            Ok(())
        })
        .await
    }

    async fn apply<F>(&self, id: Uuid, transition: F) -> ShopResult<Order>
    where
        F: FnOnce(&mut Order) -> Result<(), ValidationError>,
    {
        let mut order = self.orders.get_by_id(id).await?;
        let previous = order.status;

        transition(&mut order)?;
        self.orders.update(&order).await?;

        if let Some(metrics) = &self.metrics {
            metrics.record_status_change(order.status);
        }
        tracing::info!(order_id = %id, from = %previous, to = %order.status, "Order status changed");
        Ok(order)
    }
}
