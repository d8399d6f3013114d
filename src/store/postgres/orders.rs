use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgConnection, PgPool, PgRow};
use sqlx::{Postgres, Row, Transaction};
use uuid::Uuid;

use super::{begin_snapshot, map_insert_error};
use crate::domain::order::{Order, OrderItem, OrderStatus};
use crate::error::{Entity, ShopError, ShopResult};
use crate::store::OrderStore;

const ORDER_COLUMNS: &str = "id, user_id, total, status, created_at, updated_at";

#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Items of every listed order in one round trip, tagged with their order id.
async fn load_items(
    conn: &mut PgConnection,
    order_ids: &[Uuid],
) -> ShopResult<Vec<(Uuid, OrderItem)>> {
    let rows = sqlx::query(
        "SELECT order_id, id, product_id, quantity, price
         FROM order_items
         WHERE order_id = ANY($1)
         ORDER BY created_at ASC, id ASC",
    )
    .bind(order_ids)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter()
        .map(|row| -> ShopResult<(Uuid, OrderItem)> {
            Ok((row.try_get("order_id")?, order_item_from_row(row)?))
        })
        .collect()
}

async fn hydrate(conn: &mut PgConnection, rows: &[PgRow]) -> ShopResult<Vec<Order>> {
    let orders = rows.iter().map(order_from_row).collect::<ShopResult<Vec<_>>>()?;
    if orders.is_empty() {
        return Ok(orders);
    }

    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let items = load_items(conn, &ids).await?;
    Ok(attach_items(orders, items))
}

/// Distribute item rows over their orders, keeping row order within each.
fn attach_items(mut orders: Vec<Order>, items: Vec<(Uuid, OrderItem)>) -> Vec<Order> {
    let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for (order_id, item) in items {
        by_order.entry(order_id).or_default().push(item);
    }
    for order in &mut orders {
        order.items = by_order.remove(&order.id).unwrap_or_default();
    }
    orders
}

fn order_from_row(row: &PgRow) -> ShopResult<Order> {
    let status: String = row.try_get("status")?;
    let status = status.parse::<OrderStatus>().map_err(ShopError::infrastructure)?;

    Ok(Order {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        items: Vec::new(),
        total: row.try_get("total")?,
        status,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn order_item_from_row(row: &PgRow) -> ShopResult<OrderItem> {
    Ok(OrderItem {
        id: row.try_get("id")?,
        product_id: row.try_get("product_id")?,
        quantity: row.try_get("quantity")?,
        price: row.try_get("price")?,
    })
}

async fn insert_items(tx: &mut Transaction<'_, Postgres>, order: &Order) -> ShopResult<()> {
    let base = Utc::now();
    for (position, item) in order.items.iter().enumerate() {
        sqlx::query(
            "INSERT INTO order_items (id, order_id, product_id, quantity, price, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(item.id)
        .bind(order.id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.price)
        .bind(base + chrono::Duration::microseconds(position as i64))
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn create(&self, order: &Order) -> ShopResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders (id, user_id, total, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(order.total)
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_insert_error(e, Entity::Order))?;

        insert_items(&mut tx, order).await?;
        tx.commit().await?;

        tracing::debug!(
            order_id = %order.id,
            item_count = order.items.len(),
            "Order and items committed"
        );
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> ShopResult<Order> {
        let query = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");

        let mut tx = begin_snapshot(&self.pool).await?;
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ShopError::not_found(Entity::Order, id))?;

        let mut orders = hydrate(&mut tx, &[row]).await?;
        tx.commit().await?;
        orders.pop().ok_or_else(|| ShopError::not_found(Entity::Order, id))
    }

    async fn get_by_user_id(&self, user_id: Uuid) -> ShopResult<Vec<Order>> {
        let query = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        );

        let mut tx = begin_snapshot(&self.pool).await?;
        let rows = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(&mut *tx)
            .await?;

        let orders = hydrate(&mut tx, &rows).await?;
        tx.commit().await?;
        Ok(orders)
    }

    async fn list(&self) -> ShopResult<Vec<Order>> {
        let query = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC");

        let mut tx = begin_snapshot(&self.pool).await?;
        let rows = sqlx::query(&query).fetch_all(&mut *tx).await?;

        let orders = hydrate(&mut tx, &rows).await?;
        tx.commit().await?;
        Ok(orders)
    }

    async fn update(&self, order: &Order) -> ShopResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE orders SET total = $1, status = $2, updated_at = $3 WHERE id = $4",
        )
        .bind(order.total)
        .bind(order.status.as_str())
        .bind(order.updated_at)
        .bind(order.id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ShopError::not_found(Entity::Order, order.id));
        }

        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(order.id)
            .execute(&mut *tx)
            .await?;

        insert_items(&mut tx, order).await?;
        tx.commit().await?;
        Ok(())
    }
}
