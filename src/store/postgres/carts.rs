use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgConnection, PgPool, PgRow};
use sqlx::{Postgres, Row, Transaction};
use uuid::Uuid;

use super::{begin_snapshot, map_insert_error};
use crate::domain::cart::{Cart, CartItem};
use crate::error::{Entity, ShopError, ShopResult};
use crate::store::CartStore;

#[derive(Clone)]
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load(&self, column: &'static str, key: Uuid) -> ShopResult<Cart> {
        let query = format!(
            "SELECT id, user_id, created_at, updated_at FROM carts WHERE {column} = $1"
        );

        let mut tx = begin_snapshot(&self.pool).await?;
        let row = sqlx::query(&query)
            .bind(key)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ShopError::not_found(Entity::Cart, key))?;

        let mut cart = cart_from_row(&row)?;
        cart.items = load_items(&mut tx, cart.id).await?;
        tx.commit().await?;
        Ok(cart)
    }
}

async fn load_items(conn: &mut PgConnection, cart_id: Uuid) -> ShopResult<Vec<CartItem>> {
    let rows = sqlx::query(
        "SELECT id, product_id, quantity, price
         FROM cart_items
         WHERE cart_id = $1
         ORDER BY created_at ASC, id ASC",
    )
    .bind(cart_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(cart_item_from_row).collect()
}

fn cart_from_row(row: &PgRow) -> ShopResult<Cart> {
    Ok(Cart {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        items: Vec::new(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn cart_item_from_row(row: &PgRow) -> ShopResult<CartItem> {
    Ok(CartItem {
        id: row.try_get("id")?,
        product_id: row.try_get("product_id")?,
        quantity: row.try_get("quantity")?,
        price: row.try_get("price")?,
    })
}

async fn insert_items(tx: &mut Transaction<'_, Postgres>, cart: &Cart) -> ShopResult<()> {
    // Rows keep the aggregate's item order through a strictly increasing created_at
    let base = Utc::now();
    for (position, item) in cart.items.iter().enumerate() {
        sqlx::query(
            "INSERT INTO cart_items (id, cart_id, product_id, quantity, price, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(item.id)
        .bind(cart.id)
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
impl CartStore for PgCartStore {
    async fn create(&self, cart: &Cart) -> ShopResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO carts (id, user_id, created_at, updated_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(cart.id)
        .bind(cart.user_id)
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_insert_error(e, Entity::Cart))?;

        insert_items(&mut tx, cart).await?;
        tx.commit().await?;

        tracing::debug!(cart_id = %cart.id, user_id = %cart.user_id, "Cart created");
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> ShopResult<Cart> {
        self.load("id", id).await
    }

    async fn get_by_user_id(&self, user_id: Uuid) -> ShopResult<Cart> {
        self.load("user_id", user_id).await
    }

    async fn save(&self, cart: &Cart) -> ShopResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE carts SET updated_at = $1 WHERE id = $2")
            .bind(cart.updated_at)
            .bind(cart.id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ShopError::not_found(Entity::Cart, cart.id));
        }

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart.id)
            .execute(&mut *tx)
            .await?;

        insert_items(&mut tx, cart).await?;
        tx.commit().await?;

        tracing::debug!(
            cart_id = %cart.id,
            item_count = cart.items.len(),
            "Cart items replaced"
        );
        Ok(())
    }
}
