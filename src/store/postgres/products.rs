use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use uuid::Uuid;

use super::map_insert_error;
use crate::domain::product::Product;
use crate::error::{Entity, ShopError, ShopResult};
use crate::store::ProductStore;

const PRODUCT_COLUMNS: &str = "id, name, description, price, stock, created_at, updated_at";

#[derive(Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn product_from_row(row: &PgRow) -> ShopResult<Product> {
    Ok(Product {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: row.try_get("price")?,
        stock: row.try_get("stock")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn ensure_affected(rows: u64, id: Uuid) -> ShopResult<()> {
    if rows == 0 {
        return Err(ShopError::not_found(Entity::Product, id));
    }
    Ok(())
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn create(&self, product: &Product) -> ShopResult<()> {
        sqlx::query(
            "INSERT INTO products (id, name, description, price, stock, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, Entity::Product))?;

        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> ShopResult<Product> {
        let query = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ShopError::not_found(Entity::Product, id))?;

        product_from_row(&row)
    }

    async fn get_by_ids(&self, ids: &[Uuid]) -> ShopResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)");
        let rows = sqlx::query(&query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(product_from_row).collect()
    }

    async fn list(&self) -> ShopResult<Vec<Product>> {
        let query = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC");
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        rows.iter().map(product_from_row).collect()
    }

    async fn update(&self, product: &Product) -> ShopResult<()> {
        let result = sqlx::query(
            "UPDATE products
             SET name = $1, description = $2, price = $3, stock = $4, updated_at = $5
             WHERE id = $6",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock)
        .bind(Utc::now())
        .bind(product.id)
        .execute(&self.pool)
        .await?;

        ensure_affected(result.rows_affected(), product.id)
    }

    async fn delete(&self, id: Uuid) -> ShopResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        ensure_affected(result.rows_affected(), id)
    }

    async fn update_stock(&self, id: Uuid, stock: i32) -> ShopResult<()> {
        let result = sqlx::query("UPDATE products SET stock = $1, updated_at = $2 WHERE id = $3")
            .bind(stock)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        ensure_affected(result.rows_affected(), id)
    }
}
