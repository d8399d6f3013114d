// ============================================================================
// PostgreSQL Backend
// ============================================================================
//
// Aggregate writes run inside one transaction each: parent row first, then
// delete-and-reinsert of every child row. Nothing here spans two
// aggregates.
//
// Aggregate reads run inside a read-only REPEATABLE READ transaction, so a
// parent row and its child rows always come from the same snapshot.
//
// ============================================================================

mod carts;
mod orders;
mod products;
mod users;

use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};

use crate::config::DatabaseConfig;
use crate::error::{Entity, ShopError};

pub use carts::PgCartStore;
pub use orders::PgOrderStore;
pub use products::PgProductStore;
pub use users::PgUserStore;

const SNAPSHOT_READ: &str = "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY";

const SCHEMA: &[(&str, &str)] = &[
    (
        "users",
        "CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            email VARCHAR(255) UNIQUE NOT NULL,
            password_hash VARCHAR(255) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    ),
    (
        "products",
        "CREATE TABLE IF NOT EXISTS products (
            id UUID PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            description TEXT,
            price DECIMAL(10, 2) NOT NULL,
            stock INTEGER NOT NULL DEFAULT 0 CHECK (stock >= 0),
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    ),
    (
        "carts",
        "CREATE TABLE IF NOT EXISTS carts (
            id UUID PRIMARY KEY,
            user_id UUID NOT NULL UNIQUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    ),
    (
        "cart_items",
        "CREATE TABLE IF NOT EXISTS cart_items (
            id UUID PRIMARY KEY,
            cart_id UUID NOT NULL REFERENCES carts(id) ON DELETE CASCADE,
            product_id UUID NOT NULL REFERENCES products(id) ON DELETE CASCADE,
            quantity INTEGER NOT NULL DEFAULT 1,
            price DECIMAL(10, 2) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            UNIQUE (cart_id, product_id)
        )",
    ),
    (
        "orders",
        "CREATE TABLE IF NOT EXISTS orders (
            id UUID PRIMARY KEY,
            user_id UUID NOT NULL,
            total DECIMAL(10, 2) NOT NULL,
            status VARCHAR(50) NOT NULL DEFAULT 'pending',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    ),
    (
        "order_items",
        "CREATE TABLE IF NOT EXISTS order_items (
            id UUID PRIMARY KEY,
            order_id UUID NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
            product_id UUID NOT NULL,
            quantity INTEGER NOT NULL,
            price DECIMAL(10, 2) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    ),
    ("idx_users_email", "CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)"),
    ("idx_orders_user_id", "CREATE INDEX IF NOT EXISTS idx_orders_user_id ON orders(user_id)"),
    ("idx_orders_status", "CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status)"),
    (
        "idx_cart_items_cart_id",
        "CREATE INDEX IF NOT EXISTS idx_cart_items_cart_id ON cart_items(cart_id)",
    ),
    (
        "idx_order_items_order_id",
        "CREATE INDEX IF NOT EXISTS idx_order_items_order_id ON order_items(order_id)",
    ),
];

pub async fn connect(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .max_lifetime(Duration::from_secs(5 * 60))
        .connect(&config.connection_url())
        .await
        .with_context(|| format!("failed to connect to postgres at {}:{}", config.host, config.port))?;

    tracing::info!(
        host = %config.host,
        database = %config.name,
        "Connected to PostgreSQL"
    );

    Ok(pool)
}

/// Create tables and indexes if they do not exist yet.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    for (name, statement) in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("failed to create {name}"))?;
    }

    tracing::info!(objects = SCHEMA.len(), "Database migrations completed");
    Ok(())
}

/// Open a transaction that sees one consistent snapshot for all its reads.
async fn begin_snapshot(pool: &PgPool) -> sqlx::Result<Transaction<'static, Postgres>> {
    let mut tx = pool.begin().await?;
    sqlx::query(SNAPSHOT_READ).execute(&mut *tx).await?;
    Ok(tx)
}

/// Unique violations become `AlreadyExists`; anything else is infrastructure.
fn map_insert_error(err: sqlx::Error, entity: Entity) -> ShopError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => ShopError::AlreadyExists(entity),
        _ => ShopError::from(err),
    }
}
