// ============================================================================
// Persistence Gateway
// ============================================================================
//
// One capability trait per aggregate. Writing a Cart or an Order covers the
// parent row and its complete item set in a single transaction; updates
// replace the whole item set (last writer wins, no versioning).
//
// Backends:
// - postgres/ - sqlx over PostgreSQL
// - memory    - in-process maps, one lock per aggregate kind
//
// ============================================================================

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::cart::Cart;
use crate::domain::order::Order;
use crate::domain::product::Product;
use crate::domain::user::User;
use crate::error::ShopResult;

pub use memory::InMemoryStore;
pub use postgres::{PgCartStore, PgOrderStore, PgProductStore, PgUserStore};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `AlreadyExists` if the email is taken.
    async fn create(&self, user: &User) -> ShopResult<()>;

    async fn get_by_id(&self, id: Uuid) -> ShopResult<User>;

    async fn get_by_email(&self, email: &str) -> ShopResult<Option<User>>;

    /// Newest first.
    async fn list(&self) -> ShopResult<Vec<User>>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    /// Fails with `AlreadyExists` if the user already owns a cart.
    async fn create(&self, cart: &Cart) -> ShopResult<()>;

    async fn get_by_id(&self, id: Uuid) -> ShopResult<Cart>;

    async fn get_by_user_id(&self, user_id: Uuid) -> ShopResult<Cart>;

    /// Replace the cart's item set wholesale.
    async fn save(&self, cart: &Cart) -> ShopResult<()>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn create(&self, product: &Product) -> ShopResult<()>;

    async fn get_by_id(&self, id: Uuid) -> ShopResult<Product>;

    /// Ids with no matching product are absent from the result.
    async fn get_by_ids(&self, ids: &[Uuid]) -> ShopResult<Vec<Product>>;

    async fn list(&self) -> ShopResult<Vec<Product>>;

    async fn update(&self, product: &Product) -> ShopResult<()>;

    async fn delete(&self, id: Uuid) -> ShopResult<()>;

    async fn update_stock(&self, id: Uuid, stock: i32) -> ShopResult<()>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn create(&self, order: &Order) -> ShopResult<()>;

    async fn get_by_id(&self, id: Uuid) -> ShopResult<Order>;

    /// Newest first.
    async fn get_by_user_id(&self, user_id: Uuid) -> ShopResult<Vec<Order>>;

    /// Newest first.
    async fn list(&self) -> ShopResult<Vec<Order>>;

    /// Rewrite the order row and its full item set.
    async fn update(&self, order: &Order) -> ShopResult<()>;
}
