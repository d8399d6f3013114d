use std::fmt;
use uuid::Uuid;

use crate::domain::order::{OrderAction, OrderStatus};

// ============================================================================
// Error Kinds
// ============================================================================
//
// NotFound and Validation errors abort an operation before any write.
// Infrastructure wraps store and broker failures.
//
// ============================================================================

pub type ShopResult<T> = Result<T, ShopError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Product,
    Cart,
    Order,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::User => f.write_str("user"),
            Entity::Product => f.write_str("product"),
            Entity::Cart => f.write_str("cart"),
            Entity::Order => f.write_str("order"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ShopError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: Uuid },

    #[error("{0} already exists")]
    AlreadyExists(Entity),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("infrastructure failure: {0}")]
    Infrastructure(#[source] anyhow::Error),
}

impl ShopError {
    pub fn not_found(entity: Entity, id: Uuid) -> Self {
        ShopError::NotFound { entity, id }
    }

    pub fn infrastructure(err: impl Into<anyhow::Error>) -> Self {
        ShopError::Infrastructure(err.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ShopError::NotFound { .. })
    }

    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            ShopError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for ShopError {
    fn from(err: sqlx::Error) -> Self {
        ShopError::Infrastructure(err.into())
    }
}

// ============================================================================
// Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Insufficient stock for product {name}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: Uuid,
        name: String,
        requested: i32,
        available: i32,
    },

    #[error("Cannot {action} order in status: {current}")]
    InvalidOrderState {
        current: OrderStatus,
        action: OrderAction,
    },

    #[error("Cart item not found for product: {0}")]
    CartItemNotFound(Uuid),

    #[error("Invalid item quantity: {0}")]
    InvalidQuantity(i32),

    #[error("Price must be greater than 0, below 100000000 and have at most 2 decimal places")]
    InvalidPrice,

    #[error("Amount exceeds the storable range")]
    AmountOutOfRange,

    #[error("Stock cannot be negative: {0}")]
    InvalidStock(i32),

    #[error("Name cannot be empty")]
    InvalidName,

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Password cannot be empty")]
    InvalidPassword,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Unknown order status: {0}")]
    UnknownOrderStatus(String),
}
