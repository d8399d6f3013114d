// ============================================================================
// Application Services
// ============================================================================
//
// Use cases over the domain aggregates and the store traits:
// - StockGuard      - read-only stock sufficiency check
// - CartService     - per-user cart editing
// - CatalogService  - product administration and stock adjustment
// - CheckoutService - cart to order, order lifecycle
// - UserService     - account registration, login and lookup
//
// ============================================================================

mod cart;
mod catalog;
mod checkout;
mod stock;
mod user;

pub use cart::CartService;
pub use catalog::{CatalogService, ProductUpdate};
pub use checkout::CheckoutService;
pub use stock::StockGuard;
pub use user::{PasswordHasher, UserService};
