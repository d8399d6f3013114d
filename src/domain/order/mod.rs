// ============================================================================
// Order Domain
// ============================================================================
//
// - Value objects (OrderItem, OrderStatus, OrderAction)
// - Aggregate (Order with its status state machine)
// - Events (OrderCreated, published after checkout)
//
// ============================================================================

pub mod value_objects;
pub mod aggregate;
pub mod events;

pub use value_objects::*;
pub use aggregate::*;
pub use events::*;
