// ============================================================================
// Messaging
// ============================================================================
//
// - publisher - EventPublisher seam used by the checkout flow
// - redpanda  - Kafka-protocol producer behind a circuit breaker
// - consumer  - `order.created` subscriber that logs what it receives
//
// ============================================================================

mod consumer;
mod publisher;
mod redpanda;

pub use consumer::{decode_order_created, join_consumer, shutdown_on, OrderEventsConsumer};
pub use publisher::{publish_event, EventPublisher};
pub use redpanda::RedpandaClient;
