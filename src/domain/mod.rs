// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Pure, synchronous aggregates. Persistence and messaging live in
// `store` and `messaging`; orchestration lives in `services`.
//
// ============================================================================

pub mod cart;
pub mod money;
pub mod order;
pub mod product;
pub mod user;
