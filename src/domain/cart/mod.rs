// ============================================================================
// Cart Domain
// ============================================================================
//
// One cart per user, created lazily on first add. Items carry the price
// captured when they were added.
//
// ============================================================================

pub mod aggregate;

pub use aggregate::*;
