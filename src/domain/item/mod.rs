// ============================================================================
// Catalog Item Domain
// ============================================================================
//
// The catalog item owns its stock counter and the add/remove-stock invariant.
// Its lifecycle is independent of orders: created by catalog management,
// mutated by stock operations, never deleted while referenced.
//
// ============================================================================

pub mod aggregate;
pub mod errors;

pub use aggregate::*;
pub use errors::*;
