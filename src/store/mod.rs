// ============================================================================
// Store - Unit of Work over SQLite
// ============================================================================
//
// - Store: connection pool + schema bootstrap
// - Session: one transaction-scoped unit of work, read-only or read-write,
//   with a per-session round-trip counter
// - Lazy / Resolve: explicit placeholders for not-yet-loaded associations
//
// Every statement the crate issues goes through a Session, so the cost of a
// query strategy is observable as `session.round_trips()`.
//
// ============================================================================

pub mod errors;
pub mod lazy;
pub(crate) mod schema;
pub mod session;

pub use errors::StoreError;
pub use lazy::{Lazy, Resolve};
pub use session::{Session, SessionMode, Store};
