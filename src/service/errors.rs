use crate::domain::item::ItemError;
use crate::domain::order::OrderError;
use crate::store::StoreError;

// ============================================================================
// Service Errors
// ============================================================================

/// Composite error surfaced by the service facade. Domain rule violations
/// and store failures keep their own types; nothing is stringified away.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Item(#[from] ItemError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
