use crate::domain::item::ItemError;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("a completed delivery cannot be cancelled")]
    AlreadyDelivered,

    #[error("order is already cancelled")]
    AlreadyCancelled,

    #[error("an order must contain at least one line item")]
    EmptyOrder,

    #[error("line item count must be positive, got {0}")]
    InvalidCount(i64),

    #[error("association `{0}` must be resolved before this operation")]
    Unresolved(&'static str),

    #[error("order has not been persisted")]
    NotPersisted,

    #[error(transparent)]
    Stock(#[from] ItemError),
}
