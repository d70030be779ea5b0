// ============================================================================
// Catalog Item Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i64, available: i64 },

    #[error("stock quantity must be positive, got {0}")]
    InvalidQuantity(i64),
}
