// ============================================================================
// Store Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("unit of work is read-only")]
    ReadOnlySession,

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("a collection-join query cannot be paginated")]
    UnsupportedQueryShape,

    #[error("association `{0}` is not resolved in this unit of work")]
    UnresolvedAssociation(&'static str),

    #[error("unrecognized {field} value `{value}` in stored row")]
    InvalidColumn { field: &'static str, value: String },

    #[error("{0} must be persisted before it can be referenced")]
    NotPersisted(&'static str),
}
