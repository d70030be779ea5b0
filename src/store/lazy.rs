use async_trait::async_trait;

use super::errors::StoreError;
use super::session::Session;

// ============================================================================
// Lazy Association Resolver
// ============================================================================
//
// An association is either Resolved(value) or Unresolved(key). Resolving is
// an explicit async call that takes the live Session, which makes every
// round trip visible at the call site -- no hidden I/O behind a field access,
// and no way to resolve once the unit of work has been consumed.
//
// ============================================================================

/// How a not-yet-loaded association of type `T` is fetched. One `load` call
/// is one round trip.
#[async_trait]
pub trait Resolve: Sized {
    /// Association name used in diagnostics.
    const ASSOCIATION: &'static str;

    async fn load(session: &mut Session, key: i64) -> Result<Self, StoreError>;
}

/// A to-one or to-many association placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Lazy<T> {
    /// Not loaded yet; holds the key a resolver will fetch by. What the key
    /// identifies (the target row or the owning row) is documented on the
    /// field using the placeholder.
    Unresolved(i64),
    Resolved(T),
}

impl<T> Lazy<T> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Lazy::Resolved(_))
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Lazy::Resolved(value) => Some(value),
            Lazy::Unresolved(_) => None,
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            Lazy::Resolved(value) => Some(value),
            Lazy::Unresolved(_) => None,
        }
    }

    /// The pending key, if the association is still unresolved.
    pub fn key(&self) -> Option<i64> {
        match self {
            Lazy::Unresolved(key) => Some(*key),
            Lazy::Resolved(_) => None,
        }
    }

    /// Resolved value or [`StoreError::UnresolvedAssociation`].
    pub fn require(&self, name: &'static str) -> Result<&T, StoreError> {
        self.get().ok_or(StoreError::UnresolvedAssociation(name))
    }
}

impl<T: Resolve> Lazy<T> {
    /// Resolve in place. Costs exactly one round trip the first time and
    /// zero afterwards; the placeholder caches the loaded value.
    pub async fn resolve(&mut self, session: &mut Session) -> Result<&T, StoreError> {
        let pending = match self {
            Lazy::Unresolved(key) => Some(*key),
            Lazy::Resolved(_) => None,
        };
        if let Some(key) = pending {
            tracing::trace!(association = T::ASSOCIATION, key, "resolving association");
            *self = Lazy::Resolved(T::load(session, key).await?);
        }
        match self {
            Lazy::Resolved(value) => Ok(value),
            Lazy::Unresolved(_) => unreachable!("resolved above"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_exposes_key_only() {
        let lazy: Lazy<String> = Lazy::Unresolved(7);
        assert!(!lazy.is_resolved());
        assert_eq!(lazy.key(), Some(7));
        assert_eq!(lazy.get(), None);
        assert!(matches!(
            lazy.require("member"),
            Err(StoreError::UnresolvedAssociation("member"))
        ));
    }

    #[test]
    fn test_resolved_exposes_value_only() {
        let lazy = Lazy::Resolved("userA".to_string());
        assert!(lazy.is_resolved());
        assert_eq!(lazy.key(), None);
        assert_eq!(lazy.get().map(String::as_str), Some("userA"));
        assert_eq!(lazy.require("member").unwrap(), "userA");
    }
}
