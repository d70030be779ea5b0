use serde::{Deserialize, Serialize};

// ============================================================================
// Shared Value Objects
// ============================================================================

/// Postal address, embedded by `Member` and `Delivery`.
///
/// A value object: no identity of its own, immutable after construction.
/// The delivery keeps its own copy of the member's address at order time, so
/// a member moving later never rewrites historical deliveries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    city: String,
    street: String,
    zipcode: String,
}

impl Address {
    pub fn new(city: impl Into<String>, street: impl Into<String>, zipcode: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            street: street.into(),
            zipcode: zipcode.into(),
        }
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn street(&self) -> &str {
        &self.street
    }

    pub fn zipcode(&self) -> &str {
        &self.zipcode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_accessors() {
        let address = Address::new("Seoul", "Teheran-ro 1", "06000");
        assert_eq!(address.city(), "Seoul");
        assert_eq!(address.street(), "Teheran-ro 1");
        assert_eq!(address.zipcode(), "06000");
    }

    #[test]
    fn test_address_value_equality() {
        let a = Address::new("Seoul", "1", "111");
        let b = Address::new("Seoul", "1", "111");
        assert_eq!(a, b);
        assert_ne!(a, Address::new("Jinju", "2", "222"));
    }
}
