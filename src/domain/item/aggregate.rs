use serde::{Deserialize, Serialize};

use super::errors::ItemError;

pub type ItemId = i64;

// ============================================================================
// Catalog Item - Stock Invariant
// ============================================================================

/// Kind-specific catalog data. The catalog is a closed set of variants with a
/// discriminator column in the store; new kinds are added here, not as new
/// entity types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ItemKind {
    Book { author: String, isbn: String },
}

impl ItemKind {
    /// Single-character discriminator persisted alongside the item row.
    pub fn discriminator(&self) -> &'static str {
        match self {
            ItemKind::Book { .. } => "B",
        }
    }

    /// Rebuild the kind from a stored discriminator and its kind-specific
    /// columns. `None` for a discriminator this closed set does not know.
    pub fn from_discriminator(
        kind: &str,
        author: Option<String>,
        isbn: Option<String>,
    ) -> Option<Self> {
        match kind {
            "B" => Some(ItemKind::Book {
                author: author.unwrap_or_default(),
                isbn: isbn.unwrap_or_default(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: Option<ItemId>,
    pub name: String,
    pub price: i64,
    pub stock_quantity: i64,
    pub kind: ItemKind,
}

impl Item {
    pub fn book(
        name: impl Into<String>,
        price: i64,
        stock_quantity: i64,
        author: impl Into<String>,
        isbn: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            price,
            stock_quantity,
            kind: ItemKind::Book {
                author: author.into(),
                isbn: isbn.into(),
            },
        }
    }

    /// Add to stock. Unconditional; restocking has no failure mode.
    pub fn increase_stock(&mut self, quantity: i64) {
        self.stock_quantity += quantity;
    }

    /// Remove from stock. The invariant `stock_quantity >= 0` holds at all
    /// times: a decrement that would drive it negative fails and leaves the
    /// counter untouched.
    pub fn decrease_stock(&mut self, quantity: i64) -> Result<(), ItemError> {
        if quantity <= 0 {
            return Err(ItemError::InvalidQuantity(quantity));
        }
        if quantity > self.stock_quantity {
            return Err(ItemError::InsufficientStock {
                requested: quantity,
                available: self.stock_quantity,
            });
        }
        self.stock_quantity -= quantity;
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn book_with_stock(stock: i64) -> Item {
        Item::book("JPA1 BOOK", 10000, stock, "kim", "978-1")
    }

    #[test]
    fn test_decrease_stock_within_available() {
        let mut item = book_with_stock(100);
        item.decrease_stock(30).unwrap();
        assert_eq!(item.stock_quantity, 70);
    }

    #[test]
    fn test_decrease_stock_to_zero() {
        let mut item = book_with_stock(5);
        item.decrease_stock(5).unwrap();
        assert_eq!(item.stock_quantity, 0);
    }

    #[test]
    fn test_decrease_stock_beyond_available_fails_and_leaves_stock_unchanged() {
        let mut item = book_with_stock(1);
        let result = item.decrease_stock(2);
        assert!(matches!(
            result,
            Err(ItemError::InsufficientStock {
                requested: 2,
                available: 1
            })
        ));
        assert_eq!(item.stock_quantity, 1);
    }

    #[test]
    fn test_decrease_stock_rejects_non_positive_quantity() {
        let mut item = book_with_stock(10);
        assert!(matches!(
            item.decrease_stock(0),
            Err(ItemError::InvalidQuantity(0))
        ));
        assert!(matches!(
            item.decrease_stock(-3),
            Err(ItemError::InvalidQuantity(-3))
        ));
        assert_eq!(item.stock_quantity, 10);
    }

    #[test]
    fn test_increase_stock() {
        let mut item = book_with_stock(10);
        item.increase_stock(7);
        assert_eq!(item.stock_quantity, 17);
    }

    #[test]
    fn test_book_discriminator() {
        let item = book_with_stock(1);
        assert_eq!(item.kind.discriminator(), "B");
    }
}
