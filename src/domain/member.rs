use serde::{Deserialize, Serialize};

use super::value_objects::Address;

pub type MemberId = i64;

/// A registered member. Referenced, never owned, by orders.
///
/// The inverse `orders` collection is deliberately not modeled here; reverse
/// lookups go through the order search API instead of a stored back-list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: Option<MemberId>,
    pub name: String,
    pub address: Address,
}

impl Member {
    pub fn new(name: impl Into<String>, address: Address) -> Self {
        Self {
            id: None,
            name: name.into(),
            address,
        }
    }
}
