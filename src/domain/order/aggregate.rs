use chrono::{DateTime, Utc};

use crate::domain::item::{Item, ItemId};
use crate::domain::member::{Member, MemberId};
use crate::domain::value_objects::Address;
use crate::store::Lazy;

use super::errors::OrderError;
use super::value_objects::{DeliveryStatus, OrderStatus};

pub type OrderId = i64;
pub type OrderItemId = i64;
pub type DeliveryId = i64;

// ============================================================================
// Order Aggregate - Domain Logic
// ============================================================================
//
// Order owns its Delivery and OrderItems exclusively; the three are created
// together and persisted atomically. The Member is referenced, not owned.
// To-one and to-many associations are `Lazy` placeholders so that a loaded
// order never hides I/O behind a field access.
//
// ============================================================================

#[derive(Debug, Clone)]
pub struct Order {
    pub id: Option<OrderId>,
    /// Referenced member; unresolved key is the member id.
    pub member: Lazy<Member>,
    /// Owned delivery record; unresolved key is the owning order id.
    pub delivery: Lazy<Delivery>,
    /// Owned line items; unresolved key is the owning order id.
    pub order_items: Lazy<Vec<OrderItem>>,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
}

impl Order {
    /// Build a new order in status ORDER, stamped with the current time.
    ///
    /// Wires every supplied line item into the aggregate via
    /// [`Order::add_order_item`]; the aggregate root is the sole writer of
    /// child back-references.
    pub fn create_order(
        member: Member,
        delivery: Delivery,
        order_items: Vec<OrderItem>,
    ) -> Result<Self, OrderError> {
        if order_items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }

        let mut order = Self {
            id: None,
            member: Lazy::Resolved(member),
            delivery: Lazy::Resolved(delivery),
            order_items: Lazy::Resolved(Vec::with_capacity(order_items.len())),
            order_date: Utc::now(),
            status: OrderStatus::Order,
        };
        for order_item in order_items {
            order.add_order_item(order_item);
        }
        Ok(order)
    }

    /// Attach a line item and point its back-reference at this order.
    pub fn add_order_item(&mut self, mut order_item: OrderItem) {
        order_item.order_id = self.id;
        match &mut self.order_items {
            Lazy::Resolved(items) => items.push(order_item),
            lazy @ Lazy::Unresolved(_) => *lazy = Lazy::Resolved(vec![order_item]),
        }
    }

    /// Cancel the order and restore the catalog stock consumed at placement.
    ///
    /// Fails with [`OrderError::AlreadyDelivered`] once the delivery is
    /// completed and with [`OrderError::AlreadyCancelled`] on a second
    /// cancellation (CANCEL is terminal; restocking twice would corrupt the
    /// counters). The delivery, the line items and their catalog items must
    /// all be resolved; nothing is mutated until every precondition holds.
    ///
    /// This is a compensating action, not a deletion: the historical
    /// order_price and count are retained.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        if self.status == OrderStatus::Cancel {
            return Err(OrderError::AlreadyCancelled);
        }
        let delivery = self
            .delivery
            .get()
            .ok_or(OrderError::Unresolved("delivery"))?;
        if delivery.status == DeliveryStatus::Comp {
            return Err(OrderError::AlreadyDelivered);
        }

        let order_items = self
            .order_items
            .get_mut()
            .ok_or(OrderError::Unresolved("order_items"))?;
        if order_items.iter().any(|line| !line.item.is_resolved()) {
            return Err(OrderError::Unresolved("order_items.item"));
        }

        for line in order_items.iter_mut() {
            line.cancel()?;
        }
        self.status = OrderStatus::Cancel;
        Ok(())
    }

    /// Total order price: the sum of `order_price * count` over the line
    /// items. Pure read, never stored redundantly.
    pub fn total_price(&self) -> Result<i64, OrderError> {
        let order_items = self
            .order_items
            .get()
            .ok_or(OrderError::Unresolved("order_items"))?;
        Ok(order_items.iter().map(OrderItem::total_price).sum())
    }

    /// Member id regardless of whether the association is resolved.
    pub fn member_id(&self) -> Option<MemberId> {
        match &self.member {
            Lazy::Unresolved(id) => Some(*id),
            Lazy::Resolved(member) => member.id,
        }
    }
}

// ============================================================================
// Order Item - price/count snapshot of one catalog item
// ============================================================================

#[derive(Debug, Clone)]
pub struct OrderItem {
    pub id: Option<OrderItemId>,
    /// Back-reference to the owning order; written by the aggregate root.
    pub order_id: Option<OrderId>,
    /// Referenced catalog item; unresolved key is the item id.
    pub item: Lazy<Item>,
    /// Price at the time of purchase. Never re-read from the catalog.
    pub order_price: i64,
    pub count: i64,
}

impl OrderItem {
    /// Build a line item and consume `count` units of the catalog item's
    /// stock. The stock decrement happening here, paired with the restore in
    /// [`OrderItem::cancel`], keeps placement and cancellation symmetric.
    pub fn create_order_item(mut item: Item, order_price: i64, count: i64) -> Result<Self, OrderError> {
        if count <= 0 {
            return Err(OrderError::InvalidCount(count));
        }
        item.decrease_stock(count)?;
        Ok(Self {
            id: None,
            order_id: None,
            item: Lazy::Resolved(item),
            order_price,
            count,
        })
    }

    /// Give the consumed stock back to the catalog item.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        let count = self.count;
        let item = self
            .item
            .get_mut()
            .ok_or(OrderError::Unresolved("order_item.item"))?;
        item.increase_stock(count);
        Ok(())
    }

    pub fn total_price(&self) -> i64 {
        self.order_price * self.count
    }

    /// Catalog item id regardless of whether the association is resolved.
    pub fn item_id(&self) -> Option<ItemId> {
        match &self.item {
            Lazy::Unresolved(id) => Some(*id),
            Lazy::Resolved(item) => item.id,
        }
    }
}

// ============================================================================
// Delivery - owned one-to-one record
// ============================================================================

#[derive(Debug, Clone)]
pub struct Delivery {
    pub id: Option<DeliveryId>,
    /// Back-reference to the owning order; written by the aggregate root.
    pub order_id: Option<OrderId>,
    /// Copied from the member at order time.
    pub address: Address,
    pub status: DeliveryStatus,
}

impl Delivery {
    pub fn new(address: Address) -> Self {
        Self {
            id: None,
            order_id: None,
            address,
            status: DeliveryStatus::Ready,
        }
    }

    /// Mark the delivery completed. One-way; a completed delivery blocks
    /// cancellation of its order.
    pub fn complete(&mut self) {
        self.status = DeliveryStatus::Comp;
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
