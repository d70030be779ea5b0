use tracing::info;

use crate::domain::item::ItemId;
use crate::domain::member::MemberId;
use crate::domain::order::{Delivery, Order, OrderId, OrderItem};
use crate::repository::order_query::{OrderQueryRepository, OrderView};
use crate::repository::search::{OrderSearch, Page};
use crate::repository::{ItemRepository, MemberRepository, OrderRepository};
use crate::store::{Store, StoreError};

use super::errors::ServiceError;

// ============================================================================
// Order Service
// ============================================================================

/// Mutation facade over the order aggregate. Every operation owns exactly one
/// unit of work: it either commits everything or leaves no trace behind.
pub struct OrderService {
    store: Store,
}

impl OrderService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Place an order of `count` units of one catalog item.
    ///
    /// Looks up the member and item, copies the member's address into a new
    /// delivery, consumes stock through the line-item constructor, and
    /// persists the stock decrement together with the whole aggregate. A
    /// failure at any step (unknown id, insufficient stock) rolls the unit
    /// of work back; no partial order is ever visible.
    pub async fn place_order(
        &self,
        member_id: MemberId,
        item_id: ItemId,
        count: i64,
    ) -> Result<OrderId, ServiceError> {
        let mut session = self.store.read_write().await?;

        let member = MemberRepository::find_one(&mut session, member_id)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "member",
                id: member_id,
            })?;
        let item = ItemRepository::find_one(&mut session, item_id)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "item",
                id: item_id,
            })?;

        let delivery = Delivery::new(member.address.clone());
        let order_price = item.price;
        let order_item = OrderItem::create_order_item(item, order_price, count)?;
        let stocked = order_item.item.require("item")?;
        ItemRepository::save_stock(&mut session, stocked).await?;

        let mut order = Order::create_order(member, delivery, vec![order_item])?;
        let order_id = OrderRepository::save(&mut session, &mut order).await?;
        session.commit().await?;

        info!(order_id, member_id, item_id, count, "order placed");
        Ok(order_id)
    }

    /// Cancel an order: flip the status and give the consumed stock back to
    /// the catalog.
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<(), ServiceError> {
        let mut session = self.store.read_write().await?;

        let mut order = OrderRepository::find_one(&mut session, order_id)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "order",
                id: order_id,
            })?;

        // Cancellation touches the delivery, the line items and their
        // catalog items; resolve them inside this unit of work.
        order.delivery.resolve(&mut session).await?;
        order.order_items.resolve(&mut session).await?;
        if let Some(lines) = order.order_items.get_mut() {
            for line in lines.iter_mut() {
                line.item.resolve(&mut session).await?;
            }
        }

        order.cancel()?;

        OrderRepository::save_status(&mut session, &order).await?;
        if let Some(lines) = order.order_items.get() {
            for line in lines {
                let item_id = line.item_id().ok_or(StoreError::NotPersisted("item"))?;
                ItemRepository::restock(&mut session, item_id, line.count).await?;
            }
        }
        session.commit().await?;

        info!(order_id, "order cancelled");
        Ok(())
    }

    /// Search facade for callers that do not manage their own session.
    ///
    /// Uses the two-query projection strategy (one root query plus one
    /// line-item query); callers that want a different round-trip trade-off
    /// should pick a strategy on the repositories directly, inside their own
    /// unit of work.
    pub async fn find_orders(
        &self,
        search: &OrderSearch,
        page: Page,
    ) -> Result<Vec<OrderView>, ServiceError> {
        let mut session = self.store.read_only().await?;
        let views = OrderQueryRepository::find_order_views(&mut session, search, page).await?;
        session.commit().await?;
        Ok(views)
    }
}
