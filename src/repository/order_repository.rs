use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

use crate::domain::item::{Item, ItemKind};
use crate::domain::member::Member;
use crate::domain::order::{
    Delivery, DeliveryStatus, Order, OrderId, OrderItem, OrderStatus,
};
use crate::domain::value_objects::Address;
use crate::store::{Lazy, Resolve, Session, StoreError};

use super::search::{OrderSearch, Page, MAX_RESULTS};

/// Default number of orders whose line items are fetched per batch query.
pub const DEFAULT_BATCH_SIZE: usize = 100;

// ============================================================================
// Order Repository - aggregate writes + aggregate-returning search strategies
// ============================================================================
//
// Four of the search strategies live here; they return aggregates whose
// associations are unresolved, joined eagerly, or batch-resolved. The two
// projection strategies that bypass the aggregate are in `order_query`.
//
// All strategies answer the same logical query and return orders in
// ascending order id, so their results are interchangeable; only the
// round-trip/pagination/duplication profile differs.
//
// ============================================================================

pub struct OrderRepository;

impl OrderRepository {
    /// Persist a freshly built aggregate: the order row, its delivery and its
    /// line items, assigning identities and back-references as they insert.
    pub async fn save(session: &mut Session, order: &mut Order) -> Result<OrderId, StoreError> {
        let member_id = order.member_id().ok_or(StoreError::NotPersisted("member"))?;

        let result = sqlx::query("INSERT INTO orders (member_id, order_date, status) VALUES (?, ?, ?)")
            .bind(member_id)
            .bind(order.order_date)
            .bind(order.status.as_str())
            .execute(session.writer()?)
            .await?;
        let order_id = result.last_insert_rowid();
        order.id = Some(order_id);

        let delivery = order
            .delivery
            .get_mut()
            .ok_or(StoreError::UnresolvedAssociation("delivery"))?;
        delivery.order_id = Some(order_id);
        let result = sqlx::query(
            "INSERT INTO deliveries (order_id, city, street, zipcode, status) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(order_id)
        .bind(delivery.address.city())
        .bind(delivery.address.street())
        .bind(delivery.address.zipcode())
        .bind(delivery.status.as_str())
        .execute(session.writer()?)
        .await?;
        delivery.id = Some(result.last_insert_rowid());

        let order_items = order
            .order_items
            .get_mut()
            .ok_or(StoreError::UnresolvedAssociation("order_items"))?;
        for line in order_items.iter_mut() {
            line.order_id = Some(order_id);
            let item_id = line.item_id().ok_or(StoreError::NotPersisted("item"))?;
            let result = sqlx::query(
                "INSERT INTO order_items (order_id, item_id, order_price, count) VALUES (?, ?, ?, ?)",
            )
            .bind(order_id)
            .bind(item_id)
            .bind(line.order_price)
            .bind(line.count)
            .execute(session.writer()?)
            .await?;
            line.id = Some(result.last_insert_rowid());
        }

        debug!(order_id, lines = order_items.len(), "order aggregate saved");
        Ok(order_id)
    }

    /// Persist a status change (the only mutation the aggregate performs
    /// after creation).
    pub async fn save_status(session: &mut Session, order: &Order) -> Result<(), StoreError> {
        let id = order.id.ok_or(StoreError::NotPersisted("order"))?;
        sqlx::query("UPDATE orders SET status = ? WHERE order_id = ?")
            .bind(order.status.as_str())
            .bind(id)
            .execute(session.writer()?)
            .await?;
        Ok(())
    }

    /// Persist a delivery status change (READY -> COMP).
    pub async fn save_delivery_status(
        session: &mut Session,
        delivery: &Delivery,
    ) -> Result<(), StoreError> {
        let id = delivery.id.ok_or(StoreError::NotPersisted("delivery"))?;
        sqlx::query("UPDATE deliveries SET status = ? WHERE delivery_id = ?")
            .bind(delivery.status.as_str())
            .bind(id)
            .execute(session.writer()?)
            .await?;
        Ok(())
    }

    /// Load one order with every association unresolved.
    pub async fn find_one(session: &mut Session, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row =
            sqlx::query("SELECT order_id, member_id, order_date, status FROM orders WHERE order_id = ?")
                .bind(id)
                .fetch_optional(session.reader())
                .await?;
        row.map(|row| lazy_order(&row)).transpose()
    }

    /// Naive strategy: one query for the order rows, associations left as
    /// placeholders. Fully materializing N orders costs 1 + N (member)
    /// + N (delivery) + N (line-item collection) + one more per line item's
    /// catalog item -- the round-trip count scales with the result set.
    /// Supports pagination.
    pub async fn find_all(
        session: &mut Session,
        search: &OrderSearch,
        page: Page,
    ) -> Result<Vec<Order>, StoreError> {
        let (offset, limit) = page.window();
        let sql = format!(
            "SELECT o.order_id, o.member_id, o.order_date, o.status \
             FROM orders o \
             JOIN members m ON m.member_id = o.member_id{} \
             ORDER BY o.order_id LIMIT ? OFFSET ?",
            search.where_sql()
        );
        let rows = search
            .bind_to(sqlx::query(&sql))
            .bind(limit)
            .bind(offset)
            .fetch_all(session.reader())
            .await?;
        debug!(rows = rows.len(), "find_all (lazy)");
        rows.iter().map(lazy_order).collect()
    }

    /// To-one join strategy: member and delivery arrive in the single root
    /// query; the line-item collection is still lazy (1 round trip per order
    /// on access, plus one per catalog item). Supports pagination.
    pub async fn find_all_with_member_delivery(
        session: &mut Session,
        search: &OrderSearch,
        page: Page,
    ) -> Result<Vec<Order>, StoreError> {
        let (offset, limit) = page.window();
        let sql = format!(
            "SELECT o.order_id, o.order_date, o.status, \
                    m.member_id, m.name AS member_name, m.city AS member_city, \
                    m.street AS member_street, m.zipcode AS member_zipcode, \
                    d.delivery_id, d.city AS delivery_city, d.street AS delivery_street, \
                    d.zipcode AS delivery_zipcode, d.status AS delivery_status \
             FROM orders o \
             JOIN members m ON m.member_id = o.member_id \
             JOIN deliveries d ON d.order_id = o.order_id{} \
             ORDER BY o.order_id LIMIT ? OFFSET ?",
            search.where_sql()
        );
        let rows = search
            .bind_to(sqlx::query(&sql))
            .bind(limit)
            .bind(offset)
            .fetch_all(session.reader())
            .await?;
        debug!(rows = rows.len(), "find_all_with_member_delivery");
        rows.iter().map(joined_order).collect()
    }

    /// Collection-join strategy: one query joins member, delivery, line
    /// items and catalog items. The one-to-many join multiplies result rows
    /// (one per line item), which the loop below folds back together by
    /// order identity -- and which is also why offset/limit cannot be pushed
    /// to the store: a pagination request is rejected before any query is
    /// issued. The whole (capped) result set is transferred and deduplicated
    /// in memory.
    pub async fn find_all_with_items(
        session: &mut Session,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> Result<Vec<Order>, StoreError> {
        if page.is_some() {
            return Err(StoreError::UnsupportedQueryShape);
        }
        let sql = format!(
            "SELECT DISTINCT o.order_id, o.order_date, o.status, \
                    m.member_id, m.name AS member_name, m.city AS member_city, \
                    m.street AS member_street, m.zipcode AS member_zipcode, \
                    d.delivery_id, d.city AS delivery_city, d.street AS delivery_street, \
                    d.zipcode AS delivery_zipcode, d.status AS delivery_status, \
                    oi.order_item_id, oi.order_price, oi.count, \
                    i.item_id, i.kind AS item_kind, i.name AS item_name, i.price AS item_price, \
                    i.stock_quantity AS item_stock, i.author AS item_author, i.isbn AS item_isbn \
             FROM orders o \
             JOIN members m ON m.member_id = o.member_id \
             JOIN deliveries d ON d.order_id = o.order_id \
             JOIN order_items oi ON oi.order_id = o.order_id \
             JOIN items i ON i.item_id = oi.item_id{} \
             ORDER BY o.order_id, oi.order_item_id",
            search.where_sql()
        );
        let rows = search
            .bind_to(sqlx::query(&sql))
            .fetch_all(session.reader())
            .await?;

        let mut orders: Vec<Order> = Vec::new();
        for row in &rows {
            let order_id: i64 = row.try_get("order_id")?;
            let new_root = orders.last().and_then(|order| order.id) != Some(order_id);
            if new_root {
                if orders.len() as i64 >= MAX_RESULTS {
                    break;
                }
                let mut order = joined_order(row)?;
                order.order_items = Lazy::Resolved(Vec::new());
                orders.push(order);
            }
            let line = joined_order_item(row)?;
            if let Some(order) = orders.last_mut() {
                order.add_order_item(line);
            }
        }
        debug!(rows = rows.len(), orders = orders.len(), "find_all_with_items");
        Ok(orders)
    }

    /// To-one join plus batched collection resolution: the root query is the
    /// to-one join, then the line items of `batch_size` orders at a time are
    /// fetched (catalog item joined in) with an IN query -- 1 + ceil(N/B)
    /// round trips instead of 1 + N. Supports pagination.
    pub async fn find_all_batched(
        session: &mut Session,
        search: &OrderSearch,
        page: Page,
        batch_size: usize,
    ) -> Result<Vec<Order>, StoreError> {
        let mut orders = Self::find_all_with_member_delivery(session, search, page).await?;
        let ids: Vec<i64> = orders.iter().filter_map(|order| order.id).collect();

        let mut lines: HashMap<i64, Vec<OrderItem>> = HashMap::new();
        for chunk in ids.chunks(batch_size.max(1)) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT oi.order_item_id, oi.order_id, oi.order_price, oi.count, \
                        i.item_id, i.kind AS item_kind, i.name AS item_name, i.price AS item_price, \
                        i.stock_quantity AS item_stock, i.author AS item_author, i.isbn AS item_isbn \
                 FROM order_items oi \
                 JOIN items i ON i.item_id = oi.item_id \
                 WHERE oi.order_id IN ({placeholders}) \
                 ORDER BY oi.order_item_id"
            );
            let mut query = sqlx::query(&sql);
            for id in chunk {
                query = query.bind(*id);
            }
            let rows = query.fetch_all(session.reader()).await?;
            for row in &rows {
                let order_id: i64 = row.try_get("order_id")?;
                lines.entry(order_id).or_default().push(joined_order_item(row)?);
            }
        }

        for order in &mut orders {
            let id = order.id.ok_or(StoreError::NotPersisted("order"))?;
            let collected = lines.remove(&id).unwrap_or_default();
            order.order_items = Lazy::Resolved(Vec::new());
            for line in collected {
                order.add_order_item(line);
            }
        }
        Ok(orders)
    }

    /// Resolve everything below `order` the naive way: member, delivery, the
    /// line-item collection, then each line's catalog item -- one round trip
    /// per still-unresolved association.
    pub async fn resolve_graph(session: &mut Session, order: &mut Order) -> Result<(), StoreError> {
        order.member.resolve(session).await?;
        order.delivery.resolve(session).await?;
        order.order_items.resolve(session).await?;
        if let Some(lines) = order.order_items.get_mut() {
            for line in lines.iter_mut() {
                line.item.resolve(session).await?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Row Mapping
// ============================================================================

fn parse_order_status(raw: String) -> Result<OrderStatus, StoreError> {
    match OrderStatus::parse(&raw) {
        Some(status) => Ok(status),
        None => Err(StoreError::InvalidColumn {
            field: "status",
            value: raw,
        }),
    }
}

fn parse_delivery_status(raw: String) -> Result<DeliveryStatus, StoreError> {
    match DeliveryStatus::parse(&raw) {
        Some(status) => Ok(status),
        None => Err(StoreError::InvalidColumn {
            field: "delivery_status",
            value: raw,
        }),
    }
}

/// Order row with every association left as a placeholder.
fn lazy_order(row: &SqliteRow) -> Result<Order, StoreError> {
    let id: i64 = row.try_get("order_id")?;
    Ok(Order {
        id: Some(id),
        member: Lazy::Unresolved(row.try_get("member_id")?),
        delivery: Lazy::Unresolved(id),
        order_items: Lazy::Unresolved(id),
        order_date: row.try_get("order_date")?,
        status: parse_order_status(row.try_get("status")?)?,
    })
}

/// Order row from a to-one join: member and delivery resolved, line items
/// still a placeholder.
fn joined_order(row: &SqliteRow) -> Result<Order, StoreError> {
    let id: i64 = row.try_get("order_id")?;
    let member = Member {
        id: Some(row.try_get("member_id")?),
        name: row.try_get("member_name")?,
        address: Address::new(
            row.try_get::<String, _>("member_city")?,
            row.try_get::<String, _>("member_street")?,
            row.try_get::<String, _>("member_zipcode")?,
        ),
    };
    let delivery = Delivery {
        id: Some(row.try_get("delivery_id")?),
        order_id: Some(id),
        address: Address::new(
            row.try_get::<String, _>("delivery_city")?,
            row.try_get::<String, _>("delivery_street")?,
            row.try_get::<String, _>("delivery_zipcode")?,
        ),
        status: parse_delivery_status(row.try_get("delivery_status")?)?,
    };
    Ok(Order {
        id: Some(id),
        member: Lazy::Resolved(member),
        delivery: Lazy::Resolved(delivery),
        order_items: Lazy::Unresolved(id),
        order_date: row.try_get("order_date")?,
        status: parse_order_status(row.try_get("status")?)?,
    })
}

/// Line item from a row that joins the catalog item (aliased `item_*`).
/// The back-reference is wired by `Order::add_order_item`.
fn joined_order_item(row: &SqliteRow) -> Result<OrderItem, StoreError> {
    let raw_kind: String = row.try_get("item_kind")?;
    let kind = ItemKind::from_discriminator(
        &raw_kind,
        row.try_get("item_author")?,
        row.try_get("item_isbn")?,
    )
    .ok_or(StoreError::InvalidColumn {
        field: "kind",
        value: raw_kind,
    })?;
    let item = Item {
        id: Some(row.try_get("item_id")?),
        name: row.try_get("item_name")?,
        price: row.try_get("item_price")?,
        stock_quantity: row.try_get("item_stock")?,
        kind,
    };
    Ok(OrderItem {
        id: Some(row.try_get("order_item_id")?),
        order_id: None,
        item: Lazy::Resolved(item),
        order_price: row.try_get("order_price")?,
        count: row.try_get("count")?,
    })
}

// ============================================================================
// Association Resolvers
// ============================================================================

#[async_trait]
impl Resolve for Delivery {
    const ASSOCIATION: &'static str = "delivery";

    /// Key: the owning order's id (the one-to-one is stored on the delivery
    /// side).
    async fn load(session: &mut Session, key: i64) -> Result<Self, StoreError> {
        let row = sqlx::query(
            "SELECT delivery_id, order_id, city, street, zipcode, status \
             FROM deliveries WHERE order_id = ?",
        )
        .bind(key)
        .fetch_optional(session.reader())
        .await?
        .ok_or(StoreError::NotFound {
            entity: "delivery",
            id: key,
        })?;
        Ok(Delivery {
            id: Some(row.try_get("delivery_id")?),
            order_id: Some(row.try_get("order_id")?),
            address: Address::new(
                row.try_get::<String, _>("city")?,
                row.try_get::<String, _>("street")?,
                row.try_get::<String, _>("zipcode")?,
            ),
            status: parse_delivery_status(row.try_get("status")?)?,
        })
    }
}

#[async_trait]
impl Resolve for Vec<OrderItem> {
    const ASSOCIATION: &'static str = "order_items";

    /// Key: the owning order's id. Line items arrive with their catalog item
    /// unresolved; each one costs a further round trip on access.
    async fn load(session: &mut Session, key: i64) -> Result<Self, StoreError> {
        let rows = sqlx::query(
            "SELECT order_item_id, order_id, item_id, order_price, count \
             FROM order_items WHERE order_id = ? ORDER BY order_item_id",
        )
        .bind(key)
        .fetch_all(session.reader())
        .await?;
        rows.iter().map(lazy_order_item).collect()
    }
}

fn lazy_order_item(row: &SqliteRow) -> Result<OrderItem, StoreError> {
    Ok(OrderItem {
        id: Some(row.try_get("order_item_id")?),
        order_id: Some(row.try_get("order_id")?),
        item: Lazy::Unresolved(row.try_get("item_id")?),
        order_price: row.try_get("order_price")?,
        count: row.try_get("count")?,
    })
}
