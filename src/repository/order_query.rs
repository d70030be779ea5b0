use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

use crate::domain::order::{Order, OrderError, OrderStatus};
use crate::domain::value_objects::Address;
use crate::store::{Session, StoreError};

use super::search::{OrderSearch, Page, MAX_RESULTS};

// ============================================================================
// Read Projections - flattened shapes that bypass the aggregate
// ============================================================================
//
// These strategies select exactly the columns the view needs and never
// materialize the aggregate graph. The field names and nesting below are the
// stable contract shared by every strategy, so callers stay
// strategy-agnostic.
//
// ============================================================================

/// Order-level view with its line items.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub order_id: i64,
    pub member_name: String,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    /// Delivery address (the member's address as of order time).
    pub address: Address,
    pub order_items: Vec<OrderItemView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub item_name: String,
    pub order_price: i64,
    pub count: i64,
}

/// To-one-only view: order, member name and delivery address without the
/// line-item collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummaryView {
    pub order_id: i64,
    pub member_name: String,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub address: Address,
}

/// One row of the single-query flat join: order-level fields repeated once
/// per line item.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderFlatRow {
    pub order_id: i64,
    pub member_name: String,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub address: Address,
    pub item_name: String,
    pub order_price: i64,
    pub count: i64,
}

impl OrderView {
    /// Flatten a fully resolved aggregate into the projection shape. This is
    /// how the aggregate-returning strategies meet the same contract as the
    /// projection queries.
    pub fn from_order(order: &Order) -> Result<Self, OrderError> {
        let order_id = order.id.ok_or(OrderError::NotPersisted)?;
        let member = order.member.get().ok_or(OrderError::Unresolved("member"))?;
        let delivery = order
            .delivery
            .get()
            .ok_or(OrderError::Unresolved("delivery"))?;
        let lines = order
            .order_items
            .get()
            .ok_or(OrderError::Unresolved("order_items"))?;

        let order_items = lines
            .iter()
            .map(|line| {
                let item = line
                    .item
                    .get()
                    .ok_or(OrderError::Unresolved("order_item.item"))?;
                Ok(OrderItemView {
                    item_name: item.name.clone(),
                    order_price: line.order_price,
                    count: line.count,
                })
            })
            .collect::<Result<Vec<_>, OrderError>>()?;

        Ok(Self {
            order_id,
            member_name: member.name.clone(),
            order_date: order.order_date,
            status: order.status,
            address: delivery.address.clone(),
            order_items,
        })
    }
}

pub struct OrderQueryRepository;

impl OrderQueryRepository {
    /// To-one projection in one round trip: order, member name and delivery
    /// address, no line items. Also serves as the root query of
    /// [`OrderQueryRepository::find_order_views`]. Supports pagination.
    pub async fn find_order_summaries(
        session: &mut Session,
        search: &OrderSearch,
        page: Page,
    ) -> Result<Vec<OrderSummaryView>, StoreError> {
        let (offset, limit) = page.window();
        let sql = format!(
            "SELECT o.order_id, m.name AS member_name, o.order_date, o.status, \
                    d.city, d.street, d.zipcode \
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
        rows.iter().map(row_to_summary).collect()
    }

    /// Two-query strategy: the paginated root projection plus one line-item
    /// projection keyed by the returned order ids, grouped client-side. Two
    /// round trips for any number of orders; pagination applies to the root
    /// query.
    pub async fn find_order_views(
        session: &mut Session,
        search: &OrderSearch,
        page: Page,
    ) -> Result<Vec<OrderView>, StoreError> {
        let summaries = Self::find_order_summaries(session, search, page).await?;
        if summaries.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = summaries.iter().map(|summary| summary.order_id).collect();
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT oi.order_id, i.name AS item_name, oi.order_price, oi.count \
             FROM order_items oi \
             JOIN items i ON i.item_id = oi.item_id \
             WHERE oi.order_id IN ({placeholders}) \
             ORDER BY oi.order_id, oi.order_item_id"
        );
        let mut query = sqlx::query(&sql);
        for id in &ids {
            query = query.bind(*id);
        }
        let rows = query.fetch_all(session.reader()).await?;

        let mut lines: HashMap<i64, Vec<OrderItemView>> = HashMap::new();
        for row in &rows {
            let order_id: i64 = row.try_get("order_id")?;
            lines.entry(order_id).or_default().push(OrderItemView {
                item_name: row.try_get("item_name")?,
                order_price: row.try_get("order_price")?,
                count: row.try_get("count")?,
            });
        }

        debug!(orders = summaries.len(), lines = rows.len(), "find_order_views");
        Ok(summaries
            .into_iter()
            .map(|summary| {
                let order_items = lines.remove(&summary.order_id).unwrap_or_default();
                OrderView {
                    order_id: summary.order_id,
                    member_name: summary.member_name,
                    order_date: summary.order_date,
                    status: summary.status,
                    address: summary.address,
                    order_items,
                }
            })
            .collect())
    }

    /// Single flat query strategy: every level joined, one result row per
    /// line item, regrouped by [`group_order_rows`]. One round trip, at the
    /// cost of transferring the order-level fields once per item row -- and,
    /// like every collection join, the shape cannot be paginated.
    pub async fn find_order_views_flat(
        session: &mut Session,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> Result<Vec<OrderView>, StoreError> {
        let rows = Self::find_order_flat_rows(session, search, page).await?;
        Ok(group_order_rows(rows))
    }

    /// The raw flat rows, for callers that do their own grouping.
    pub async fn find_order_flat_rows(
        session: &mut Session,
        search: &OrderSearch,
        page: Option<Page>,
    ) -> Result<Vec<OrderFlatRow>, StoreError> {
        if page.is_some() {
            return Err(StoreError::UnsupportedQueryShape);
        }
        let sql = format!(
            "SELECT o.order_id, m.name AS member_name, o.order_date, o.status, \
                    d.city, d.street, d.zipcode, \
                    i.name AS item_name, oi.order_price, oi.count \
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
        rows.iter().map(row_to_flat).collect()
    }
}

/// Group flat rows into nested views.
///
/// The key is the composite of all order-level fields -- not just the order
/// id -- so the view is assembled from the rows alone, without a second
/// lookup; line items are collected in row-arrival order. Capped at
/// [`MAX_RESULTS`] distinct orders.
pub fn group_order_rows(rows: Vec<OrderFlatRow>) -> Vec<OrderView> {
    #[derive(PartialEq, Eq, Hash)]
    struct OrderKey {
        order_id: i64,
        member_name: String,
        order_date: DateTime<Utc>,
        status: OrderStatus,
        address: Address,
    }

    let mut index: HashMap<OrderKey, usize> = HashMap::new();
    let mut views: Vec<OrderView> = Vec::new();
    for row in rows {
        let key = OrderKey {
            order_id: row.order_id,
            member_name: row.member_name.clone(),
            order_date: row.order_date,
            status: row.status,
            address: row.address.clone(),
        };
        let line = OrderItemView {
            item_name: row.item_name,
            order_price: row.order_price,
            count: row.count,
        };
        match index.entry(key) {
            Entry::Occupied(slot) => views[*slot.get()].order_items.push(line),
            Entry::Vacant(slot) => {
                slot.insert(views.len());
                views.push(OrderView {
                    order_id: row.order_id,
                    member_name: row.member_name,
                    order_date: row.order_date,
                    status: row.status,
                    address: row.address,
                    order_items: vec![line],
                });
            }
        }
    }
    views.truncate(MAX_RESULTS as usize);
    views
}

fn row_to_summary(row: &SqliteRow) -> Result<OrderSummaryView, StoreError> {
    let raw_status: String = row.try_get("status")?;
    let status = match OrderStatus::parse(&raw_status) {
        Some(status) => status,
        None => {
            return Err(StoreError::InvalidColumn {
                field: "status",
                value: raw_status,
            })
        }
    };
    Ok(OrderSummaryView {
        order_id: row.try_get("order_id")?,
        member_name: row.try_get("member_name")?,
        order_date: row.try_get("order_date")?,
        status,
        address: Address::new(
            row.try_get::<String, _>("city")?,
            row.try_get::<String, _>("street")?,
            row.try_get::<String, _>("zipcode")?,
        ),
    })
}

fn row_to_flat(row: &SqliteRow) -> Result<OrderFlatRow, StoreError> {
    let summary = row_to_summary(row)?;
    Ok(OrderFlatRow {
        order_id: summary.order_id,
        member_name: summary.member_name,
        order_date: summary.order_date,
        status: summary.status,
        address: summary.address,
        item_name: row.try_get("item_name")?,
        order_price: row.try_get("order_price")?,
        count: row.try_get("count")?,
    })
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn flat_row(order_id: i64, member: &str, item: &str, price: i64, count: i64) -> OrderFlatRow {
        OrderFlatRow {
            order_id,
            member_name: member.to_string(),
            order_date: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            status: OrderStatus::Order,
            address: Address::new("Seoul", "1", "111"),
            item_name: item.to_string(),
            order_price: price,
            count,
        }
    }

    #[test]
    fn test_grouping_folds_duplicate_order_rows() {
        let rows = vec![
            flat_row(1, "userA", "JPA1 BOOK", 10000, 1),
            flat_row(1, "userA", "JPA2 BOOK", 20000, 2),
            flat_row(2, "userB", "SPRING1 BOOK", 20000, 3),
        ];

        let views = group_order_rows(rows);

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].order_id, 1);
        assert_eq!(views[0].member_name, "userA");
        assert_eq!(
            views[0]
                .order_items
                .iter()
                .map(|line| line.item_name.as_str())
                .collect::<Vec<_>>(),
            vec!["JPA1 BOOK", "JPA2 BOOK"]
        );
        assert_eq!(views[1].order_id, 2);
        assert_eq!(views[1].order_items.len(), 1);
    }

    #[test]
    fn test_grouping_preserves_arrival_order() {
        let rows = vec![
            flat_row(5, "userB", "SPRING2 BOOK", 40000, 4),
            flat_row(3, "userA", "JPA1 BOOK", 10000, 1),
        ];

        let views = group_order_rows(rows);

        // Whatever order the rows arrive in is the order of the views.
        assert_eq!(views[0].order_id, 5);
        assert_eq!(views[1].order_id, 3);
    }

    #[test]
    fn test_grouping_keys_on_every_order_level_field() {
        // Same member name on two different orders must not merge.
        let rows = vec![
            flat_row(1, "userA", "JPA1 BOOK", 10000, 1),
            flat_row(2, "userA", "JPA2 BOOK", 20000, 2),
        ];

        let views = group_order_rows(rows);

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].order_items.len(), 1);
        assert_eq!(views[1].order_items.len(), 1);
    }

    #[test]
    fn test_empty_rows_group_to_empty_views() {
        assert!(group_order_rows(Vec::new()).is_empty());
    }
}
