use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::Sqlite;

use crate::domain::order::OrderStatus;

// ============================================================================
// Search Filter + Pagination Window
// ============================================================================

/// Hard ceiling on any search result set, regardless of paging.
pub const MAX_RESULTS: i64 = 1000;

/// Filter over orders. Clauses combine with AND; an empty filter matches
/// everything (still capped at [`MAX_RESULTS`]).
///
/// The filter is a structured predicate builder: each optional clause is
/// compiled into the strategy's SQL once, in a fixed order, and the values
/// are bound positionally -- never spliced into the query text.
#[derive(Debug, Clone, Default)]
pub struct OrderSearch {
    pub status: Option<OrderStatus>,
    /// Substring match on the member name.
    pub member_name: Option<String>,
}

impl OrderSearch {
    pub fn by_status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn by_member_name(name: impl Into<String>) -> Self {
        Self {
            member_name: Some(name.into()),
            ..Self::default()
        }
    }

    fn clauses(&self) -> Vec<&'static str> {
        let mut clauses = Vec::new();
        if self.status.is_some() {
            clauses.push("o.status = ?");
        }
        if self.member_name.is_some() {
            clauses.push("m.name LIKE ?");
        }
        clauses
    }

    /// The WHERE fragment (with a leading space), or an empty string when no
    /// clause applies. `o` must alias orders and `m` members.
    pub(crate) fn where_sql(&self) -> String {
        let clauses = self.clauses();
        if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        }
    }

    /// Bind the filter values in clause order.
    pub(crate) fn bind_to<'q>(
        &self,
        mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        if let Some(status) = self.status {
            query = query.bind(status.as_str());
        }
        if let Some(name) = &self.member_name {
            query = query.bind(format!("%{name}%"));
        }
        query
    }
}

/// Offset/limit window for the strategies that support pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: i64,
    pub limit: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 100,
        }
    }
}

impl Page {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self { offset, limit }
    }

    /// The whole result set in one window (up to the cap).
    pub fn all() -> Self {
        Self {
            offset: 0,
            limit: MAX_RESULTS,
        }
    }

    /// Effective `(offset, limit)` after clipping against [`MAX_RESULTS`]:
    /// no window may reach past the first 1000 rows, however it is paged.
    pub(crate) fn window(&self) -> (i64, i64) {
        let offset = self.offset.max(0);
        let remaining = (MAX_RESULTS - offset).max(0);
        let limit = self.limit.clamp(0, remaining);
        (offset, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_has_no_where_clause() {
        assert_eq!(OrderSearch::default().where_sql(), "");
    }

    #[test]
    fn test_single_clause() {
        let search = OrderSearch::by_status(OrderStatus::Cancel);
        assert_eq!(search.where_sql(), " WHERE o.status = ?");

        let search = OrderSearch::by_member_name("userA");
        assert_eq!(search.where_sql(), " WHERE m.name LIKE ?");
    }

    #[test]
    fn test_clauses_combine_with_and_in_fixed_order() {
        let search = OrderSearch {
            status: Some(OrderStatus::Order),
            member_name: Some("userA".into()),
        };
        assert_eq!(search.where_sql(), " WHERE o.status = ? AND m.name LIKE ?");
    }

    #[test]
    fn test_default_page() {
        let page = Page::default();
        assert_eq!((page.offset, page.limit), (0, 100));
    }

    #[test]
    fn test_window_clips_against_the_ceiling() {
        assert_eq!(Page::new(0, 100).window(), (0, 100));
        assert_eq!(Page::new(0, 5000).window(), (0, MAX_RESULTS));
        assert_eq!(Page::new(950, 100).window(), (950, 50));
        assert_eq!(Page::new(2000, 100).window(), (2000, 0));
        assert_eq!(Page::new(-5, 10).window(), (0, 10));
    }
}
