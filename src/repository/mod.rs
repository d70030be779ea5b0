// ============================================================================
// Repositories - persistence and the query strategy engine
// ============================================================================
//
// - member_repository / item_repository: boundary persistence for the
//   entities orders reference
// - order_repository: aggregate writes plus the aggregate-returning search
//   strategies (naive, to-one join, collection join, batched)
// - order_query: the projection strategies (two-query, single flat query)
//   that bypass the aggregate entirely
// - search: the structured predicate builder and pagination window shared by
//   every strategy
//
// Every operation takes the unit-of-work handle explicitly.
//
// ============================================================================

pub mod item_repository;
pub mod member_repository;
pub mod order_query;
pub mod order_repository;
pub mod search;

pub use item_repository::ItemRepository;
pub use member_repository::MemberRepository;
pub use order_query::OrderQueryRepository;
pub use order_repository::OrderRepository;
pub use search::{OrderSearch, Page, MAX_RESULTS};
