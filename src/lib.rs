//! Order-management data layer for a small commerce domain.
//!
//! Members place orders composed of line items against a stock-tracked
//! catalog. The crate owns two things: the [`Order`] aggregate's consistency
//! rules (stock mutation under placement and cancellation) and a
//! multi-strategy read engine that materializes orders with their nested
//! member/delivery/line-item data under different round-trip, pagination and
//! duplication trade-offs.
//!
//! All persistence goes through an explicit unit of work ([`Session`]) opened
//! from a [`Store`]. Associations are represented as [`Lazy`] placeholders;
//! resolving one is an explicit call against the live session, so every
//! round trip is visible at the call site (and in
//! [`Session::round_trips`]).

pub mod domain;
pub mod repository;
pub mod service;
pub mod store;

pub use domain::item::{Item, ItemError, ItemId, ItemKind};
pub use domain::member::{Member, MemberId};
pub use domain::order::{
    Delivery, DeliveryId, DeliveryStatus, Order, OrderError, OrderId, OrderItem, OrderItemId,
    OrderStatus,
};
pub use domain::value_objects::Address;
pub use repository::order_query::{
    group_order_rows, OrderFlatRow, OrderItemView, OrderQueryRepository, OrderSummaryView,
    OrderView,
};
pub use repository::order_repository::OrderRepository;
pub use repository::search::{OrderSearch, Page, MAX_RESULTS};
pub use repository::{ItemRepository, MemberRepository};
pub use service::{OrderService, ServiceError};
pub use store::{Lazy, Resolve, Session, SessionMode, Store, StoreError};
