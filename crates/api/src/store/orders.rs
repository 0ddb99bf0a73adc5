//! Order collection operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use atelier_core::{OrderId, OrderStatus, UserId};

use super::StoreResult;
use crate::models::{Address, Order, OrderItem};

/// An inclusive UTC time range used for windowed queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Whether `at` falls within this range (inclusive bounds).
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}

/// Fields for an order document about to be inserted.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: u64,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub shipping_address: Address,
    pub placed_at: DateTime<Utc>,
}

/// Projection of a completed order used by analytics.
#[derive(Debug, Clone)]
pub struct CompletedOrder {
    pub total: Decimal,
    pub placed_at: DateTime<Utc>,
    pub user_id: UserId,
}

/// Store operations for the `orders` collection.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// The most recently placed orders, newest first.
    async fn recent(&self, limit: usize) -> StoreResult<Vec<Order>>;

    /// All orders placed by one user.
    async fn find_by_user(&self, user_id: &UserId) -> StoreResult<Vec<Order>>;

    /// Find an order by id.
    async fn find_by_id(&self, id: &OrderId) -> StoreResult<Option<Order>>;

    /// Find an order by its order number.
    async fn find_by_number(&self, order_number: u64) -> StoreResult<Option<Order>>;

    /// Insert a new order.
    async fn insert(&self, new: NewOrder) -> StoreResult<Order>;

    /// Update an order's status; returns whether a record was modified.
    async fn set_status(&self, id: &OrderId, status: OrderStatus) -> StoreResult<bool>;

    /// Completed orders placed within `range`, projected for analytics.
    async fn completed_in(&self, range: &TimeRange) -> StoreResult<Vec<CompletedOrder>>;

    /// Line items of completed orders placed within `range`.
    async fn completed_items_in(&self, range: &TimeRange) -> StoreResult<Vec<OrderItem>>;
}
