//! Order documents.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use atelier_core::{Color, OrderId, OrderStatus, ProductId, Size, UserId};

use super::Address;

/// A single ordered line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub color: Color,
    pub size: Size,
    pub quantity: u32,
    /// Unit price at the time the order was placed.
    pub price: Decimal,
    pub img_url: String,
}

/// An order header.
///
/// Everything except `status` is immutable once placed. The invariant
/// `total == subtotal + tax` is enforced at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Human-facing order number: epoch millis plus a random suffix.
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
