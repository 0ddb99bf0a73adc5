//! Catalog product documents.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use atelier_core::{Color, ImageId, ProductId, Size, StockStatus};

/// An uploaded product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: ImageId,
    /// Publicly addressable URL returned by object storage.
    pub url: String,
}

/// A catalog entry.
///
/// `quantity` is the stock counter; it never goes negative because the
/// decrement at order time is a conditional update that fails instead
/// of underflowing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    /// URL-safe unique handle, stored lowercase.
    pub slug: String,
    pub description: String,
    pub colors: Vec<Color>,
    pub sizes: Vec<Size>,
    pub price: Decimal,
    pub category: String,
    pub quantity: u32,
    pub sku: String,
    pub stock_status: StockStatus,
    pub featured: bool,
    pub imgs: Vec<ProductImage>,
}

impl Product {
    /// The first image's URL, used as the representative image in
    /// dashboards and review listings.
    #[must_use]
    pub fn hero_img(&self) -> Option<&str> {
        self.imgs.first().map(|img| img.url.as_str())
    }
}
