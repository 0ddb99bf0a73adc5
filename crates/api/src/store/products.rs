//! Product collection operations.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use atelier_core::{Color, ProductId, Size, StockStatus};

use super::StoreResult;
use crate::models::{Product, ProductImage};

/// Fields for a product document about to be inserted.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub title: String,
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

/// Full-document replacement for a product edit.
#[derive(Debug, Clone)]
pub struct ProductUpdate {
    pub title: String,
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

/// Store operations for the `products` collection.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// List the whole catalog.
    async fn list(&self) -> StoreResult<Vec<Product>>;

    /// Find a product by id.
    async fn find_by_id(&self, id: &ProductId) -> StoreResult<Option<Product>>;

    /// Find a product by its (lowercase) slug.
    async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<Product>>;

    /// Insert a new product.
    ///
    /// # Errors
    ///
    /// Returns [`super::StoreError::Conflict`] when the slug is taken.
    async fn insert(&self, new: NewProduct) -> StoreResult<Product>;

    /// Replace a product document, returning the updated record.
    async fn update(&self, id: &ProductId, update: ProductUpdate) -> StoreResult<Product>;

    /// Delete a product; returns whether a record was removed.
    async fn delete(&self, id: &ProductId) -> StoreResult<bool>;

    /// Products with `quantity <= threshold`.
    async fn low_stock(&self, threshold: u32) -> StoreResult<Vec<Product>>;

    /// Atomically decrement stock by `quantity` if enough is available.
    ///
    /// This is a single conditional update: it succeeds (returns `true`)
    /// only when the resulting quantity stays non-negative, so two
    /// concurrent orders can never jointly over-sell a product.
    ///
    /// # Errors
    ///
    /// Returns [`super::StoreError::NotFound`] when the product does
    /// not exist.
    async fn try_decrement_stock(&self, id: &ProductId, quantity: u32) -> StoreResult<bool>;

    /// Add units back to stock (used to unwind a partially applied
    /// multi-line order).
    async fn restock(&self, id: &ProductId, quantity: u32) -> StoreResult<()>;

    /// Resolve product ids to their categories ("populate").
    async fn categories_for(&self, ids: &[ProductId]) -> StoreResult<HashMap<ProductId, String>>;
}
