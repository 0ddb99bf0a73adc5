//! Review collection operations.

use async_trait::async_trait;

use atelier_core::{ProductId, ReviewId, UserId};

use super::StoreResult;
use crate::models::Review;

/// Fields for a review document about to be inserted.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub product_id: ProductId,
    pub user_id: UserId,
    pub rating: u8,
    pub review: String,
}

/// Store operations for the `reviews` collection.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Find a review by id.
    async fn find_by_id(&self, id: &ReviewId) -> StoreResult<Option<Review>>;

    /// All reviews for one product.
    async fn find_by_product(&self, product_id: &ProductId) -> StoreResult<Vec<Review>>;

    /// All reviews across the catalog.
    async fn list(&self) -> StoreResult<Vec<Review>>;

    /// Insert a new review.
    async fn insert(&self, new: NewReview) -> StoreResult<Review>;

    /// Update a review's rating and text, returning the updated record.
    async fn update(&self, id: &ReviewId, rating: u8, review: String) -> StoreResult<Review>;

    /// Delete a review; returns whether a record was removed.
    async fn delete(&self, id: &ReviewId) -> StoreResult<bool>;
}
