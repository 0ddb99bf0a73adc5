//! Wish list collection operations.

use async_trait::async_trait;

use atelier_core::{ProductId, UserId};

use super::StoreResult;
use crate::models::WishList;

/// Store operations for the `wishlists` collection.
#[async_trait]
pub trait WishListStore: Send + Sync {
    /// The wish list belonging to a user, if any.
    async fn find_by_user(&self, user_id: &UserId) -> StoreResult<Option<WishList>>;

    /// Create or wholesale-replace the user's wish list.
    async fn upsert(&self, user_id: &UserId, products: Vec<ProductId>) -> StoreResult<WishList>;
}
