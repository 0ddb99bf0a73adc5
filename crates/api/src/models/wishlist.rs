//! Wish list documents.

use serde::{Deserialize, Serialize};

use atelier_core::{ProductId, UserId, WishListId};

/// A user's wish list, replaced wholesale on every update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WishList {
    pub id: WishListId,
    pub user_id: UserId,
    pub products: Vec<ProductId>,
}
