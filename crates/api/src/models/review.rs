//! Product review documents.

use serde::{Deserialize, Serialize};

use atelier_core::{Email, ProductId, ReviewId, UserId};

/// A product review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    /// Star rating, 1-5.
    pub rating: u8,
    pub review: String,
}

/// Reviewer details resolved from the users collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reviewer {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
}

/// Product details resolved from the products collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewProduct {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hero_img: Option<String>,
}

/// A review with its cross-collection references resolved for display.
///
/// `reviewer` or `product` may be `None` when the referenced record has
/// since been deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulatedReview {
    #[serde(flatten)]
    pub review: Review,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<Reviewer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ReviewProduct>,
}
