//! Review service.
//!
//! Listings resolve their cross-collection references: a review is
//! returned with its reviewer's name/email and, for the admin listing,
//! the reviewed product's title and representative image. A reference
//! whose record has been deleted resolves to nothing rather than
//! failing the listing.

use std::sync::Arc;

use tracing::instrument;

use atelier_core::{ProductId, ReviewId, UserRole};

use super::guard::{Guard, RoleRequirement};
use crate::error::ApiError;
use crate::models::{PopulatedReview, Review, ReviewProduct, Reviewer};
use crate::store::{NewReview, ProductStore, ReviewStore, StoreError, UserStore};
use crate::validate::Validator;

/// Input for the create review mutation.
#[derive(Debug)]
pub struct CreateReviewInput {
    pub product_id: ProductId,
    pub rating: u8,
    pub review: String,
}

/// Input for the edit review mutation.
#[derive(Debug)]
pub struct EditReviewInput {
    pub id: ReviewId,
    pub rating: u8,
    pub review: String,
}

/// Review operations.
pub struct ReviewsService {
    reviews: Arc<dyn ReviewStore>,
    users: Arc<dyn UserStore>,
    products: Arc<dyn ProductStore>,
    guard: Guard,
}

impl ReviewsService {
    #[must_use]
    pub fn new(
        reviews: Arc<dyn ReviewStore>,
        users: Arc<dyn UserStore>,
        products: Arc<dyn ProductStore>,
        guard: Guard,
    ) -> Self {
        Self {
            reviews,
            users,
            products,
            guard,
        }
    }

    /// Reviews for one product with reviewer details. Public.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Internal`] on a store failure.
    pub async fn product_reviews(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<PopulatedReview>, ApiError> {
        let reviews = self.reviews.find_by_product(product_id).await?;
        self.populate(reviews, false).await
    }

    /// Every review with reviewer and product details. Admin only.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::WrongUserType`] for non-admin callers.
    pub async fn reviews(&self, token: Option<&str>) -> Result<Vec<PopulatedReview>, ApiError> {
        self.guard
            .require(token, RoleRequirement::Role(UserRole::Admin))?;
        let reviews = self.reviews.list().await?;
        self.populate(reviews, true).await
    }

    /// Create a review as the calling customer.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] on malformed input and
    /// [`ApiError::NotFound`] for an unknown product.
    #[instrument(skip_all, fields(product_id = %input.product_id))]
    pub async fn create_review(
        &self,
        token: Option<&str>,
        input: CreateReviewInput,
    ) -> Result<Review, ApiError> {
        let caller = self
            .guard
            .require(token, RoleRequirement::Role(UserRole::Customer))?;

        let mut v = Validator::new();
        v.require_rating("rating", input.rating)
            .require("review", &input.review);
        v.finish()?;

        if self.products.find_by_id(&input.product_id).await?.is_none() {
            return Err(ApiError::NotFound("product".to_owned()));
        }

        Ok(self
            .reviews
            .insert(NewReview {
                product_id: input.product_id,
                user_id: caller.user_id,
                rating: input.rating,
                review: input.review,
            })
            .await?)
    }

    /// Edit a review's rating and text. Only the author (or an admin)
    /// may edit it.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown review and
    /// [`ApiError::WrongUserType`] for a non-author.
    #[instrument(skip_all, fields(review_id = %input.id))]
    pub async fn edit_review(
        &self,
        token: Option<&str>,
        input: EditReviewInput,
    ) -> Result<Review, ApiError> {
        let caller = self.guard.require(token, RoleRequirement::Any)?;

        let mut v = Validator::new();
        v.require_rating("rating", input.rating)
            .require("review", &input.review);
        v.finish()?;

        let existing = self
            .reviews
            .find_by_id(&input.id)
            .await?
            .ok_or_else(|| ApiError::NotFound("review".to_owned()))?;
        if !caller.can_act_for(&existing.user_id) {
            return Err(ApiError::WrongUserType);
        }

        self.reviews
            .update(&input.id, input.rating, input.review)
            .await
            .map_err(|err| match err {
                StoreError::NotFound => ApiError::NotFound("review".to_owned()),
                other => other.into(),
            })
    }

    /// Delete a review. Only the author (or an admin) may delete it.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown review and
    /// [`ApiError::WrongUserType`] for a non-author.
    #[instrument(skip_all, fields(review_id = %id))]
    pub async fn delete_review(&self, token: Option<&str>, id: &ReviewId) -> Result<bool, ApiError> {
        let caller = self.guard.require(token, RoleRequirement::Any)?;

        let existing = self
            .reviews
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("review".to_owned()))?;
        if !caller.can_act_for(&existing.user_id) {
            return Err(ApiError::WrongUserType);
        }

        Ok(self.reviews.delete(id).await?)
    }

    /// Resolve reviewer (and optionally product) references.
    async fn populate(
        &self,
        reviews: Vec<Review>,
        with_product: bool,
    ) -> Result<Vec<PopulatedReview>, ApiError> {
        let mut populated = Vec::with_capacity(reviews.len());
        for review in reviews {
            let reviewer = self
                .users
                .find_by_id(&review.user_id)
                .await?
                .map(|user| Reviewer {
                    first_name: user.first_name,
                    last_name: user.last_name,
                    email: user.email,
                });

            let product = if with_product {
                self.products
                    .find_by_id(&review.product_id)
                    .await?
                    .map(|product| ReviewProduct {
                        hero_img: product.hero_img().map(ToOwned::to_owned),
                        title: product.title,
                    })
            } else {
                None
            };

            populated.push(PopulatedReview {
                review,
                reviewer,
                product,
            });
        }
        Ok(populated)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use rust_decimal::Decimal;
    use secrecy::SecretString;

    use atelier_core::{Color, Email, Size, StockStatus, UserId};

    use crate::config::JwtConfig;
    use crate::error::ErrorCode;
    use crate::models::ProductImage;
    use crate::services::token::TokenService;
    use crate::store::{MemoryStore, NewProduct, NewUser};

    use super::*;

    struct Fixture {
        service: ReviewsService,
        store: Arc<MemoryStore>,
        admin: String,
        customer: String,
        customer_id: UserId,
        product_id: ProductId,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let tokens = TokenService::new(&JwtConfig {
            access_secret: SecretString::from("k2J8x!pQz4Wm9$vL1nR6tY3bF7cH0sDg"),
            refresh_secret: SecretString::from("u5E1y&aT8iO2p#sN4dK7fXq9lZ6wV3mB"),
            access_ttl: Duration::from_secs(900),
            refresh_ttl: Duration::from_secs(604_800),
        });

        let customer_record = UserStore::insert(
            store.as_ref(),
            NewUser {
                first_name: "Ada".to_owned(),
                last_name: "Lovelace".to_owned(),
                email: Email::parse("ada@example.com").unwrap(),
                role: UserRole::Customer,
                password_hash: Some("hash".to_owned()),
                google_id: None,
            },
        )
        .await
        .unwrap();

        let product = ProductStore::insert(
            store.as_ref(),
            NewProduct {
                title: "Wool Coat".to_owned(),
                slug: "wool-coat".to_owned(),
                description: "A coat".to_owned(),
                colors: vec![Color::Black],
                sizes: vec![Size::M],
                price: Decimal::new(120_00, 2),
                category: "coats".to_owned(),
                quantity: 10,
                sku: "WC-001".to_owned(),
                stock_status: StockStatus::InStock,
                featured: false,
                imgs: vec![ProductImage {
                    id: atelier_core::ImageId::new("img-1"),
                    url: "memory://images/img-1/front.jpg".to_owned(),
                }],
            },
        )
        .await
        .unwrap();

        let admin = tokens
            .issue_pair(&UserId::new("root"), UserRole::Admin)
            .unwrap()
            .access;
        let customer = tokens
            .issue_pair(&customer_record.id, UserRole::Customer)
            .unwrap()
            .access;
        let guard = Guard::new(Arc::new(tokens));

        Fixture {
            service: ReviewsService::new(
                Arc::clone(&store) as Arc<dyn ReviewStore>,
                Arc::clone(&store) as Arc<dyn UserStore>,
                Arc::clone(&store) as Arc<dyn ProductStore>,
                guard,
            ),
            store,
            admin,
            customer,
            customer_id: customer_record.id,
            product_id: product.id,
        }
    }

    fn review_input(f: &Fixture) -> CreateReviewInput {
        CreateReviewInput {
            product_id: f.product_id.clone(),
            rating: 4,
            review: "Warm and well made.".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_create_review_belongs_to_caller() {
        let f = fixture().await;
        let review = f
            .service
            .create_review(Some(&f.customer), review_input(&f))
            .await
            .unwrap();
        assert_eq!(review.user_id, f.customer_id);
        assert_eq!(review.rating, 4);
    }

    #[tokio::test]
    async fn test_create_review_validates_rating_range() {
        let f = fixture().await;
        for rating in [0, 6] {
            let err = f
                .service
                .create_review(
                    Some(&f.customer),
                    CreateReviewInput {
                        product_id: f.product_id.clone(),
                        rating,
                        review: "text".to_owned(),
                    },
                )
                .await
                .unwrap_err();
            assert_eq!(err.code(), ErrorCode::ValidationError);
        }
    }

    #[tokio::test]
    async fn test_create_review_unknown_product() {
        let f = fixture().await;
        let err = f
            .service
            .create_review(
                Some(&f.customer),
                CreateReviewInput {
                    product_id: ProductId::new("missing"),
                    rating: 3,
                    review: "text".to_owned(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_product_reviews_resolve_reviewer() {
        let f = fixture().await;
        f.service
            .create_review(Some(&f.customer), review_input(&f))
            .await
            .unwrap();

        let listed = f.service.product_reviews(&f.product_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        let reviewer = listed[0].reviewer.as_ref().unwrap();
        assert_eq!(reviewer.first_name, "Ada");
        // Product details are only resolved for the admin listing.
        assert!(listed[0].product.is_none());
    }

    #[tokio::test]
    async fn test_admin_listing_resolves_product_and_hero_img() {
        let f = fixture().await;
        f.service
            .create_review(Some(&f.customer), review_input(&f))
            .await
            .unwrap();

        let listed = f.service.reviews(Some(&f.admin)).await.unwrap();
        let product = listed[0].product.as_ref().unwrap();
        assert_eq!(product.title, "Wool Coat");
        assert!(product.hero_img.as_ref().unwrap().ends_with("front.jpg"));

        let err = f.service.reviews(Some(&f.customer)).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::WrongUserType);
    }

    #[tokio::test]
    async fn test_deleted_reviewer_resolves_to_none() {
        let f = fixture().await;
        f.service
            .create_review(Some(&f.customer), review_input(&f))
            .await
            .unwrap();
        UserStore::delete(f.store.as_ref(), &f.customer_id)
            .await
            .unwrap();

        let listed = f.service.product_reviews(&f.product_id).await.unwrap();
        assert!(listed[0].reviewer.is_none());
    }

    #[tokio::test]
    async fn test_edit_review_scoped_to_author() {
        let f = fixture().await;
        let review = f
            .service
            .create_review(Some(&f.customer), review_input(&f))
            .await
            .unwrap();

        let edited = f
            .service
            .edit_review(
                Some(&f.customer),
                EditReviewInput {
                    id: review.id.clone(),
                    rating: 5,
                    review: "Even better after a wash.".to_owned(),
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.rating, 5);

        // A different customer cannot edit it.
        let tokens = TokenService::new(&JwtConfig {
            access_secret: SecretString::from("k2J8x!pQz4Wm9$vL1nR6tY3bF7cH0sDg"),
            refresh_secret: SecretString::from("u5E1y&aT8iO2p#sN4dK7fXq9lZ6wV3mB"),
            access_ttl: Duration::from_secs(900),
            refresh_ttl: Duration::from_secs(604_800),
        });
        let other = tokens
            .issue_pair(&UserId::new("other"), UserRole::Customer)
            .unwrap()
            .access;
        let err = f
            .service
            .edit_review(
                Some(&other),
                EditReviewInput {
                    id: review.id,
                    rating: 1,
                    review: "sabotage".to_owned(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::WrongUserType);
    }

    #[tokio::test]
    async fn test_delete_review() {
        let f = fixture().await;
        let review = f
            .service
            .create_review(Some(&f.customer), review_input(&f))
            .await
            .unwrap();

        assert!(
            f.service
                .delete_review(Some(&f.admin), &review.id)
                .await
                .unwrap()
        );
        let err = f
            .service
            .delete_review(Some(&f.admin), &review.id)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
