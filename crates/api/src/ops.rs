//! The external operation surface.
//!
//! [`Ops`] wires every service together and exposes one typed method
//! per GraphQL operation. The transport layer (out of scope here) maps
//! requests onto these methods and applies the cookie commands they
//! return. Every call runs under the configured request deadline;
//! work that outlives it fails with [`ApiError::Timeout`] instead of
//! holding the connection open.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use atelier_core::{OrderId, OrderStatus, ProductId, ReviewId, UserId};

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::google::GoogleVerifier;
use crate::models::{Address, Order, PopulatedReview, Product, Review, User, WishList};
use crate::services::accounts::{
    AccountsService, CreateUserInput, PublicUserDetails, UpdateAccountInput,
};
use crate::services::analytics::{
    ActiveUserMetrics, AnalyticsService, CategoryCount, DailySales, LowStockProduct,
    OrderCountMetrics, SalesMetrics,
};
use crate::services::auth::{AuthOutcome, AuthPayload, AuthService, ChangePasswordInput};
use crate::services::catalog::{CatalogService, CreateProductInput, EditProductInput};
use crate::services::guard::Guard;
use crate::services::orders::{CreateOrderInput, OrdersService};
use crate::services::reviews::{CreateReviewInput, EditReviewInput, ReviewsService};
use crate::services::token::TokenService;
use crate::services::wishlists::WishListsService;
use crate::storage::ObjectStorage;
use crate::store::{
    MemoryStore, OrderStore, ProductStore, ReviewStore, UserStore, WishListStore,
};

/// One handle per store trait, so a backend can be swapped per
/// collection.
#[derive(Clone)]
pub struct StoreHandles {
    pub users: Arc<dyn UserStore>,
    pub products: Arc<dyn ProductStore>,
    pub orders: Arc<dyn OrderStore>,
    pub reviews: Arc<dyn ReviewStore>,
    pub wishlists: Arc<dyn WishListStore>,
}

impl StoreHandles {
    /// All five collections backed by one in-memory store.
    #[must_use]
    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            users: Arc::clone(&store) as Arc<dyn UserStore>,
            products: Arc::clone(&store) as Arc<dyn ProductStore>,
            orders: Arc::clone(&store) as Arc<dyn OrderStore>,
            reviews: Arc::clone(&store) as Arc<dyn ReviewStore>,
            wishlists: store as Arc<dyn WishListStore>,
        }
    }
}

/// The assembled application.
pub struct Ops {
    auth: AuthService,
    accounts: AccountsService,
    catalog: CatalogService,
    orders: OrdersService,
    reviews: ReviewsService,
    wishlists: WishListsService,
    analytics: AnalyticsService,
    deadline: Duration,
}

impl Ops {
    #[must_use]
    pub fn new(
        config: &AppConfig,
        stores: StoreHandles,
        storage: Arc<dyn ObjectStorage>,
        google: Option<Arc<dyn GoogleVerifier>>,
    ) -> Self {
        let tokens = Arc::new(TokenService::new(&config.jwt));
        let guard = Guard::new(Arc::clone(&tokens));

        Self {
            auth: AuthService::new(
                Arc::clone(&stores.users),
                tokens,
                guard.clone(),
                google,
                config.admin.clone(),
            ),
            accounts: AccountsService::new(Arc::clone(&stores.users), guard.clone()),
            catalog: CatalogService::new(Arc::clone(&stores.products), storage, guard.clone()),
            orders: OrdersService::new(
                Arc::clone(&stores.orders),
                Arc::clone(&stores.products),
                Arc::clone(&stores.users),
                guard.clone(),
            ),
            reviews: ReviewsService::new(
                stores.reviews,
                Arc::clone(&stores.users),
                Arc::clone(&stores.products),
                guard.clone(),
            ),
            wishlists: WishListsService::new(stores.wishlists, guard.clone()),
            analytics: AnalyticsService::new(stores.orders, stores.products, guard),
            deadline: config.request_deadline,
        }
    }

    /// Run an operation under the request deadline.
    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, ApiError>>,
    ) -> Result<T, ApiError> {
        match tokio::time::timeout(self.deadline, fut).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout),
        }
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// # Errors
    ///
    /// See [`AuthService::log_in_admin`].
    pub async fn log_in_admin(&self, email: &str, password: &str) -> Result<AuthOutcome, ApiError> {
        self.bounded(self.auth.log_in_admin(email, password)).await
    }

    /// # Errors
    ///
    /// See [`AuthService::log_in_user`].
    pub async fn log_in_user(&self, email: &str, password: &str) -> Result<AuthOutcome, ApiError> {
        self.bounded(self.auth.log_in_user(email, password)).await
    }

    /// # Errors
    ///
    /// See [`AuthService::log_in_google`].
    pub async fn log_in_google(&self, credential: Option<&str>) -> Result<AuthOutcome, ApiError> {
        self.bounded(self.auth.log_in_google(credential)).await
    }

    /// # Errors
    ///
    /// See [`AuthService::refresh`].
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<AuthOutcome, ApiError> {
        self.bounded(self.auth.refresh(refresh_token)).await
    }

    /// # Errors
    ///
    /// See [`AuthService::log_out`].
    pub async fn log_out(&self, access_token: Option<&str>) -> Result<AuthOutcome, ApiError> {
        self.bounded(self.auth.log_out(access_token)).await
    }

    /// # Errors
    ///
    /// See [`AuthService::change_password`].
    pub async fn change_password(
        &self,
        access_token: Option<&str>,
        input: ChangePasswordInput,
    ) -> Result<bool, ApiError> {
        self.bounded(self.auth.change_password(access_token, input))
            .await
    }

    /// Never fails; anonymous callers are simply logged out.
    #[must_use]
    pub fn auth_status(&self, access_token: Option<&str>) -> AuthPayload {
        self.auth.auth_status(access_token)
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// # Errors
    ///
    /// See [`AccountsService::create_user`].
    pub async fn create_user(&self, input: CreateUserInput) -> Result<User, ApiError> {
        self.bounded(self.accounts.create_user(input)).await
    }

    /// # Errors
    ///
    /// See [`AccountsService::users`].
    pub async fn users(&self, token: Option<&str>) -> Result<Vec<User>, ApiError> {
        self.bounded(self.accounts.users(token)).await
    }

    /// # Errors
    ///
    /// See [`AccountsService::user`].
    pub async fn user(&self, token: Option<&str>, id: &UserId) -> Result<Option<User>, ApiError> {
        self.bounded(self.accounts.user(token, id)).await
    }

    /// # Errors
    ///
    /// See [`AccountsService::public_user_details`].
    pub async fn public_user_details(&self, id: &UserId) -> Result<PublicUserDetails, ApiError> {
        self.bounded(self.accounts.public_user_details(id)).await
    }

    /// # Errors
    ///
    /// See [`AccountsService::update_address`].
    pub async fn update_address(
        &self,
        token: Option<&str>,
        address: Address,
    ) -> Result<Address, ApiError> {
        self.bounded(self.accounts.update_address(token, address))
            .await
    }

    /// # Errors
    ///
    /// See [`AccountsService::update_account`].
    pub async fn update_account(
        &self,
        token: Option<&str>,
        input: UpdateAccountInput,
    ) -> Result<User, ApiError> {
        self.bounded(self.accounts.update_account(token, input))
            .await
    }

    /// # Errors
    ///
    /// See [`AccountsService::delete_user`].
    pub async fn delete_user(&self, token: Option<&str>, id: &UserId) -> Result<bool, ApiError> {
        self.bounded(self.accounts.delete_user(token, id)).await
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// # Errors
    ///
    /// See [`CatalogService::products`].
    pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
        self.bounded(self.catalog.products()).await
    }

    /// # Errors
    ///
    /// See [`CatalogService::product`].
    pub async fn product(&self, id: &ProductId) -> Result<Option<Product>, ApiError> {
        self.bounded(self.catalog.product(id)).await
    }

    /// # Errors
    ///
    /// See [`CatalogService::create_product`].
    pub async fn create_product(
        &self,
        token: Option<&str>,
        input: CreateProductInput,
    ) -> Result<Product, ApiError> {
        self.bounded(self.catalog.create_product(token, input)).await
    }

    /// # Errors
    ///
    /// See [`CatalogService::edit_product`].
    pub async fn edit_product(
        &self,
        token: Option<&str>,
        input: EditProductInput,
    ) -> Result<Product, ApiError> {
        self.bounded(self.catalog.edit_product(token, input)).await
    }

    /// # Errors
    ///
    /// See [`CatalogService::delete_product`].
    pub async fn delete_product(
        &self,
        token: Option<&str>,
        id: &ProductId,
    ) -> Result<bool, ApiError> {
        self.bounded(self.catalog.delete_product(token, id)).await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// # Errors
    ///
    /// See [`OrdersService::orders`].
    pub async fn orders(&self, token: Option<&str>, limit: usize) -> Result<Vec<Order>, ApiError> {
        self.bounded(self.orders.orders(token, limit)).await
    }

    /// # Errors
    ///
    /// See [`OrdersService::user_orders`].
    pub async fn user_orders(
        &self,
        token: Option<&str>,
        user_id: &UserId,
    ) -> Result<Vec<Order>, ApiError> {
        self.bounded(self.orders.user_orders(token, user_id)).await
    }

    /// # Errors
    ///
    /// See [`OrdersService::order_by_number`].
    pub async fn order_by_number(
        &self,
        token: Option<&str>,
        order_number: u64,
    ) -> Result<Order, ApiError> {
        self.bounded(self.orders.order_by_number(token, order_number))
            .await
    }

    /// # Errors
    ///
    /// See [`OrdersService::create_order`].
    pub async fn create_order(
        &self,
        token: Option<&str>,
        input: CreateOrderInput,
    ) -> Result<Order, ApiError> {
        self.bounded(self.orders.create_order(token, input)).await
    }

    /// # Errors
    ///
    /// See [`OrdersService::update_order_status`].
    pub async fn update_order_status(
        &self,
        token: Option<&str>,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<OrderStatus, ApiError> {
        self.bounded(self.orders.update_order_status(token, id, status))
            .await
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    /// # Errors
    ///
    /// See [`ReviewsService::product_reviews`].
    pub async fn product_reviews(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<PopulatedReview>, ApiError> {
        self.bounded(self.reviews.product_reviews(product_id)).await
    }

    /// # Errors
    ///
    /// See [`ReviewsService::reviews`].
    pub async fn reviews(&self, token: Option<&str>) -> Result<Vec<PopulatedReview>, ApiError> {
        self.bounded(self.reviews.reviews(token)).await
    }

    /// # Errors
    ///
    /// See [`ReviewsService::create_review`].
    pub async fn create_review(
        &self,
        token: Option<&str>,
        input: CreateReviewInput,
    ) -> Result<Review, ApiError> {
        self.bounded(self.reviews.create_review(token, input)).await
    }

    /// # Errors
    ///
    /// See [`ReviewsService::edit_review`].
    pub async fn edit_review(
        &self,
        token: Option<&str>,
        input: EditReviewInput,
    ) -> Result<Review, ApiError> {
        self.bounded(self.reviews.edit_review(token, input)).await
    }

    /// # Errors
    ///
    /// See [`ReviewsService::delete_review`].
    pub async fn delete_review(&self, token: Option<&str>, id: &ReviewId) -> Result<bool, ApiError> {
        self.bounded(self.reviews.delete_review(token, id)).await
    }

    // =========================================================================
    // Wish lists
    // =========================================================================

    /// # Errors
    ///
    /// See [`WishListsService::wish_list_by_user`].
    pub async fn wish_list_by_user(
        &self,
        token: Option<&str>,
        user_id: &UserId,
    ) -> Result<WishList, ApiError> {
        self.bounded(self.wishlists.wish_list_by_user(token, user_id))
            .await
    }

    /// # Errors
    ///
    /// See [`WishListsService::add_to_wish_list`].
    pub async fn add_to_wish_list(
        &self,
        token: Option<&str>,
        user_id: &UserId,
        products: Vec<ProductId>,
    ) -> Result<WishList, ApiError> {
        self.bounded(self.wishlists.add_to_wish_list(token, user_id, products))
            .await
    }

    // =========================================================================
    // Analytics
    // =========================================================================

    /// # Errors
    ///
    /// See [`AnalyticsService::sales_metrics`].
    pub async fn sales_metrics(&self, token: Option<&str>) -> Result<SalesMetrics, ApiError> {
        self.bounded(self.analytics.sales_metrics(token)).await
    }

    /// # Errors
    ///
    /// See [`AnalyticsService::order_count_metrics`].
    pub async fn order_count_metrics(
        &self,
        token: Option<&str>,
    ) -> Result<OrderCountMetrics, ApiError> {
        self.bounded(self.analytics.order_count_metrics(token)).await
    }

    /// # Errors
    ///
    /// See [`AnalyticsService::active_user_metrics`].
    pub async fn active_user_metrics(
        &self,
        token: Option<&str>,
    ) -> Result<ActiveUserMetrics, ApiError> {
        self.bounded(self.analytics.active_user_metrics(token)).await
    }

    /// # Errors
    ///
    /// See [`AnalyticsService::sales_over_time`].
    pub async fn sales_over_time(&self, token: Option<&str>) -> Result<Vec<DailySales>, ApiError> {
        self.bounded(self.analytics.sales_over_time(token)).await
    }

    /// # Errors
    ///
    /// See [`AnalyticsService::low_stock_products`].
    pub async fn low_stock_products(
        &self,
        token: Option<&str>,
    ) -> Result<Vec<LowStockProduct>, ApiError> {
        self.bounded(self.analytics.low_stock_products(token)).await
    }

    /// # Errors
    ///
    /// See [`AnalyticsService::orders_by_category`].
    pub async fn orders_by_category(
        &self,
        token: Option<&str>,
    ) -> Result<Vec<CategoryCount>, ApiError> {
        self.bounded(self.analytics.orders_by_category(token)).await
    }
}
