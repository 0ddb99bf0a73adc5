//! Process-local store backend.
//!
//! Backs every collection trait with a `HashMap` behind a
//! [`tokio::sync::RwLock`]. Used by the integration tests and by local
//! development; the conditional stock decrement holds the products
//! write lock for the whole check-and-update, which gives it the same
//! no-oversell guarantee as the database's atomic conditional update.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use atelier_core::{
    Email, OrderId, OrderStatus, ProductId, ReviewId, StockStatus, UserId, WishListId,
};

use super::{
    CompletedOrder, NewOrder, NewProduct, NewReview, NewUser, OrderStore, ProductStore,
    ProductUpdate, ReviewStore, StoreError, StoreResult, TimeRange, UserStore, WishListStore,
};
use crate::models::{Address, Order, OrderItem, Product, Review, User, WishList};

/// In-memory implementation of every collection trait.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<UserId, User>>,
    products: RwLock<HashMap<ProductId, Product>>,
    orders: RwLock<HashMap<OrderId, Order>>,
    reviews: RwLock<HashMap<ReviewId, Review>>,
    wishlists: RwLock<HashMap<UserId, WishList>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_id() -> String {
        Uuid::new_v4().simple().to_string()
    }
}

// ============================================================================
// Users
// ============================================================================

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: &UserId) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email == *email)
            .cloned())
    }

    async fn insert(&self, new: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|user| user.email == new.email) {
            return Err(StoreError::Conflict(format!(
                "email {} already registered",
                new.email
            )));
        }
        let user = User {
            id: UserId::new(Self::fresh_id()),
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            role: new.role,
            password_hash: new.password_hash,
            google_id: new.google_id,
            address: None,
            refresh_token: None,
            registered_at: Utc::now(),
        };
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn update_profile(
        &self,
        id: &UserId,
        first_name: String,
        last_name: String,
        email: Email,
    ) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|user| user.email == email && user.id != *id)
        {
            return Err(StoreError::Conflict(format!(
                "email {email} already registered"
            )));
        }
        let user = users.get_mut(id).ok_or(StoreError::NotFound)?;
        user.first_name = first_name;
        user.last_name = last_name;
        user.email = email;
        Ok(user.clone())
    }

    async fn set_address(&self, id: &UserId, address: Address) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let user = users.get_mut(id).ok_or(StoreError::NotFound)?;
        user.address = Some(address);
        Ok(())
    }

    async fn set_password_hash(&self, id: &UserId, hash: String) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let user = users.get_mut(id).ok_or(StoreError::NotFound)?;
        user.password_hash = Some(hash);
        Ok(())
    }

    async fn set_refresh_token(&self, id: &UserId, token: Option<String>) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let user = users.get_mut(id).ok_or(StoreError::NotFound)?;
        user.refresh_token = token;
        Ok(())
    }

    async fn delete(&self, id: &UserId) -> StoreResult<bool> {
        Ok(self.users.write().await.remove(id).is_some())
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.registered_at.cmp(&b.registered_at));
        Ok(users)
    }
}

// ============================================================================
// Products
// ============================================================================

#[async_trait]
impl ProductStore for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<Product>> {
        let mut products: Vec<Product> = self.products.read().await.values().cloned().collect();
        products.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(products)
    }

    async fn find_by_id(&self, id: &ProductId) -> StoreResult<Option<Product>> {
        Ok(self.products.read().await.get(id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<Product>> {
        Ok(self
            .products
            .read()
            .await
            .values()
            .find(|product| product.slug == slug)
            .cloned())
    }

    async fn insert(&self, new: NewProduct) -> StoreResult<Product> {
        let mut products = self.products.write().await;
        if products.values().any(|product| product.slug == new.slug) {
            return Err(StoreError::Conflict(format!(
                "slug {} already taken",
                new.slug
            )));
        }
        let product = Product {
            id: ProductId::new(Self::fresh_id()),
            title: new.title,
            slug: new.slug,
            description: new.description,
            colors: new.colors,
            sizes: new.sizes,
            price: new.price,
            category: new.category,
            quantity: new.quantity,
            sku: new.sku,
            stock_status: new.stock_status,
            featured: new.featured,
            imgs: new.imgs,
        };
        products.insert(product.id.clone(), product.clone());
        Ok(product)
    }

    async fn update(&self, id: &ProductId, update: ProductUpdate) -> StoreResult<Product> {
        let mut products = self.products.write().await;
        if products
            .values()
            .any(|product| product.slug == update.slug && product.id != *id)
        {
            return Err(StoreError::Conflict(format!(
                "slug {} already taken",
                update.slug
            )));
        }
        let product = products.get_mut(id).ok_or(StoreError::NotFound)?;
        product.title = update.title;
        product.slug = update.slug;
        product.description = update.description;
        product.colors = update.colors;
        product.sizes = update.sizes;
        product.price = update.price;
        product.category = update.category;
        product.quantity = update.quantity;
        product.sku = update.sku;
        product.stock_status = update.stock_status;
        product.featured = update.featured;
        product.imgs = update.imgs;
        Ok(product.clone())
    }

    async fn delete(&self, id: &ProductId) -> StoreResult<bool> {
        Ok(self.products.write().await.remove(id).is_some())
    }

    async fn low_stock(&self, threshold: u32) -> StoreResult<Vec<Product>> {
        let mut products: Vec<Product> = self
            .products
            .read()
            .await
            .values()
            .filter(|product| product.quantity <= threshold)
            .cloned()
            .collect();
        products.sort_by_key(|product| product.quantity);
        Ok(products)
    }

    async fn try_decrement_stock(&self, id: &ProductId, quantity: u32) -> StoreResult<bool> {
        let mut products = self.products.write().await;
        let product = products.get_mut(id).ok_or(StoreError::NotFound)?;
        let Some(remaining) = product.quantity.checked_sub(quantity) else {
            return Ok(false);
        };
        product.quantity = remaining;
        if remaining == 0 {
            product.stock_status = StockStatus::OutOfStock;
        }
        Ok(true)
    }

    async fn restock(&self, id: &ProductId, quantity: u32) -> StoreResult<()> {
        let mut products = self.products.write().await;
        let product = products.get_mut(id).ok_or(StoreError::NotFound)?;
        product.quantity = product.quantity.saturating_add(quantity);
        if product.quantity > 0 {
            product.stock_status = StockStatus::InStock;
        }
        Ok(())
    }

    async fn categories_for(&self, ids: &[ProductId]) -> StoreResult<HashMap<ProductId, String>> {
        let products = self.products.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| {
                products
                    .get(id)
                    .map(|product| (id.clone(), product.category.clone()))
            })
            .collect())
    }
}

// ============================================================================
// Orders
// ============================================================================

#[async_trait]
impl OrderStore for MemoryStore {
    async fn recent(&self, limit: usize) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self.orders.read().await.values().cloned().collect();
        orders.sort_by(|a, b| b.placed_at.cmp(&a.placed_at));
        orders.truncate(limit);
        Ok(orders)
    }

    async fn find_by_user(&self, user_id: &UserId) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|order| order.user_id == *user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.placed_at.cmp(&a.placed_at));
        Ok(orders)
    }

    async fn find_by_id(&self, id: &OrderId) -> StoreResult<Option<Order>> {
        Ok(self.orders.read().await.get(id).cloned())
    }

    async fn find_by_number(&self, order_number: u64) -> StoreResult<Option<Order>> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .find(|order| order.order_number == order_number)
            .cloned())
    }

    async fn insert(&self, new: NewOrder) -> StoreResult<Order> {
        let order = Order {
            id: OrderId::new(Self::fresh_id()),
            order_number: new.order_number,
            user_id: new.user_id,
            status: new.status,
            items: new.items,
            subtotal: new.subtotal,
            tax: new.tax,
            total: new.total,
            shipping_address: new.shipping_address,
            placed_at: new.placed_at,
        };
        self.orders
            .write()
            .await
            .insert(order.id.clone(), order.clone());
        Ok(order)
    }

    async fn set_status(&self, id: &OrderId, status: OrderStatus) -> StoreResult<bool> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(id) {
            Some(order) => {
                order.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn completed_in(&self, range: &TimeRange) -> StoreResult<Vec<CompletedOrder>> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .filter(|order| {
                order.status == OrderStatus::Completed && range.contains(order.placed_at)
            })
            .map(|order| CompletedOrder {
                total: order.total,
                placed_at: order.placed_at,
                user_id: order.user_id.clone(),
            })
            .collect())
    }

    async fn completed_items_in(&self, range: &TimeRange) -> StoreResult<Vec<OrderItem>> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .filter(|order| {
                order.status == OrderStatus::Completed && range.contains(order.placed_at)
            })
            .flat_map(|order| order.items.iter().cloned())
            .collect())
    }
}

// ============================================================================
// Reviews
// ============================================================================

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn find_by_id(&self, id: &ReviewId) -> StoreResult<Option<Review>> {
        Ok(self.reviews.read().await.get(id).cloned())
    }

    async fn find_by_product(&self, product_id: &ProductId) -> StoreResult<Vec<Review>> {
        Ok(self
            .reviews
            .read()
            .await
            .values()
            .filter(|review| review.product_id == *product_id)
            .cloned()
            .collect())
    }

    async fn list(&self) -> StoreResult<Vec<Review>> {
        Ok(self.reviews.read().await.values().cloned().collect())
    }

    async fn insert(&self, new: NewReview) -> StoreResult<Review> {
        let review = Review {
            id: ReviewId::new(Self::fresh_id()),
            product_id: new.product_id,
            user_id: new.user_id,
            rating: new.rating,
            review: new.review,
        };
        self.reviews
            .write()
            .await
            .insert(review.id.clone(), review.clone());
        Ok(review)
    }

    async fn update(&self, id: &ReviewId, rating: u8, review: String) -> StoreResult<Review> {
        let mut reviews = self.reviews.write().await;
        let record = reviews.get_mut(id).ok_or(StoreError::NotFound)?;
        record.rating = rating;
        record.review = review;
        Ok(record.clone())
    }

    async fn delete(&self, id: &ReviewId) -> StoreResult<bool> {
        Ok(self.reviews.write().await.remove(id).is_some())
    }
}

// ============================================================================
// Wish lists
// ============================================================================

#[async_trait]
impl WishListStore for MemoryStore {
    async fn find_by_user(&self, user_id: &UserId) -> StoreResult<Option<WishList>> {
        Ok(self.wishlists.read().await.get(user_id).cloned())
    }

    async fn upsert(&self, user_id: &UserId, products: Vec<ProductId>) -> StoreResult<WishList> {
        let mut wishlists = self.wishlists.write().await;
        let list = wishlists
            .entry(user_id.clone())
            .and_modify(|list| list.products = products.clone())
            .or_insert_with(|| WishList {
                id: WishListId::new(Self::fresh_id()),
                user_id: user_id.clone(),
                products,
            });
        Ok(list.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================
