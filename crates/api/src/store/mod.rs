//! Persistence seam over the document database.
//!
//! # Collections
//!
//! - `users` - Accounts, roles, stored refresh tokens
//! - `products` - Catalog entries with stock counters
//! - `orders` - Immutable headers plus a mutable status
//! - `reviews` - Product reviews keyed by product/user
//! - `wishlists` - One list per user, upserted wholesale
//!
//! The core depends only on the operations these traits expose:
//! filtered finds with projection/sort/limit, find-by-id, insert,
//! update-by-id, delete-by-id, and cross-collection reference
//! resolution. A production deployment binds them to the document
//! database; [`memory::MemoryStore`] binds them to process-local maps
//! for tests.

pub mod memory;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod users;
pub mod wishlists;

use thiserror::Error;

pub use memory::MemoryStore;
pub use orders::{CompletedOrder, NewOrder, OrderStore, TimeRange};
pub use products::{NewProduct, ProductStore, ProductUpdate};
pub use reviews::{NewReview, ReviewStore};
pub use users::{NewUser, UserStore};
pub use wishlists::WishListStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing database failed.
    #[error("backend error: {0}")]
    Backend(String),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested document was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email or slug).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Convenience alias for store results.
pub type StoreResult<T> = Result<T, StoreError>;
