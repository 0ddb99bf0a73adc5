//! User collection operations.

use async_trait::async_trait;

use atelier_core::{Email, UserId, UserRole};

use super::StoreResult;
use crate::models::{Address, User};

/// Fields for a user document about to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub role: UserRole,
    /// Argon2 hash; `None` for Google-authenticated accounts.
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
}

/// Store operations for the `users` collection.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by id.
    async fn find_by_id(&self, id: &UserId) -> StoreResult<Option<User>>;

    /// Find a user by (normalized) email.
    async fn find_by_email(&self, email: &Email) -> StoreResult<Option<User>>;

    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// Returns [`super::StoreError::Conflict`] when the email is taken.
    async fn insert(&self, new: NewUser) -> StoreResult<User>;

    /// Replace the user's name and email, returning the updated record.
    async fn update_profile(
        &self,
        id: &UserId,
        first_name: String,
        last_name: String,
        email: Email,
    ) -> StoreResult<User>;

    /// Set the user's postal address.
    async fn set_address(&self, id: &UserId, address: Address) -> StoreResult<()>;

    /// Replace the stored password hash.
    async fn set_password_hash(&self, id: &UserId, hash: String) -> StoreResult<()>;

    /// Overwrite (or clear) the stored refresh token.
    ///
    /// This is the revocation primitive: any refresh token that no
    /// longer equals the stored value is dead.
    async fn set_refresh_token(&self, id: &UserId, token: Option<String>) -> StoreResult<()>;

    /// Delete a user; returns whether a record was removed.
    async fn delete(&self, id: &UserId) -> StoreResult<bool>;

    /// List all users.
    async fn list(&self) -> StoreResult<Vec<User>>;
}
