//! Wish list service.
//!
//! A user has at most one wish list; the add mutation replaces its
//! contents wholesale with the submitted product ids, creating the
//! list on first use.

use std::sync::Arc;

use tracing::instrument;

use atelier_core::{ProductId, UserId, UserRole};

use super::guard::{Guard, RoleRequirement};
use crate::error::ApiError;
use crate::models::WishList;
use crate::store::WishListStore;

/// Wish list operations.
pub struct WishListsService {
    wishlists: Arc<dyn WishListStore>,
    guard: Guard,
}

impl WishListsService {
    #[must_use]
    pub fn new(wishlists: Arc<dyn WishListStore>, guard: Guard) -> Self {
        Self { wishlists, guard }
    }

    /// The wish list belonging to one user.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::WrongUserType`] when the caller is not that
    /// user and [`ApiError::NotFound`] when no list exists yet.
    pub async fn wish_list_by_user(
        &self,
        token: Option<&str>,
        user_id: &UserId,
    ) -> Result<WishList, ApiError> {
        let caller = self
            .guard
            .require(token, RoleRequirement::Role(UserRole::Customer))?;
        if !caller.can_act_for(user_id) {
            return Err(ApiError::WrongUserType);
        }
        self.wishlists
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("wish list".to_owned()))
    }

    /// Replace the user's wish list with the given products, creating
    /// it if absent.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::WrongUserType`] when the caller is not that
    /// user.
    #[instrument(skip_all, fields(user_id = %user_id, products = products.len()))]
    pub async fn add_to_wish_list(
        &self,
        token: Option<&str>,
        user_id: &UserId,
        products: Vec<ProductId>,
    ) -> Result<WishList, ApiError> {
        let caller = self
            .guard
            .require(token, RoleRequirement::Role(UserRole::Customer))?;
        if !caller.can_act_for(user_id) {
            return Err(ApiError::WrongUserType);
        }
        Ok(self.wishlists.upsert(user_id, products).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;

    use crate::config::JwtConfig;
    use crate::error::ErrorCode;
    use crate::services::token::TokenService;
    use crate::store::MemoryStore;

    use super::*;

    fn fixture() -> (WishListsService, String, String) {
        let store = Arc::new(MemoryStore::new());
        let tokens = TokenService::new(&JwtConfig {
            access_secret: SecretString::from("k2J8x!pQz4Wm9$vL1nR6tY3bF7cH0sDg"),
            refresh_secret: SecretString::from("u5E1y&aT8iO2p#sN4dK7fXq9lZ6wV3mB"),
            access_ttl: Duration::from_secs(900),
            refresh_ttl: Duration::from_secs(604_800),
        });
        let ada = tokens
            .issue_pair(&UserId::new("ada"), UserRole::Customer)
            .unwrap()
            .access;
        let eve = tokens
            .issue_pair(&UserId::new("eve"), UserRole::Customer)
            .unwrap()
            .access;
        let guard = Guard::new(Arc::new(tokens));
        (
            WishListsService::new(store as Arc<dyn WishListStore>, guard),
            ada,
            eve,
        )
    }

    #[tokio::test]
    async fn test_add_creates_then_replaces() {
        let (service, ada, _) = fixture();
        let user = UserId::new("ada");

        let first = service
            .add_to_wish_list(Some(&ada), &user, vec![ProductId::new("p-1")])
            .await
            .unwrap();
        assert_eq!(first.products, vec![ProductId::new("p-1")]);

        let second = service
            .add_to_wish_list(
                Some(&ada),
                &user,
                vec![ProductId::new("p-2"), ProductId::new("p-3")],
            )
            .await
            .unwrap();
        // Same list, contents replaced rather than appended.
        assert_eq!(second.id, first.id);
        assert_eq!(
            second.products,
            vec![ProductId::new("p-2"), ProductId::new("p-3")]
        );
    }

    #[tokio::test]
    async fn test_lookup_before_any_add_is_not_found() {
        let (service, ada, _) = fixture();
        let err = service
            .wish_list_by_user(Some(&ada), &UserId::new("ada"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_caller_cannot_touch_another_users_list() {
        let (service, ada, eve) = fixture();
        let user = UserId::new("ada");
        service
            .add_to_wish_list(Some(&ada), &user, vec![ProductId::new("p-1")])
            .await
            .unwrap();

        let err = service
            .wish_list_by_user(Some(&eve), &user)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::WrongUserType);

        let err = service
            .add_to_wish_list(Some(&eve), &user, vec![])
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::WrongUserType);
    }

    #[tokio::test]
    async fn test_requires_authentication() {
        let (service, _, _) = fixture();
        let err = service
            .wish_list_by_user(None, &UserId::new("ada"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::TokenMissing);
    }
}
