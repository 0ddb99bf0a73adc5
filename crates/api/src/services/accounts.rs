//! Account management service.
//!
//! Registration is public; everything else acts on the verified
//! caller's own record, with admins allowed to act on any account.

use std::sync::Arc;

use tracing::instrument;

use atelier_core::{Email, UserId, UserRole};

use super::auth::hash_password;
use super::guard::{Guard, RoleRequirement};
use crate::error::ApiError;
use crate::models::{Address, User};
use crate::store::{NewUser, StoreError, UserStore};
use crate::validate::Validator;

/// Input for the public registration mutation.
#[derive(Debug)]
pub struct CreateUserInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Input for the profile update mutation.
#[derive(Debug)]
pub struct UpdateAccountInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Name-only projection safe to show to anonymous callers.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PublicUserDetails {
    pub first_name: String,
    pub last_name: String,
}

/// Account operations.
pub struct AccountsService {
    users: Arc<dyn UserStore>,
    guard: Guard,
}

impl AccountsService {
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>, guard: Guard) -> Self {
        Self { users, guard }
    }

    /// Register a new customer account.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] on malformed input and
    /// [`ApiError::AlreadyExists`] when the email is taken.
    #[instrument(skip_all)]
    pub async fn create_user(&self, input: CreateUserInput) -> Result<User, ApiError> {
        let mut v = Validator::new();
        v.require("firstName", &input.first_name)
            .require("lastName", &input.last_name)
            .require_email("email", &input.email)
            .require_password("password", &input.password);
        v.finish()?;

        let email = Email::parse(&input.email)
            .map_err(|err| ApiError::Input(err.to_string()))?;
        let password_hash = hash_password(&input.password)?;

        self.users
            .insert(NewUser {
                first_name: input.first_name,
                last_name: input.last_name,
                email,
                role: UserRole::Customer,
                password_hash: Some(password_hash),
                google_id: None,
            })
            .await
            .map_err(|err| match err {
                StoreError::Conflict(_) => ApiError::AlreadyExists("user".to_owned()),
                other => other.into(),
            })
    }

    /// All accounts. Admin only.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::WrongUserType`] for non-admin callers.
    pub async fn users(&self, token: Option<&str>) -> Result<Vec<User>, ApiError> {
        self.guard
            .require(token, RoleRequirement::Role(UserRole::Admin))?;
        Ok(self.users.list().await?)
    }

    /// Look up one account. Any authenticated caller.
    ///
    /// # Errors
    ///
    /// Returns token errors from the guard.
    pub async fn user(&self, token: Option<&str>, id: &UserId) -> Result<Option<User>, ApiError> {
        self.guard.require(token, RoleRequirement::Any)?;
        Ok(self.users.find_by_id(id).await?)
    }

    /// An account's email address, by id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UserNotFound`] when the id is unknown.
    pub async fn user_email(&self, id: &UserId) -> Result<Email, ApiError> {
        let user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        Ok(user.email)
    }

    /// Name-only details for display next to reviews.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UserNotFound`] when the id is unknown.
    pub async fn public_user_details(&self, id: &UserId) -> Result<PublicUserDetails, ApiError> {
        let user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        Ok(PublicUserDetails {
            first_name: user.first_name,
            last_name: user.last_name,
        })
    }

    /// Set the caller's shipping address.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] on malformed input and
    /// [`ApiError::UserNotFound`] when the caller's record vanished.
    #[instrument(skip_all)]
    pub async fn update_address(
        &self,
        token: Option<&str>,
        address: Address,
    ) -> Result<Address, ApiError> {
        let caller = self.guard.require(token, RoleRequirement::Any)?;

        let mut v = Validator::new();
        v.require("street", &address.street)
            .require("city", &address.city)
            .require("state", &address.state)
            .require("country", &address.country);
        // Postcode stays optional; not every country issues them.
        v.finish()?;

        match self.users.set_address(&caller.user_id, address.clone()).await {
            Ok(()) => Ok(address),
            Err(StoreError::NotFound) => Err(ApiError::UserNotFound),
            Err(err) => Err(err.into()),
        }
    }

    /// Update the caller's name and email, returning the new record.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] on malformed input,
    /// [`ApiError::AlreadyExists`] when the new email is taken, and
    /// [`ApiError::UserNotFound`] when the caller's record vanished.
    #[instrument(skip_all)]
    pub async fn update_account(
        &self,
        token: Option<&str>,
        input: UpdateAccountInput,
    ) -> Result<User, ApiError> {
        let caller = self.guard.require(token, RoleRequirement::Any)?;

        let mut v = Validator::new();
        v.require("firstName", &input.first_name)
            .require("lastName", &input.last_name)
            .require_email("email", &input.email);
        v.finish()?;

        let email = Email::parse(&input.email)
            .map_err(|err| ApiError::Input(err.to_string()))?;

        self.users
            .update_profile(&caller.user_id, input.first_name, input.last_name, email)
            .await
            .map_err(|err| match err {
                StoreError::Conflict(_) => ApiError::AlreadyExists("user".to_owned()),
                StoreError::NotFound => ApiError::UserNotFound,
                other => other.into(),
            })
    }

    /// Delete an account. The owner may delete their own; admins may
    /// delete any.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::WrongUserType`] when the caller may not act
    /// for the account and [`ApiError::UserNotFound`] when it does not
    /// exist.
    #[instrument(skip_all, fields(user_id = %id))]
    pub async fn delete_user(&self, token: Option<&str>, id: &UserId) -> Result<bool, ApiError> {
        let caller = self.guard.require(token, RoleRequirement::Any)?;
        if !caller.can_act_for(id) {
            return Err(ApiError::WrongUserType);
        }

        if self.users.delete(id).await? {
            Ok(true)
        } else {
            Err(ApiError::UserNotFound)
        }
    }
}
