//! Authentication service.
//!
//! Password and Google sign-in, session refresh with rotation, and
//! logout. Every successful login issues a fresh access/refresh pair,
//! persists the refresh token as the single live session value, and
//! hands the transport the cookie commands to apply.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::ExposeSecret;
use tracing::instrument;

use atelier_core::{Email, UserId, UserRole};

use super::guard::{Guard, Identity, RoleRequirement};
use super::token::TokenService;
use crate::config::AdminConfig;
use crate::cookies::CookieCommand;
use crate::error::ApiError;
use crate::google::{GoogleError, GoogleVerifier};
use crate::store::{NewUser, UserStore};
use crate::validate::Validator;

/// Result of a login, refresh, logout or status query.
#[derive(Debug, Clone)]
pub struct AuthPayload {
    pub is_logged_in: bool,
    pub user: Option<Identity>,
}

/// An auth mutation's result plus the cookie changes it implies.
#[derive(Debug)]
pub struct AuthOutcome {
    pub payload: AuthPayload,
    pub cookies: Vec<CookieCommand>,
}

/// Input for the change password mutation.
#[derive(Debug)]
pub struct ChangePasswordInput {
    pub user_id: UserId,
    pub current_password: String,
    pub new_password: String,
}

/// Authentication flows.
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: Arc<TokenService>,
    guard: Guard,
    google: Option<Arc<dyn GoogleVerifier>>,
    admin: AdminConfig,
}

impl AuthService {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<TokenService>,
        guard: Guard,
        google: Option<Arc<dyn GoogleVerifier>>,
        admin: AdminConfig,
    ) -> Self {
        Self {
            users,
            tokens,
            guard,
            google,
            admin,
        }
    }

    // =========================================================================
    // Logins
    // =========================================================================

    /// Dashboard login: credentials are checked against the bootstrap
    /// admin pair before the admin's user record is looked up.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::BadCredentials`] on a wrong pair,
    /// [`ApiError::UserNotFound`] when the admin record was never
    /// seeded, and [`ApiError::WrongUserType`] when the record exists
    /// but is not an admin.
    #[instrument(skip_all, fields(email))]
    pub async fn log_in_admin(&self, email: &str, password: &str) -> Result<AuthOutcome, ApiError> {
        if email != self.admin.email || password != self.admin.password.expose_secret() {
            return Err(ApiError::BadCredentials);
        }

        let parsed = Email::parse(email).map_err(|_| ApiError::BadCredentials)?;
        let admin = self
            .users
            .find_by_email(&parsed)
            .await?
            .ok_or(ApiError::UserNotFound)?;

        if admin.role != UserRole::Admin {
            return Err(ApiError::WrongUserType);
        }

        self.open_session(&admin.id, UserRole::Admin).await
    }

    /// Storefront login with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] on malformed input,
    /// [`ApiError::UserNotFound`] for an unknown email,
    /// [`ApiError::WrongUserType`] when an admin tries the storefront
    /// login, and [`ApiError::BadCredentials`] on a wrong password.
    #[instrument(skip_all)]
    pub async fn log_in_user(&self, email: &str, password: &str) -> Result<AuthOutcome, ApiError> {
        let mut v = Validator::new();
        v.require_email("email", email).require("password", password);
        v.finish()?;

        let parsed = Email::parse(email).map_err(|_| ApiError::BadCredentials)?;
        let user = self
            .users
            .find_by_email(&parsed)
            .await?
            .ok_or(ApiError::UserNotFound)?;

        if user.role != UserRole::Customer {
            return Err(ApiError::WrongUserType);
        }

        // Google-only accounts have no hash and can never password-login.
        let hash = user
            .password_hash
            .as_deref()
            .ok_or(ApiError::BadCredentials)?;
        verify_password(password, hash)?;

        self.open_session(&user.id, UserRole::Customer).await
    }

    /// Google sign-in. Verifies the credential, provisions a customer
    /// account on first sign-in, and opens a session.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Google`] when the credential is absent,
    /// fails verification, or social sign-in is not configured.
    #[instrument(skip_all)]
    pub async fn log_in_google(&self, credential: Option<&str>) -> Result<AuthOutcome, ApiError> {
        let credential = credential
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ApiError::Google("credential not provided".to_owned()))?;

        let verifier = self
            .google
            .as_ref()
            .ok_or_else(|| ApiError::from(GoogleError::NotConfigured))?;
        let profile = verifier.verify(credential).await?;

        let email =
            Email::parse(&profile.email).map_err(|err| ApiError::Google(err.to_string()))?;

        let user = match self.users.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                self.users
                    .insert(NewUser {
                        first_name: profile.given_name,
                        last_name: profile.family_name,
                        email,
                        role: UserRole::Customer,
                        password_hash: None,
                        google_id: Some(profile.sub),
                    })
                    .await?
            }
        };

        self.open_session(&user.id, UserRole::Customer).await
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Rotate the session from a refresh token cookie.
    ///
    /// The presented token must equal the user's stored refresh token;
    /// anything else is a revoked session and clears both cookies.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::TokenMissing`] without a cookie,
    /// [`ApiError::TokenExpired`]/[`ApiError::TokenInvalid`] on a bad
    /// token, and [`ApiError::TokenRevoked`] when rotation already
    /// superseded it.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<AuthOutcome, ApiError> {
        let token = refresh_token.ok_or(ApiError::TokenMissing)?;
        let claims = self.tokens.verify_refresh(token)?;

        let user_id = UserId::new(claims.sub);
        let live = self
            .users
            .find_by_id(&user_id)
            .await?
            .filter(|user| user.refresh_token.as_deref() == Some(token));

        let Some(user) = live else {
            // The transport clears the cookies so a stale browser
            // session stops retrying.
            return Err(ApiError::TokenRevoked);
        };

        self.open_session(&user.id, user.role).await
    }

    /// Log out: revoke the stored refresh token and clear both cookies.
    ///
    /// Always succeeds, even for anonymous or stale callers.
    #[instrument(skip_all)]
    pub async fn log_out(&self, access_token: Option<&str>) -> Result<AuthOutcome, ApiError> {
        if let Some(identity) = self.guard.identify(access_token) {
            // A concurrently deleted user is already logged out.
            match self.users.set_refresh_token(&identity.user_id, None).await {
                Ok(()) | Err(crate::store::StoreError::NotFound) => {}
                Err(err) => return Err(err.into()),
            }
        }

        Ok(AuthOutcome {
            payload: AuthPayload {
                is_logged_in: false,
                user: None,
            },
            cookies: CookieCommand::clear_both().into(),
        })
    }

    /// Whether the presented access token belongs to a live session.
    #[must_use]
    pub fn auth_status(&self, access_token: Option<&str>) -> AuthPayload {
        match self.guard.identify(access_token) {
            Some(identity) => AuthPayload {
                is_logged_in: true,
                user: Some(identity),
            },
            None => AuthPayload {
                is_logged_in: false,
                user: None,
            },
        }
    }

    /// Change a password after re-verifying the current one.
    ///
    /// The caller must be the account owner or an admin.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] when the new password fails the
    /// policy, [`ApiError::WrongUserType`] when the caller may not act
    /// for the account, and [`ApiError::BadCredentials`] when the
    /// current password does not match.
    #[instrument(skip_all, fields(user_id = %input.user_id))]
    pub async fn change_password(
        &self,
        access_token: Option<&str>,
        input: ChangePasswordInput,
    ) -> Result<bool, ApiError> {
        let caller = self
            .guard
            .require(access_token, RoleRequirement::Any)
            .map_err(|_| ApiError::NotAuthenticated)?;
        if !caller.can_act_for(&input.user_id) {
            return Err(ApiError::WrongUserType);
        }

        let mut v = Validator::new();
        v.require_password("newPassword", &input.new_password);
        v.finish()?;

        let user = self
            .users
            .find_by_id(&input.user_id)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        let hash = user
            .password_hash
            .as_deref()
            .ok_or(ApiError::BadCredentials)?;
        verify_password(&input.current_password, hash)?;

        let new_hash = hash_password(&input.new_password)?;
        self.users.set_password_hash(&user.id, new_hash).await?;
        Ok(true)
    }

    /// Issue a pair, persist the refresh token, build cookie commands.
    async fn open_session(&self, user_id: &UserId, role: UserRole) -> Result<AuthOutcome, ApiError> {
        let pair = self.tokens.issue_pair(user_id, role)?;
        self.users
            .set_refresh_token(user_id, Some(pair.refresh.clone()))
            .await?;

        Ok(AuthOutcome {
            payload: AuthPayload {
                is_logged_in: true,
                user: Some(Identity {
                    user_id: user_id.clone(),
                    role,
                }),
            },
            cookies: vec![
                CookieCommand::set_access(pair.access, self.tokens.access_ttl()),
                CookieCommand::set_refresh(pair.refresh, self.tokens.refresh_ttl()),
            ],
        })
    }
}

// =============================================================================
// Password hashing
// =============================================================================

/// Hash a password with Argon2id.
///
/// # Errors
///
/// Returns [`ApiError::Internal`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ApiError::Internal(format!("password hashing: {err}")))
}

/// Verify a password against its stored Argon2 hash.
///
/// # Errors
///
/// Returns [`ApiError::BadCredentials`] on mismatch and
/// [`ApiError::Internal`] on a malformed stored hash.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<(), ApiError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|err| ApiError::Internal(format!("stored password hash: {err}")))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| ApiError::BadCredentials)
}
