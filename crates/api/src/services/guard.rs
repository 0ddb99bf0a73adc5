//! Authorization guard.
//!
//! Every privileged operation passes through [`Guard::require`] before
//! it touches persistence. The guard verifies the presented access
//! token and checks the caller's role against the operation's
//! requirement; the caller identity it returns is what resolvers act
//! as.

use std::sync::Arc;

use atelier_core::{UserId, UserRole};

use super::token::TokenService;
use crate::error::ApiError;

/// Role requirement for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleRequirement {
    /// Any authenticated caller.
    Any,
    /// Exactly this role.
    Role(UserRole),
}

/// The verified caller of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub role: UserRole,
}

impl Identity {
    /// Whether the caller is an admin.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }

    /// Whether the caller may act on `user_id`'s records: the owner
    /// may, and so may an admin.
    #[must_use]
    pub fn can_act_for(&self, user_id: &UserId) -> bool {
        self.is_admin() || self.user_id == *user_id
    }
}

/// Gate that turns a raw token into a verified [`Identity`].
#[derive(Clone)]
pub struct Guard {
    tokens: Arc<TokenService>,
}

impl Guard {
    #[must_use]
    pub const fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }

    /// Verify the token and check the role requirement.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::TokenMissing`] when no token was presented,
    /// [`ApiError::TokenExpired`]/[`ApiError::TokenInvalid`] when
    /// verification fails, and [`ApiError::WrongUserType`] when the
    /// caller's role does not meet `requirement`.
    pub fn require(
        &self,
        token: Option<&str>,
        requirement: RoleRequirement,
    ) -> Result<Identity, ApiError> {
        let token = token.ok_or(ApiError::TokenMissing)?;
        let claims = self.tokens.verify_access(token)?;

        let identity = Identity {
            user_id: UserId::new(claims.sub),
            role: claims.role,
        };

        match requirement {
            RoleRequirement::Any => Ok(identity),
            RoleRequirement::Role(role) if identity.role == role => Ok(identity),
            RoleRequirement::Role(_) => Err(ApiError::WrongUserType),
        }
    }

    /// Verify the token if present, without failing on absence.
    ///
    /// Used by the auth status query, which reports "logged out"
    /// instead of erroring for anonymous callers.
    #[must_use]
    pub fn identify(&self, token: Option<&str>) -> Option<Identity> {
        let claims = self.tokens.verify_access(token?).ok()?;
        Some(Identity {
            user_id: UserId::new(claims.sub),
            role: claims.role,
        })
    }
}
