//! User account documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use atelier_core::{Email, UserId, UserRole};

/// A postal address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    /// Not every country uses postcodes, so this may be empty.
    pub postcode: String,
    pub country: String,
}

/// A user account record.
///
/// Exactly one of `password_hash` and `google_id` drives authentication:
/// externally authenticated (Google) accounts carry no password hash.
/// `refresh_token` holds the single active session's refresh token; it
/// is overwritten on each login/refresh and cleared on logout, which
/// revokes every previously issued refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub role: UserRole,
    /// Argon2 hash; `None` when the account is Google-authenticated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    /// Google subject id for social sign-in accounts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    /// Currently valid refresh token, if a session is active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub registered_at: DateTime<Utc>,
}

impl User {
    /// Whether this account signs in through Google.
    #[must_use]
    pub const fn is_external(&self) -> bool {
        self.google_id.is_some()
    }
}
