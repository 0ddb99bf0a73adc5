//! JWT token service.
//!
//! Issues and verifies the access/refresh token pair backing every
//! session. The two token kinds are signed with distinct secrets, so
//! a leaked access secret cannot mint refresh tokens and a refresh
//! token never passes access verification.
//!
//! Refresh tokens are additionally pinned to persistence: a refresh
//! token is live only while it equals the user's stored value, which
//! is how rotation revokes every earlier token (see
//! [`super::auth::AuthService::refresh`]).

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use atelier_core::{UserId, UserRole};

use crate::config::JwtConfig;
use crate::error::ApiError;

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: the user id.
    pub sub: String,
    pub role: UserRole,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiry, seconds since epoch.
    pub exp: i64,
}

/// Claims carried by a refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject: the user id.
    pub sub: String,
    /// Token id, unique per issuance.
    ///
    /// `iat` has second granularity, so without this two tokens minted
    /// for the same user in the same second would be byte-identical
    /// and rotation could never distinguish the new token from the one
    /// it supersedes.
    pub jti: String,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiry, seconds since epoch.
    pub exp: i64,
}

/// A freshly signed access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Signs and verifies session tokens.
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: chrono::Duration,
    refresh_ttl: chrono::Duration,
}

impl TokenService {
    /// Build a token service from the JWT configuration.
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        let access = config.access_secret.expose_secret().as_bytes();
        let refresh = config.refresh_secret.expose_secret().as_bytes();
        Self {
            access_encoding: EncodingKey::from_secret(access),
            access_decoding: DecodingKey::from_secret(access),
            refresh_encoding: EncodingKey::from_secret(refresh),
            refresh_decoding: DecodingKey::from_secret(refresh),
            access_ttl: chrono::Duration::from_std(config.access_ttl)
                .unwrap_or_else(|_| chrono::Duration::minutes(15)),
            refresh_ttl: chrono::Duration::from_std(config.refresh_ttl)
                .unwrap_or_else(|_| chrono::Duration::days(7)),
        }
    }

    /// Access token lifetime.
    #[must_use]
    pub fn access_ttl(&self) -> std::time::Duration {
        self.access_ttl.to_std().unwrap_or_default()
    }

    /// Refresh token lifetime.
    #[must_use]
    pub fn refresh_ttl(&self) -> std::time::Duration {
        self.refresh_ttl.to_std().unwrap_or_default()
    }

    /// Sign a fresh access/refresh pair for a user.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Internal`] if signing fails, which only
    /// happens on malformed key material.
    pub fn issue_pair(&self, user_id: &UserId, role: UserRole) -> Result<TokenPair, ApiError> {
        let now = Utc::now();
        let header = Header::new(Algorithm::HS256);

        let access_claims = AccessClaims {
            sub: user_id.as_str().to_owned(),
            role,
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };
        let access = encode(&header, &access_claims, &self.access_encoding)
            .map_err(|err| ApiError::Internal(format!("access token signing: {err}")))?;

        let refresh_claims = RefreshClaims {
            sub: user_id.as_str().to_owned(),
            jti: Uuid::new_v4().simple().to_string(),
            iat: now.timestamp(),
            exp: (now + self.refresh_ttl).timestamp(),
        };
        let refresh = encode(&header, &refresh_claims, &self.refresh_encoding)
            .map_err(|err| ApiError::Internal(format!("refresh token signing: {err}")))?;

        Ok(TokenPair { access, refresh })
    }

    /// Verify an access token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::TokenExpired`] past expiry and
    /// [`ApiError::TokenInvalid`] for any other verification failure.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, ApiError> {
        decode::<AccessClaims>(token, &self.access_decoding, &verification())
            .map(|data| data.claims)
            .map_err(map_jwt_error)
    }

    /// Verify a refresh token's signature and expiry.
    ///
    /// This checks only the token itself. Whether it is still the live
    /// session token is decided against the stored value by the auth
    /// service.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::TokenExpired`] past expiry and
    /// [`ApiError::TokenInvalid`] for any other verification failure.
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, ApiError> {
        decode::<RefreshClaims>(token, &self.refresh_decoding, &verification())
            .map(|data| data.claims)
            .map_err(map_jwt_error)
    }
}

fn verification() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_exp = true;
    validation
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> ApiError {
    match err.kind() {
        ErrorKind::ExpiredSignature => ApiError::TokenExpired,
        _ => ApiError::TokenInvalid,
    }
}
