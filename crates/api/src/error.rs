//! Unified error handling for the API core.
//!
//! Every operation returns [`ApiError`], which carries a
//! machine-readable [`ErrorCode`] alongside the human message. The
//! transport serializes the code into the GraphQL error extensions,
//! so the wire names must stay stable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;

/// Field name to validation message, as produced by form validation.
pub type FieldErrors = BTreeMap<String, String>;

/// Machine-readable error codes surfaced to clients.
///
/// Serialized names match the dashboard's existing expectations, which
/// is why the token codes carry the `JWT_` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "NOT_AUTHENTICATED")]
    NotAuthenticated,
    #[serde(rename = "JWT_TOKEN_MISSING")]
    TokenMissing,
    #[serde(rename = "JWT_TOKEN_EXPIRED")]
    TokenExpired,
    #[serde(rename = "JWT_TOKEN_INVALID")]
    TokenInvalid,
    #[serde(rename = "TOKEN_REVOKED")]
    TokenRevoked,
    #[serde(rename = "WRONG_USER_TYPE")]
    WrongUserType,
    #[serde(rename = "BAD_CREDENTIALS")]
    BadCredentials,
    #[serde(rename = "VALIDATION_ERROR")]
    ValidationError,
    #[serde(rename = "USER_NOT_FOUND")]
    UserNotFound,
    #[serde(rename = "ALREADY_EXISTS")]
    AlreadyExists,
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    #[serde(rename = "INPUT_ERROR")]
    InputError,
    #[serde(rename = "INSUFFICIENT_STOCK")]
    InsufficientStock,
    #[serde(rename = "GOOGLE_ERROR")]
    GoogleError,
    #[serde(rename = "TIMEOUT")]
    Timeout,
    #[serde(rename = "INTERNAL_SERVER_ERROR")]
    InternalServerError,
}

impl ErrorCode {
    /// The wire name of this code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::TokenMissing => "JWT_TOKEN_MISSING",
            Self::TokenExpired => "JWT_TOKEN_EXPIRED",
            Self::TokenInvalid => "JWT_TOKEN_INVALID",
            Self::TokenRevoked => "TOKEN_REVOKED",
            Self::WrongUserType => "WRONG_USER_TYPE",
            Self::BadCredentials => "BAD_CREDENTIALS",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::NotFound => "NOT_FOUND",
            Self::InputError => "INPUT_ERROR",
            Self::InsufficientStock => "INSUFFICIENT_STOCK",
            Self::GoogleError => "GOOGLE_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }
}

/// Application-level error type for all API operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No bearer token or cookie was presented.
    #[error("authentication token missing")]
    TokenMissing,

    /// The presented token is past its expiry.
    #[error("authentication token expired")]
    TokenExpired,

    /// The presented token failed signature or structural validation.
    #[error("authentication token invalid")]
    TokenInvalid,

    /// The refresh token no longer matches the stored session value.
    #[error("refresh token revoked")]
    TokenRevoked,

    /// The caller could not be verified.
    #[error("user not verified")]
    NotAuthenticated,

    /// The caller's role does not permit this operation.
    #[error("user not authorized")]
    WrongUserType,

    /// Email or password did not match.
    #[error("invalid credentials")]
    BadCredentials,

    /// One or more input fields failed validation.
    #[error("validation failed")]
    Validation(FieldErrors),

    /// The referenced user does not exist.
    #[error("user not found")]
    UserNotFound,

    /// A unique field collided with an existing record.
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// The referenced record does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// A required argument was absent or malformed.
    #[error("{0}")]
    Input(String),

    /// An order line requested more units than are in stock.
    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: u32,
        available: u32,
    },

    /// Google identity verification failed.
    #[error("google authentication failed: {0}")]
    Google(String),

    /// The operation exceeded its request deadline.
    #[error("operation timed out")]
    Timeout,

    /// Unexpected failure in the persistence or storage collaborator.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// The machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::TokenMissing => ErrorCode::TokenMissing,
            Self::TokenExpired => ErrorCode::TokenExpired,
            Self::TokenInvalid => ErrorCode::TokenInvalid,
            Self::TokenRevoked => ErrorCode::TokenRevoked,
            Self::NotAuthenticated => ErrorCode::NotAuthenticated,
            Self::WrongUserType => ErrorCode::WrongUserType,
            Self::BadCredentials => ErrorCode::BadCredentials,
            Self::Validation(_) => ErrorCode::ValidationError,
            Self::UserNotFound => ErrorCode::UserNotFound,
            Self::AlreadyExists(_) => ErrorCode::AlreadyExists,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Input(_) => ErrorCode::InputError,
            Self::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            Self::Google(_) => ErrorCode::GoogleError,
            Self::Timeout => ErrorCode::Timeout,
            Self::Internal(_) => ErrorCode::InternalServerError,
        }
    }

    /// The field→message map for validation errors, if any.
    #[must_use]
    pub const fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(fields) => Some(fields),
            _ => None,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(what) => Self::AlreadyExists(what),
            StoreError::NotFound => Self::NotFound("record".to_owned()),
            StoreError::Backend(_) | StoreError::DataCorruption(_) => {
                tracing::error!(error = %err, "store operation failed");
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<crate::google::GoogleError> for ApiError {
    fn from(err: crate::google::GoogleError) -> Self {
        Self::Google(err.to_string())
    }
}
