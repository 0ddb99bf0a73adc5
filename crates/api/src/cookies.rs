//! Session cookie commands.
//!
//! The auth service does not talk to the HTTP layer directly; it
//! returns [`CookieCommand`]s alongside its results and the transport
//! applies them to the response. Both cookies are `HttpOnly` and
//! scoped to the GraphQL endpoint so browser scripts never see them.

use std::time::Duration;

/// Access token cookie name.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Refresh token cookie name.
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Path both cookies are scoped to.
pub const COOKIE_PATH: &str = "/graphql";

/// An instruction for the transport layer's `Set-Cookie` handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieCommand {
    /// Set an `HttpOnly` cookie scoped to [`COOKIE_PATH`].
    Set {
        name: &'static str,
        value: String,
        max_age: Duration,
    },
    /// Expire a cookie immediately.
    Clear { name: &'static str },
}

impl CookieCommand {
    /// Set the access token cookie.
    #[must_use]
    pub const fn set_access(value: String, max_age: Duration) -> Self {
        Self::Set {
            name: ACCESS_TOKEN_COOKIE,
            value,
            max_age,
        }
    }

    /// Set the refresh token cookie.
    #[must_use]
    pub const fn set_refresh(value: String, max_age: Duration) -> Self {
        Self::Set {
            name: REFRESH_TOKEN_COOKIE,
            value,
            max_age,
        }
    }

    /// Clear both session cookies (logout, failed refresh).
    #[must_use]
    pub const fn clear_both() -> [Self; 2] {
        [
            Self::Clear {
                name: ACCESS_TOKEN_COOKIE,
            },
            Self::Clear {
                name: REFRESH_TOKEN_COOKIE,
            },
        ]
    }
}
