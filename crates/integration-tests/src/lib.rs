//! Integration tests for Atelier Commerce.
//!
//! The suites in `tests/` run the full operation surface ([`Ops`])
//! against the in-memory store, so a test exercises the same guard,
//! validation, and persistence path a GraphQL request would take.
//!
//! Run with: `cargo test -p atelier-integration-tests`

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;

use atelier_api::config::{AdminConfig, AppConfig, JwtConfig};
use atelier_api::cookies::{ACCESS_TOKEN_COOKIE, CookieCommand, REFRESH_TOKEN_COOKIE};
use atelier_api::models::Product;
use atelier_api::ops::{Ops, StoreHandles};
use atelier_api::services::accounts::CreateUserInput;
use atelier_api::storage::MemoryObjectStorage;
use atelier_api::store::{MemoryStore, NewProduct, NewUser, UserStore};
use atelier_core::{Color, Email, Size, StockStatus, UserId, UserRole};

/// Bootstrap admin email used across the suites.
pub const ADMIN_EMAIL: &str = "admin@atelier.test";

/// Bootstrap admin password used across the suites.
pub const ADMIN_PASSWORD: &str = "Adm1n!Pass";

/// Customer password that satisfies the signup policy.
pub const CUSTOMER_PASSWORD: &str = "Str0ng!Pass";

/// The application wired over a shared in-memory store.
pub struct TestContext {
    pub ops: Ops,
    pub store: Arc<MemoryStore>,
    pub storage: Arc<MemoryObjectStorage>,
}

impl TestContext {
    #[must_use]
    pub fn new() -> Self {
        Self::with_deadline(Duration::from_secs(10))
    }

    #[must_use]
    pub fn with_deadline(deadline: Duration) -> Self {
        let store = Arc::new(MemoryStore::new());
        let storage = Arc::new(MemoryObjectStorage::new());
        let ops = Ops::new(
            &test_config(deadline),
            StoreHandles::from_memory(Arc::clone(&store)),
            Arc::clone(&storage) as Arc<dyn atelier_api::storage::ObjectStorage>,
            None,
        );
        Self { ops, store, storage }
    }

    /// Seed the bootstrap admin record and log in as it.
    pub async fn admin_session(&self) -> Session {
        UserStore::insert(
            self.store.as_ref(),
            NewUser {
                first_name: "Atelier".to_owned(),
                last_name: "Admin".to_owned(),
                email: Email::parse(ADMIN_EMAIL).unwrap(),
                role: UserRole::Admin,
                password_hash: None,
                google_id: None,
            },
        )
        .await
        .unwrap();

        let outcome = self.ops.log_in_admin(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();
        session_from(&outcome.cookies)
    }

    /// Sign up a customer account and log in as it.
    pub async fn customer_session(&self, email: &str) -> (UserId, Session) {
        let user = self
            .ops
            .create_user(CreateUserInput {
                first_name: "Test".to_owned(),
                last_name: "Customer".to_owned(),
                email: email.to_owned(),
                password: CUSTOMER_PASSWORD.to_owned(),
            })
            .await
            .unwrap();

        let outcome = self.ops.log_in_user(email, CUSTOMER_PASSWORD).await.unwrap();
        (user.id, session_from(&outcome.cookies))
    }

    /// Insert a catalog entry directly into the store.
    pub async fn seed_product(&self, slug: &str, quantity: u32, price: Decimal) -> Product {
        atelier_api::store::ProductStore::insert(
            self.store.as_ref(),
            NewProduct {
                title: format!("Product {slug}"),
                slug: slug.to_owned(),
                description: "Seeded for tests".to_owned(),
                colors: vec![Color::Black],
                sizes: vec![Size::M],
                price,
                category: "coats".to_owned(),
                quantity,
                sku: format!("SKU-{slug}"),
                stock_status: StockStatus::InStock,
                featured: false,
                imgs: Vec::new(),
            },
        )
        .await
        .unwrap()
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// The cookie values a login or refresh handed to the transport.
#[derive(Debug, Clone)]
pub struct Session {
    pub access: String,
    pub refresh: String,
}

impl Session {
    #[must_use]
    pub fn access(&self) -> Option<&str> {
        Some(&self.access)
    }

    #[must_use]
    pub fn refresh(&self) -> Option<&str> {
        Some(&self.refresh)
    }
}

/// Extract both session cookies from a mutation's cookie commands.
#[must_use]
pub fn session_from(cookies: &[CookieCommand]) -> Session {
    Session {
        access: cookie_value(cookies, ACCESS_TOKEN_COOKIE).unwrap(),
        refresh: cookie_value(cookies, REFRESH_TOKEN_COOKIE).unwrap(),
    }
}

/// The value a `Set` command assigns to `name`, if any.
#[must_use]
pub fn cookie_value(cookies: &[CookieCommand], name: &str) -> Option<String> {
    cookies.iter().find_map(|command| match command {
        CookieCommand::Set {
            name: set_name,
            value,
            ..
        } if *set_name == name => Some(value.clone()),
        _ => None,
    })
}

/// Whether the commands clear the named cookie.
#[must_use]
pub fn clears_cookie(cookies: &[CookieCommand], name: &str) -> bool {
    cookies
        .iter()
        .any(|command| matches!(command, CookieCommand::Clear { name: clear_name } if *clear_name == name))
}

fn test_config(deadline: Duration) -> AppConfig {
    AppConfig {
        jwt: JwtConfig {
            access_secret: SecretString::from("k2J8x!pQz4Wm9$vL1nR6tY3bF7cH0sDg"),
            refresh_secret: SecretString::from("u5E1y&aT8iO2p#sN4dK7fXq9lZ6wV3mB"),
            access_ttl: Duration::from_secs(900),
            refresh_ttl: Duration::from_secs(604_800),
        },
        admin: AdminConfig {
            email: ADMIN_EMAIL.to_owned(),
            password: SecretString::from(ADMIN_PASSWORD),
        },
        google_client_id: None,
        request_deadline: deadline,
    }
}
