//! Atelier API service core.
//!
//! This crate implements the domain logic behind the storefront's
//! GraphQL surface: token lifecycle, authorization, catalog, orders,
//! reviews, wish lists, accounts, and sales analytics. The transport
//! layer, object storage backend, and document database are
//! collaborators reached through the trait seams in [`store`],
//! [`storage`], and [`google`].
//!
//! Every privileged operation is gated by [`services::guard::Guard`]
//! before it touches persistence, and the [`ops::Ops`] facade bounds
//! each call with a request-scoped deadline.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod cookies;
pub mod error;
pub mod google;
pub mod models;
pub mod ops;
pub mod services;
pub mod storage;
pub mod store;
pub mod validate;
