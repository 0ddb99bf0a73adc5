//! Atelier Core - Shared types library.
//!
//! This crate provides common types used across all Atelier components:
//! - `api` - The service core (auth, catalog, orders, analytics)
//! - `integration-tests` - Cross-service test suites
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no
//! HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, roles,
//!   statuses, and catalog attributes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
