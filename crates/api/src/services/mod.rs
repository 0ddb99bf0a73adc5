//! Domain services behind the GraphQL surface.

pub mod accounts;
pub mod analytics;
pub mod auth;
pub mod catalog;
pub mod guard;
pub mod orders;
pub mod reviews;
pub mod token;
pub mod wishlists;
