//! Core types for Atelier Commerce.

pub mod catalog;
pub mod email;
pub mod id;
pub mod status;

pub use catalog::{Color, Size};
pub use email::{Email, EmailError};
pub use id::*;
pub use status::*;
