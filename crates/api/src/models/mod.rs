//! Domain models stored in the document collections.

pub mod order;
pub mod product;
pub mod review;
pub mod user;
pub mod wishlist;

pub use order::{Order, OrderItem};
pub use product::{Product, ProductImage};
pub use review::{PopulatedReview, Review, ReviewProduct, Reviewer};
pub use user::{Address, User};
pub use wishlist::WishList;
