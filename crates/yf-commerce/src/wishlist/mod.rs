//! Wishlist module.

mod entry;
mod wishlist;

pub use entry::{ProductSnapshot, WishlistEntry};
pub use wishlist::{Wishlist, WishlistOp};
