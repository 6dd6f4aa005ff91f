//! Shopping cart module.
//!
//! Contains the cart engine, its line items and derived totals.

mod cart;
mod item;
mod pricing;
mod remote;

pub use cart::{Cart, CartOp};
pub use item::{CartLineItem, NewCartItem};
pub use pricing::CartState;
