//! Client-side commerce state for the YF storefront.
//!
//! Each store owns its collection and changes only through its own methods:
//!
//! - **Cart**: optimistic line edits with derived totals, plus server-backed writes
//! - **Wishlist**: a set of saved products
//! - **Addresses**: saved shipping addresses, changed only on server confirmation
//! - **Checkout**: address validation, payment selection and order submission
//! - **Orders**: read-only order history
//!
//! Remote calls go through [`api::CommerceApi`]. Server snapshots are merged
//! into the optimistic stores by the rules in [`reconcile`], so a slow fetch
//! never undoes a newer local edit.
//!
//! # Example
//!
//! ```rust,ignore
//! use yf_commerce::prelude::*;
//!
//! let mut cart = Cart::new();
//! cart.add_item(NewCartItem::new(ProductId::new(1), "Canvas Buddha Painting", Money::from_rupees(2499)));
//! cart.sync_on_login(&api, &session).await?;
//!
//! let mut checkout = Checkout::new(CheckoutSettings::from(&config.checkout));
//! checkout.set_address(address)?;
//! checkout.submit_address()?;
//! let order = checkout.place_order(&mut cart, &api, Some(&session)).await?;
//! println!("Placed {}", order.order_number);
//! ```

pub mod address;
pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod ids;
pub mod money;
pub mod orders;
pub mod reconcile;
pub mod status;
pub mod wishlist;

pub use error::{CommerceError, RemoteError};
pub use ids::*;
pub use money::Money;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{CommerceError, RemoteError, RemoteErrorKind, ValidationErrors};
    pub use crate::ids::*;
    pub use crate::money::Money;

    // Backend
    pub use crate::api::{CommerceApi, HttpCommerceApi, InMemoryCommerceApi};
    pub use crate::config::StorefrontConfig;

    // Stores
    pub use crate::address::{AddressBook, AddressDraft, ShippingAddress};
    pub use crate::cart::{Cart, CartLineItem, CartState, NewCartItem};
    pub use crate::orders::OrderHistory;
    pub use crate::reconcile::SyncOutcome;
    pub use crate::status::RemoteStatus;
    pub use crate::wishlist::{ProductSnapshot, Wishlist, WishlistEntry};

    // Checkout
    pub use crate::checkout::{
        AddressField, Checkout, CheckoutAddress, CheckoutSettings, CheckoutState,
        DeliveryPolicy, Order, OrderLine, OrderNumber, OrderStatus, OrderSummary, OrderTotals,
        PaymentMethod, SubmissionMode,
    };
}
