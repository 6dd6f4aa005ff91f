//! The remote commerce backend.
//!
//! Engines talk to the backend only through [`CommerceApi`].
//! [`HttpCommerceApi`] speaks to the real REST API and record store;
//! [`InMemoryCommerceApi`] keeps everything in process and can be scripted
//! to fail.

mod http;
mod memory;

pub use http::HttpCommerceApi;
pub use memory::{ApiOp, InMemoryCommerceApi};

use crate::address::{AddressDraft, ShippingAddress};
use crate::cart::CartLineItem;
use crate::checkout::{NewOrder, OrderLine, OrderSummary};
use crate::error::RemoteError;
use crate::ids::{AddressId, CartRowId, OrderId, ProductId};
use crate::wishlist::WishlistEntry;
use async_trait::async_trait;
use yf_auth::Session;

/// Result type for backend calls.
pub type ApiResult<T> = Result<T, RemoteError>;

/// Backend operations used by the commerce engines.
#[async_trait]
pub trait CommerceApi: Send + Sync {
    /// The signed-in user's server cart.
    async fn fetch_cart(&self, session: &Session) -> ApiResult<Vec<CartLineItem>>;

    /// Add a product to the server cart, returning the resulting line.
    async fn add_cart_item(
        &self,
        session: &Session,
        product_id: ProductId,
        quantity: u32,
    ) -> ApiResult<CartLineItem>;

    /// Set the quantity of a server cart row.
    async fn update_cart_item(
        &self,
        session: &Session,
        row: CartRowId,
        quantity: u32,
    ) -> ApiResult<CartLineItem>;

    /// Delete a server cart row.
    async fn remove_cart_item(&self, session: &Session, row: CartRowId) -> ApiResult<()>;

    /// Delete every server cart row for the user.
    async fn clear_cart(&self, session: &Session) -> ApiResult<()>;

    /// The signed-in user's wishlist.
    async fn fetch_wishlist(&self, session: &Session) -> ApiResult<Vec<WishlistEntry>>;

    /// Save a product to the wishlist.
    async fn add_wishlist(&self, session: &Session, product_id: ProductId)
        -> ApiResult<WishlistEntry>;

    /// Remove a product from the wishlist.
    async fn remove_wishlist(&self, session: &Session, product_id: ProductId) -> ApiResult<()>;

    /// Saved shipping addresses.
    async fn list_addresses(&self, session: &Session) -> ApiResult<Vec<ShippingAddress>>;

    /// Save a new address.
    async fn create_address(
        &self,
        session: &Session,
        draft: &AddressDraft,
    ) -> ApiResult<ShippingAddress>;

    /// Replace a saved address.
    async fn update_address(
        &self,
        session: &Session,
        id: AddressId,
        draft: &AddressDraft,
    ) -> ApiResult<ShippingAddress>;

    /// Delete a saved address.
    async fn delete_address(&self, session: &Session, id: AddressId) -> ApiResult<()>;

    /// Insert an order record.
    async fn create_order(&self, session: &Session, order: &NewOrder) -> ApiResult<OrderSummary>;

    /// Insert the lines of an order in one bulk write.
    async fn create_order_items(
        &self,
        session: &Session,
        order_id: OrderId,
        lines: &[OrderLine],
    ) -> ApiResult<()>;

    /// Delete an order record and its lines.
    async fn delete_order(&self, session: &Session, order_id: OrderId) -> ApiResult<()>;

    /// Place an order with its lines in a single atomic call.
    async fn place_order_atomic(
        &self,
        session: &Session,
        order: &NewOrder,
        lines: &[OrderLine],
    ) -> ApiResult<OrderSummary>;

    /// The user's most recent orders, newest first.
    async fn list_orders(&self, session: &Session, limit: usize) -> ApiResult<Vec<OrderSummary>>;
}
