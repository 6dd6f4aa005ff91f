//! In-process backend.
//!
//! Behaves like the real backend closely enough for the engines to be
//! exercised end to end, and can be told to fail or stall the next call of
//! any operation.

use crate::address::{AddressDraft, ShippingAddress};
use crate::api::{ApiResult, CommerceApi};
use crate::cart::CartLineItem;
use crate::checkout::{NewOrder, OrderLine, OrderSummary};
use crate::error::{RemoteError, RemoteErrorKind};
use crate::ids::{AddressId, CartRowId, LineItemId, OrderId, ProductId};
use crate::money::Money;
use crate::wishlist::{ProductSnapshot, WishlistEntry};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use yf_auth::{Session, UserId};

/// Every backend operation, for scripting failures and counting calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOp {
    FetchCart,
    AddCartItem,
    UpdateCartItem,
    RemoveCartItem,
    ClearCart,
    FetchWishlist,
    AddWishlist,
    RemoveWishlist,
    ListAddresses,
    CreateAddress,
    UpdateAddress,
    DeleteAddress,
    CreateOrder,
    CreateOrderItems,
    DeleteOrder,
    PlaceOrderAtomic,
    ListOrders,
}

#[derive(Debug, Clone)]
struct CartRow {
    id: CartRowId,
    user: UserId,
    product: ProductId,
    quantity: u32,
}

#[derive(Debug, Clone)]
struct StoredOrder {
    user: UserId,
    summary: OrderSummary,
    items: Vec<OrderLine>,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    products: HashMap<ProductId, ProductSnapshot>,
    cart: Vec<CartRow>,
    wishlist: HashMap<UserId, Vec<ProductId>>,
    addresses: HashMap<UserId, Vec<ShippingAddress>>,
    orders: Vec<StoredOrder>,
    failures: HashMap<ApiOp, VecDeque<RemoteError>>,
    stalls: HashSet<ApiOp>,
    calls: HashMap<ApiOp, usize>,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn product(&self, id: ProductId) -> ApiResult<&ProductSnapshot> {
        self.products
            .get(&id)
            .ok_or_else(|| RemoteError::new(RemoteErrorKind::NotFound, "Product not found"))
    }

    fn cart_line(&self, row: &CartRow) -> ApiResult<CartLineItem> {
        let product = self.product(row.product)?;
        let unit_price = product.sale_price();
        Ok(CartLineItem {
            id: LineItemId::for_product(row.product),
            product_id: row.product,
            name: product.name.clone(),
            unit_price,
            original_price: (product.price > unit_price).then_some(product.price),
            image: product.image.clone(),
            quantity: row.quantity,
            category: "General".to_string(),
            remote_id: Some(row.id),
        })
    }

    fn user_order(&self, user: UserId, id: OrderId) -> ApiResult<usize> {
        self.orders
            .iter()
            .position(|o| o.user == user && o.summary.id == id)
            .ok_or_else(|| RemoteError::new(RemoteErrorKind::NotFound, "Order not found"))
    }

    fn insert_order(&mut self, user: UserId, order: &NewOrder) -> ApiResult<OrderSummary> {
        if self
            .orders
            .iter()
            .any(|o| o.summary.order_number == order.order_number)
        {
            return Err(RemoteError::new(
                RemoteErrorKind::Conflict,
                "order number already exists",
            ));
        }
        let summary = OrderSummary {
            id: OrderId::new(self.next_id()),
            order_number: order.order_number.clone(),
            status: order.status,
            total_amount: order.total_amount,
            created_at: Some(Utc::now()),
        };
        self.orders.push(StoredOrder {
            user,
            summary: summary.clone(),
            items: Vec::new(),
        });
        Ok(summary)
    }
}

/// A backend kept entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryCommerceApi {
    state: Mutex<State>,
}

impl InMemoryCommerceApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a catalog product at full price.
    pub fn with_product(self, id: ProductId, name: impl Into<String>, price: Money) -> Self {
        self.with_snapshot(ProductSnapshot::new(id, name, price))
    }

    /// Add a catalog product.
    pub fn with_snapshot(self, product: ProductSnapshot) -> Self {
        self.lock().products.insert(product.id, product);
        self
    }

    /// Put a row straight into a user's server cart.
    pub fn seed_cart(&self, user: UserId, product: ProductId, quantity: u32) -> CartRowId {
        let mut state = self.lock();
        let id = CartRowId::new(state.next_id());
        state.cart.push(CartRow {
            id,
            user,
            product,
            quantity,
        });
        id
    }

    /// Make the next call of `op` fail with `error`.
    pub fn fail_next(&self, op: ApiOp, error: RemoteError) {
        self.lock().failures.entry(op).or_default().push_back(error);
    }

    /// Make the next call of `op` never complete, before it changes anything.
    pub fn stall_next(&self, op: ApiOp) {
        self.lock().stalls.insert(op);
    }

    /// How many times `op` has been called, failures included.
    pub fn calls(&self, op: ApiOp) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Every order stored for a user, oldest first.
    pub fn orders(&self, user: UserId) -> Vec<OrderSummary> {
        self.lock()
            .orders
            .iter()
            .filter(|o| o.user == user)
            .map(|o| o.summary.clone())
            .collect()
    }

    /// The lines stored for an order.
    pub fn order_items(&self, order_id: OrderId) -> Vec<OrderLine> {
        self.lock()
            .orders
            .iter()
            .find(|o| o.summary.id == order_id)
            .map(|o| o.items.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record a call and hand back its scripted failure, if any.
    async fn enter(&self, op: ApiOp) -> ApiResult<MutexGuard<'_, State>> {
        let stalled = {
            let mut state = self.lock();
            *state.calls.entry(op).or_default() += 1;
            state.stalls.remove(&op)
        };
        if stalled {
            tracing::debug!(?op, "stalled call");
            std::future::pending::<()>().await;
        }

        let mut state = self.lock();
        match state.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(error) => {
                tracing::debug!(?op, error = %error, "scripted failure");
                Err(error)
            }
            None => Ok(state),
        }
    }
}

#[async_trait]
impl CommerceApi for InMemoryCommerceApi {
    async fn fetch_cart(&self, session: &Session) -> ApiResult<Vec<CartLineItem>> {
        let state = self.enter(ApiOp::FetchCart).await?;
        let user = session.user_id();
        state
            .cart
            .iter()
            .filter(|row| row.user == user)
            .map(|row| state.cart_line(row))
            .collect()
    }

    async fn add_cart_item(
        &self,
        session: &Session,
        product_id: ProductId,
        quantity: u32,
    ) -> ApiResult<CartLineItem> {
        let mut state = self.enter(ApiOp::AddCartItem).await?;
        state.product(product_id)?;
        let user = session.user_id();
        let index = match state
            .cart
            .iter()
            .position(|r| r.user == user && r.product == product_id)
        {
            Some(index) => {
                state.cart[index].quantity += quantity;
                index
            }
            None => {
                let id = CartRowId::new(state.next_id());
                state.cart.push(CartRow {
                    id,
                    user,
                    product: product_id,
                    quantity,
                });
                state.cart.len() - 1
            }
        };
        state.cart_line(&state.cart[index])
    }

    async fn update_cart_item(
        &self,
        session: &Session,
        row: CartRowId,
        quantity: u32,
    ) -> ApiResult<CartLineItem> {
        let mut state = self.enter(ApiOp::UpdateCartItem).await?;
        let user = session.user_id();
        let index = state
            .cart
            .iter()
            .position(|r| r.user == user && r.id == row)
            .ok_or_else(|| RemoteError::new(RemoteErrorKind::NotFound, "Cart item not found"))?;
        state.cart[index].quantity = quantity;
        state.cart_line(&state.cart[index])
    }

    async fn remove_cart_item(&self, session: &Session, row: CartRowId) -> ApiResult<()> {
        let mut state = self.enter(ApiOp::RemoveCartItem).await?;
        let user = session.user_id();
        state.cart.retain(|r| !(r.user == user && r.id == row));
        Ok(())
    }

    async fn clear_cart(&self, session: &Session) -> ApiResult<()> {
        let mut state = self.enter(ApiOp::ClearCart).await?;
        let user = session.user_id();
        state.cart.retain(|r| r.user != user);
        Ok(())
    }

    async fn fetch_wishlist(&self, session: &Session) -> ApiResult<Vec<WishlistEntry>> {
        let state = self.enter(ApiOp::FetchWishlist).await?;
        let saved = state.wishlist.get(&session.user_id()).cloned().unwrap_or_default();
        saved
            .into_iter()
            .map(|id| state.product(id).cloned().map(WishlistEntry::new))
            .collect()
    }

    async fn add_wishlist(
        &self,
        session: &Session,
        product_id: ProductId,
    ) -> ApiResult<WishlistEntry> {
        let mut state = self.enter(ApiOp::AddWishlist).await?;
        let product = state.product(product_id)?.clone();
        let saved = state.wishlist.entry(session.user_id()).or_default();
        if saved.contains(&product_id) {
            return Err(RemoteError::new(
                RemoteErrorKind::Conflict,
                "Product already in wishlist",
            ));
        }
        saved.push(product_id);
        Ok(WishlistEntry::new(product))
    }

    async fn remove_wishlist(&self, session: &Session, product_id: ProductId) -> ApiResult<()> {
        let mut state = self.enter(ApiOp::RemoveWishlist).await?;
        if let Some(saved) = state.wishlist.get_mut(&session.user_id()) {
            saved.retain(|id| *id != product_id);
        }
        Ok(())
    }

    async fn list_addresses(&self, session: &Session) -> ApiResult<Vec<ShippingAddress>> {
        let state = self.enter(ApiOp::ListAddresses).await?;
        Ok(state.addresses.get(&session.user_id()).cloned().unwrap_or_default())
    }

    async fn create_address(
        &self,
        session: &Session,
        draft: &AddressDraft,
    ) -> ApiResult<ShippingAddress> {
        let mut state = self.enter(ApiOp::CreateAddress).await?;
        let address = ShippingAddress::from_draft(AddressId::new(state.next_id()), draft.clone());
        state
            .addresses
            .entry(session.user_id())
            .or_default()
            .push(address.clone());
        Ok(address)
    }

    async fn update_address(
        &self,
        session: &Session,
        id: AddressId,
        draft: &AddressDraft,
    ) -> ApiResult<ShippingAddress> {
        let mut state = self.enter(ApiOp::UpdateAddress).await?;
        let existing = state
            .addresses
            .get_mut(&session.user_id())
            .and_then(|list| list.iter_mut().find(|a| a.id == id))
            .ok_or_else(|| RemoteError::new(RemoteErrorKind::NotFound, "Address not found"))?;
        *existing = ShippingAddress::from_draft(id, draft.clone());
        Ok(existing.clone())
    }

    async fn delete_address(&self, session: &Session, id: AddressId) -> ApiResult<()> {
        let mut state = self.enter(ApiOp::DeleteAddress).await?;
        let list = state.addresses.entry(session.user_id()).or_default();
        let before = list.len();
        list.retain(|a| a.id != id);
        if list.len() == before {
            return Err(RemoteError::new(RemoteErrorKind::NotFound, "Address not found"));
        }
        Ok(())
    }

    async fn create_order(&self, session: &Session, order: &NewOrder) -> ApiResult<OrderSummary> {
        let mut state = self.enter(ApiOp::CreateOrder).await?;
        state.insert_order(session.user_id(), order)
    }

    async fn create_order_items(
        &self,
        session: &Session,
        order_id: OrderId,
        lines: &[OrderLine],
    ) -> ApiResult<()> {
        let mut state = self.enter(ApiOp::CreateOrderItems).await?;
        let index = state.user_order(session.user_id(), order_id)?;
        state.orders[index].items.extend_from_slice(lines);
        Ok(())
    }

    async fn delete_order(&self, session: &Session, order_id: OrderId) -> ApiResult<()> {
        let mut state = self.enter(ApiOp::DeleteOrder).await?;
        let index = state.user_order(session.user_id(), order_id)?;
        state.orders.remove(index);
        Ok(())
    }

    async fn place_order_atomic(
        &self,
        session: &Session,
        order: &NewOrder,
        lines: &[OrderLine],
    ) -> ApiResult<OrderSummary> {
        let mut state = self.enter(ApiOp::PlaceOrderAtomic).await?;
        let summary = state.insert_order(session.user_id(), order)?;
        if let Some(stored) = state.orders.last_mut() {
            stored.items = lines.to_vec();
        }
        Ok(summary)
    }

    async fn list_orders(&self, session: &Session, limit: usize) -> ApiResult<Vec<OrderSummary>> {
        let state = self.enter(ApiOp::ListOrders).await?;
        let user = session.user_id();
        Ok(state
            .orders
            .iter()
            .rev()
            .filter(|o| o.user == user)
            .take(limit)
            .map(|o| o.summary.clone())
            .collect())
    }
}
