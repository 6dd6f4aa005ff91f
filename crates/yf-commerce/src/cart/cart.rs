//! The cart engine.

use crate::cart::{CartLineItem, CartState, NewCartItem};
use crate::error::{CommerceError, RemoteError};
use crate::ids::{LineItemId, ProductId};
use crate::money::Money;
use crate::reconcile::{FetchTicket, Reconciler, SyncOutcome};
use crate::status::RemoteStatus;

/// Remote operations the cart performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartOp {
    Fetch,
    Add,
    Update,
    Remove,
    Clear,
}

/// A shopping cart.
///
/// Local operations apply immediately and cannot fail. Remote operations
/// live in `cart::remote`; their results are merged through the same
/// reconciliation bookkeeping, so a slow fetch never undoes a later local
/// edit.
#[derive(Debug, Default)]
pub struct Cart {
    state: CartState,
    sync: Reconciler<LineItemId>,
    status: RemoteStatus<CartOp>,
}

impl Cart {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current items and totals.
    pub fn state(&self) -> &CartState {
        &self.state
    }

    /// Items in insertion order.
    pub fn items(&self) -> &[CartLineItem] {
        self.state.items()
    }

    /// Sum of quantities.
    pub fn total_items(&self) -> u32 {
        self.state.total_items()
    }

    /// Sum of `unit_price × quantity`.
    pub fn total_price(&self) -> Money {
        self.state.total_price()
    }

    /// Check if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// Get a line by id.
    pub fn get(&self, id: &LineItemId) -> Option<&CartLineItem> {
        self.state.get(id)
    }

    /// Check if the cart holds this product.
    pub fn contains_product(&self, product_id: ProductId) -> bool {
        self.state.contains_product(product_id)
    }

    /// Check if a line has a local change no fetch has confirmed yet.
    pub fn is_pending(&self, id: &LineItemId) -> bool {
        self.sync.is_pending(id)
    }

    /// Status of the most recent remote operation.
    pub fn status(&self) -> &RemoteStatus<CartOp> {
        &self.status
    }

    /// The recorded remote error, handed out once.
    pub fn take_error(&mut self) -> Option<RemoteError> {
        self.status.take_error()
    }

    /// Add one unit of a product.
    ///
    /// Increments the existing line, or appends a new line with quantity 1.
    /// Returns the line's new quantity.
    pub fn add_item(&mut self, item: NewCartItem) -> u32 {
        let id = LineItemId::for_product(item.product_id);
        let items = self.state.items_mut();
        let quantity = match items.iter_mut().find(|i| i.id == id) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(1);
                existing.quantity
            }
            None => {
                items.push(item.into_line());
                1
            }
        };
        self.state.recompute();
        self.sync.touch(id.clone());
        tracing::debug!(line = %id, quantity, "cart item added");
        quantity
    }

    /// Remove a line. Removing an absent line is a no-op.
    pub fn remove_item(&mut self, id: &LineItemId) -> bool {
        let items = self.state.items_mut();
        let before = items.len();
        items.retain(|i| &i.id != id);
        let removed = items.len() < before;
        if removed {
            self.state.recompute();
            self.sync.tombstone(id.clone());
            tracing::debug!(line = %id, "cart item removed");
        }
        removed
    }

    /// Set a line's quantity; zero or less removes it.
    ///
    /// Returns `false` if the line is absent.
    pub fn set_quantity(&mut self, id: &LineItemId, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove_item(id);
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        let Some(line) = self.state.items_mut().iter_mut().find(|i| &i.id == id) else {
            return false;
        };
        line.quantity = quantity;
        self.state.recompute();
        self.sync.touch(id.clone());
        tracing::debug!(line = %id, quantity, "cart quantity set");
        true
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.state.replace(Vec::new());
        self.sync.clear();
        tracing::debug!("cart cleared");
    }

    /// Issue a fetch of the server cart.
    ///
    /// Any fetch issued earlier and still outstanding is superseded.
    pub fn begin_sync(&mut self) -> FetchTicket {
        self.status.begin(CartOp::Fetch);
        self.sync.issue()
    }

    /// Apply the response to a fetch issued by [`Cart::begin_sync`].
    ///
    /// On failure the local collection is left as it was and the error is
    /// recorded.
    pub fn complete_sync(
        &mut self,
        ticket: FetchTicket,
        response: Result<Vec<CartLineItem>, RemoteError>,
    ) -> Result<SyncOutcome, CommerceError> {
        if !self.sync.is_current(&ticket) {
            tracing::warn!(
                generation = ticket.generation(),
                "discarding superseded cart fetch"
            );
            return Ok(SyncOutcome::Superseded);
        }
        let snapshot = match response {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.status.fail(CartOp::Fetch, e.clone());
                return Err(e.into());
            }
        };
        let Some(merged) = self.sync.merge(ticket, self.state.items(), snapshot) else {
            return Ok(SyncOutcome::Superseded);
        };
        self.state.replace(merged);
        self.status.succeed();
        tracing::info!(
            lines = self.state.items().len(),
            total_items = self.state.total_items(),
            "cart synced"
        );
        Ok(SyncOutcome::Applied)
    }

    /// Put a server-confirmed line in place of the local one.
    pub(crate) fn apply_confirmed(&mut self, line: CartLineItem) {
        let id = line.id.clone();
        let items = self.state.items_mut();
        match items.iter_mut().find(|i| i.id == id) {
            Some(existing) => *existing = line,
            None => items.push(line),
        }
        self.state.recompute();
        self.sync.touch(id);
    }

    pub(crate) fn status_mut(&mut self) -> &mut RemoteStatus<CartOp> {
        &mut self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::CartRowId;

    fn item(id: u64, rupees: i64) -> NewCartItem {
        NewCartItem::new(ProductId::new(id), format!("Product {id}"), Money::from_rupees(rupees))
    }

    fn line_id(id: u64) -> LineItemId {
        LineItemId::for_product(ProductId::new(id))
    }

    fn assert_totals_consistent(cart: &Cart) {
        let items: u32 = cart.items().iter().map(|i| i.quantity).sum();
        let price: Money = cart.items().iter().map(|i| i.unit_price * i.quantity).sum();
        assert_eq!(cart.total_items(), items);
        assert_eq!(cart.total_price(), price);
        assert!(cart.items().iter().all(|i| i.quantity >= 1));
    }

    #[test]
    fn test_add_twice_yields_one_line_with_quantity_two() {
        let mut cart = Cart::new();
        cart.add_item(item(1, 2499));
        cart.add_item(item(1, 2499));

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.get(&line_id(1)).map(|l| l.quantity), Some(2));
        assert_totals_consistent(&cart);
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut cart = Cart::new();
        cart.add_item(item(3, 10));
        cart.add_item(item(1, 10));
        cart.add_item(item(3, 10));
        let order: Vec<_> = cart.items().iter().map(|i| i.product_id.get()).collect();
        assert_eq!(order, vec![3, 1]);
    }

    #[test]
    fn test_set_quantity_non_positive_removes() {
        for n in [0, -1, -50] {
            let mut cart = Cart::new();
            cart.add_item(item(1, 100));
            cart.add_item(item(2, 200));
            assert!(cart.set_quantity(&line_id(1), n));
            assert!(cart.get(&line_id(1)).is_none());
            assert_totals_consistent(&cart);
        }
    }

    #[test]
    fn test_set_quantity_absent_is_noop() {
        let mut cart = Cart::new();
        cart.add_item(item(1, 100));
        assert!(!cart.set_quantity(&line_id(9), 4));
        assert!(!cart.remove_item(&line_id(9)));
        assert_eq!(cart.total_items(), 1);
    }

    #[test]
    fn test_totals_hold_across_operations() {
        let mut cart = Cart::new();
        cart.add_item(item(1, 2499));
        assert_totals_consistent(&cart);
        cart.add_item(item(4, 1299));
        cart.set_quantity(&line_id(4), 2);
        assert_totals_consistent(&cart);
        assert_eq!(cart.total_price(), Money::from_rupees(5097));
        cart.remove_item(&line_id(1));
        assert_totals_consistent(&cart);
        cart.set_quantity(&line_id(4), 7);
        assert_totals_consistent(&cart);
        cart.clear();
        assert_totals_consistent(&cart);
        assert_eq!(cart.total_price(), Money::ZERO);
        assert_eq!(cart.total_items(), 0);
    }

    #[test]
    fn test_removed_item_is_not_resurrected_by_older_fetch() {
        let mut cart = Cart::new();
        cart.add_item(item(1, 2499));
        let ticket = cart.begin_sync();

        cart.remove_item(&line_id(1));

        let stale = vec![item(1, 2499).into_line(), item(2, 899).into_line()];
        let outcome = cart.complete_sync(ticket, Ok(stale)).unwrap();

        assert_eq!(outcome, SyncOutcome::Applied);
        assert!(cart.get(&line_id(1)).is_none());
        assert!(cart.get(&line_id(2)).is_some());
        assert_totals_consistent(&cart);
    }

    #[test]
    fn test_fetch_replaces_edits_made_before_it_was_issued() {
        let mut cart = Cart::new();
        cart.add_item(item(1, 100));
        cart.set_quantity(&line_id(1), 5);
        let ticket = cart.begin_sync();

        let mut server = item(1, 100).into_line();
        server.quantity = 2;
        cart.complete_sync(ticket, Ok(vec![server])).unwrap();

        assert_eq!(cart.get(&line_id(1)).map(|l| l.quantity), Some(2));
        assert!(!cart.is_pending(&line_id(1)));
    }

    #[test]
    fn test_local_edit_during_fetch_keeps_server_row_id() {
        let mut cart = Cart::new();
        let ticket = cart.begin_sync();
        cart.add_item(item(1, 100));
        cart.add_item(item(1, 100));

        let mut server = item(1, 100).into_line();
        server.quantity = 1;
        server.remote_id = Some(CartRowId::new(41));
        cart.complete_sync(ticket, Ok(vec![server])).unwrap();

        let line = cart.get(&line_id(1)).unwrap();
        assert_eq!(line.quantity, 2);
        assert_eq!(line.remote_id, Some(CartRowId::new(41)));
    }

    #[test]
    fn test_older_fetch_completing_late_is_discarded() {
        let mut cart = Cart::new();
        let first = cart.begin_sync();
        let second = cart.begin_sync();

        let fresh = vec![item(2, 50).into_line()];
        cart.complete_sync(second, Ok(fresh)).unwrap();

        let stale = vec![item(1, 10).into_line()];
        let outcome = cart.complete_sync(first, Ok(stale)).unwrap();
        assert_eq!(outcome, SyncOutcome::Superseded);
        assert!(cart.contains_product(ProductId::new(2)));
        assert!(!cart.contains_product(ProductId::new(1)));
    }

    #[test]
    fn test_failed_fetch_leaves_items_and_records_error() {
        let mut cart = Cart::new();
        cart.add_item(item(1, 100));
        let ticket = cart.begin_sync();
        let err = cart
            .complete_sync(ticket, Err(RemoteError::network("offline")))
            .unwrap_err();

        assert!(matches!(err, CommerceError::Remote(_)));
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.take_error().map(|e| e.message), Some("offline".to_string()));
        assert!(cart.take_error().is_none());
    }

    #[test]
    fn test_server_lines_with_zero_quantity_are_dropped() {
        let mut cart = Cart::new();
        let ticket = cart.begin_sync();
        let mut zero = item(3, 10).into_line();
        zero.quantity = 0;
        cart.complete_sync(ticket, Ok(vec![zero])).unwrap();
        assert!(cart.is_empty());
    }
}
