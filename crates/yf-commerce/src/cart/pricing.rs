//! Cart contents and derived totals.

use crate::cart::CartLineItem;
use crate::ids::{LineItemId, ProductId};
use crate::money::Money;
use serde::Serialize;

/// The cart's items with their totals.
///
/// Totals are recomputed from `items` on every change and cannot be set
/// independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CartState {
    items: Vec<CartLineItem>,
    total_items: u32,
    total_price: Money,
}

impl CartState {
    /// Build a state from items, dropping any line with quantity zero.
    pub fn from_items(items: Vec<CartLineItem>) -> Self {
        let mut state = Self {
            items,
            ..Self::default()
        };
        state.recompute();
        state
    }

    /// Items in insertion order.
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Sum of quantities.
    pub fn total_items(&self) -> u32 {
        self.total_items
    }

    /// Sum of `unit_price × quantity`.
    pub fn total_price(&self) -> Money {
        self.total_price
    }

    /// Check if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get a line by id.
    pub fn get(&self, id: &LineItemId) -> Option<&CartLineItem> {
        self.items.iter().find(|i| &i.id == id)
    }

    /// Check if any line is for this product.
    pub fn contains_product(&self, product_id: ProductId) -> bool {
        self.items.iter().any(|i| i.product_id == product_id)
    }

    pub(super) fn items_mut(&mut self) -> &mut Vec<CartLineItem> {
        &mut self.items
    }

    pub(super) fn replace(&mut self, items: Vec<CartLineItem>) {
        self.items = items;
        self.recompute();
    }

    pub(super) fn recompute(&mut self) {
        self.items.retain(|i| i.quantity > 0);
        self.total_items = self
            .items
            .iter()
            .fold(0u32, |acc, i| acc.saturating_add(i.quantity));
        self.total_price = self.items.iter().map(CartLineItem::line_total).sum();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::NewCartItem;

    fn line(id: u64, rupees: i64, quantity: u32) -> CartLineItem {
        let mut line = NewCartItem::new(ProductId::new(id), format!("Item {id}"), Money::from_rupees(rupees)).into_line();
        line.quantity = quantity;
        line
    }

    #[test]
    fn test_totals_from_items() {
        let state = CartState::from_items(vec![line(1, 2499, 1), line(4, 1299, 2)]);
        assert_eq!(state.total_items(), 3);
        assert_eq!(state.total_price(), Money::from_rupees(5097));
    }

    #[test]
    fn test_zero_quantity_lines_are_dropped() {
        let state = CartState::from_items(vec![line(1, 100, 0), line(2, 50, 3)]);
        assert_eq!(state.items().len(), 1);
        assert_eq!(state.total_items(), 3);
        assert!(state.get(&LineItemId::for_product(ProductId::new(1))).is_none());
    }

    #[test]
    fn test_empty_state() {
        let state = CartState::default();
        assert!(state.is_empty());
        assert_eq!(state.total_price(), Money::ZERO);
    }
}
