//! Cart line items.

use crate::ids::{CartRowId, LineItemId, ProductId};
use crate::money::Money;
use crate::reconcile::Keyed;
use serde::{Deserialize, Serialize};

/// A product as it is added to the cart, before it has a quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCartItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub original_price: Option<Money>,
    pub image: String,
    pub category: String,
}

impl NewCartItem {
    /// Create an item with no image, no markdown and the "General" category.
    pub fn new(product_id: ProductId, name: impl Into<String>, unit_price: Money) -> Self {
        Self {
            product_id,
            name: name.into(),
            unit_price,
            original_price: None,
            image: String::new(),
            category: "General".to_string(),
        }
    }

    /// Set the pre-discount price.
    pub fn with_original_price(mut self, price: Money) -> Self {
        self.original_price = Some(price);
        self
    }

    /// Set the image reference.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Set the category label.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// The line this item becomes, with quantity 1.
    pub fn into_line(self) -> CartLineItem {
        CartLineItem {
            id: LineItemId::for_product(self.product_id),
            product_id: self.product_id,
            name: self.name,
            unit_price: self.unit_price,
            original_price: self.original_price.filter(|p| *p > self.unit_price),
            image: self.image,
            quantity: 1,
            category: self.category,
            remote_id: None,
        }
    }
}

/// One row of the cart: a product and how many of it.
///
/// A line never holds a quantity of zero; setting one removes the line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub id: LineItemId,
    pub product_id: ProductId,
    pub name: String,
    /// Price actually charged per unit.
    pub unit_price: Money,
    /// Pre-discount price, when the product is marked down.
    pub original_price: Option<Money>,
    pub image: String,
    pub quantity: u32,
    pub category: String,
    /// Server row backing this line, once the server knows about it.
    pub remote_id: Option<CartRowId>,
}

impl CartLineItem {
    /// `unit_price × quantity`.
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }

    /// Markdown as a whole percentage of the original price.
    pub fn discount_percent(&self) -> u8 {
        match self.original_price {
            Some(original) => original.percent_of(original.saturating_sub(self.unit_price)),
            None => 0,
        }
    }
}

impl Keyed for CartLineItem {
    type Key = LineItemId;

    fn key(&self) -> LineItemId {
        self.id.clone()
    }

    fn keep_server_fields(&mut self, remote: &Self) {
        self.remote_id = remote.remote_id.or(self.remote_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_item_becomes_single_line() {
        let line = NewCartItem::new(ProductId::new(1), "Canvas Buddha Painting", Money::from_rupees(2499))
            .with_original_price(Money::from_rupees(3299))
            .with_image("canvas-buddha.jpg")
            .with_category("Paintings")
            .into_line();

        assert_eq!(line.id, LineItemId::for_product(ProductId::new(1)));
        assert_eq!(line.quantity, 1);
        assert_eq!(line.discount_percent(), 24);
        assert_eq!(line.line_total(), Money::from_rupees(2499));
    }

    #[test]
    fn test_original_price_below_unit_price_is_dropped() {
        let line = NewCartItem::new(ProductId::new(2), "Vase", Money::from_rupees(500))
            .with_original_price(Money::from_rupees(400))
            .into_line();
        assert_eq!(line.original_price, None);
        assert_eq!(line.discount_percent(), 0);
    }
}
