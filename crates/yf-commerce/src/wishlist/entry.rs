//! Wishlist entries.

use crate::ids::ProductId;
use crate::money::Money;
use crate::reconcile::Keyed;
use serde::{Deserialize, Serialize};

/// What the wishlist remembers about a product when it is saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    pub price: Money,
    #[serde(default)]
    pub discount_percent: u8,
}

impl ProductSnapshot {
    /// Snapshot with only the required fields set.
    pub fn new(id: ProductId, name: impl Into<String>, price: Money) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            image: String::new(),
            price,
            discount_percent: 0,
        }
    }

    /// Price after the discount.
    pub fn sale_price(&self) -> Money {
        let off = self.price.paise().saturating_mul(i64::from(self.discount_percent)) / 100;
        Money::from_paise(self.price.paise() - off)
    }
}

/// A saved product. The wishlist holds at most one entry per product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistEntry {
    pub product_id: ProductId,
    pub product: ProductSnapshot,
}

impl WishlistEntry {
    /// Entry for a product snapshot.
    pub fn new(product: ProductSnapshot) -> Self {
        Self {
            product_id: product.id,
            product,
        }
    }
}

impl From<ProductSnapshot> for WishlistEntry {
    fn from(product: ProductSnapshot) -> Self {
        Self::new(product)
    }
}

impl Keyed for WishlistEntry {
    type Key = ProductId;

    fn key(&self) -> ProductId {
        self.product_id
    }
}
