//! Newtype IDs for type-safe identifiers.
//!
//! Products, addresses and orders are numbered by the backend. Cart lines
//! carry an opaque string identity; the only way to get one from a product
//! is [`LineItemId::for_product`], never by parsing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate numeric newtype IDs assigned by the backend.
macro_rules! define_numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Create a new ID.
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            /// Get the raw value.
            pub fn get(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

/// Macro to generate opaque string newtype IDs.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_numeric_id!(
    /// Catalog product identity, shared by the cart and the wishlist.
    ProductId
);
define_numeric_id!(
    /// Saved shipping address.
    AddressId
);
define_numeric_id!(
    /// Order record created by the backend.
    OrderId
);
define_numeric_id!(
    /// Server-side cart row, needed to update or delete a line remotely.
    CartRowId
);

define_id!(
    /// Identity of a cart line.
    LineItemId
);

impl LineItemId {
    const PRODUCT_PREFIX: &'static str = "p";

    /// The line identity used for a product. One line per product.
    pub fn for_product(product_id: ProductId) -> Self {
        Self(format!("{}{}", Self::PRODUCT_PREFIX, product_id.get()))
    }

    /// The product this line id was derived from, if it was derived from one.
    pub fn product_id(&self) -> Option<ProductId> {
        self.0
            .strip_prefix(Self::PRODUCT_PREFIX)
            .and_then(|n| n.parse::<u64>().ok())
            .map(ProductId::new)
    }
}

impl From<ProductId> for LineItemId {
    fn from(id: ProductId) -> Self {
        LineItemId::for_product(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_id_for_product() {
        let id = LineItemId::for_product(ProductId::new(4));
        assert_eq!(id.as_str(), "p4");
        assert_eq!(id.product_id(), Some(ProductId::new(4)));
    }

    #[test]
    fn test_opaque_line_id_has_no_product() {
        assert_eq!(LineItemId::new("gift-card").product_id(), None);
        assert_eq!(LineItemId::new("p").product_id(), None);
        assert_eq!(LineItemId::new("4").product_id(), None);
    }

    #[test]
    fn test_numeric_id_serializes_bare() {
        let json = serde_json::to_string(&ProductId::new(12)).unwrap();
        assert_eq!(json, "12");
        let id: AddressId = serde_json::from_str("3").unwrap();
        assert_eq!(id, AddressId::new(3));
    }

    #[test]
    fn test_id_display() {
        assert_eq!(format!("{}", OrderId::new(789)), "789");
        assert_eq!(format!("{}", LineItemId::new("p9")), "p9");
    }
}
