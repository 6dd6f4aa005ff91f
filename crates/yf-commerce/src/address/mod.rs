//! Saved shipping addresses.

mod book;

pub use book::{AddressBook, AddressOp};

use crate::ids::AddressId;
use serde::{Deserialize, Serialize};

/// A shipping address saved on the server.
///
/// Phone and postal code are stored as given; they are only validated
/// when an address is used at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub id: AddressId,
    pub name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
    pub is_default: bool,
}

impl ShippingAddress {
    /// Build a saved address from a draft and its server id.
    pub fn from_draft(id: AddressId, draft: AddressDraft) -> Self {
        Self {
            id,
            name: draft.name,
            phone: draft.phone,
            address_line1: draft.address_line1,
            address_line2: draft.address_line2,
            city: draft.city,
            state: draft.state,
            country: draft.country,
            zip_code: draft.zip_code,
            is_default: draft.is_default,
        }
    }

    /// Single-line summary for listings.
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.address_line1.as_str()];
        if let Some(line2) = self.address_line2.as_deref().filter(|s| !s.is_empty()) {
            parts.push(line2);
        }
        parts.extend([self.city.as_str(), self.state.as_str(), self.zip_code.as_str()]);
        parts.join(", ")
    }
}

/// An address as submitted for creation or update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressDraft {
    pub name: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    #[serde(default = "default_country")]
    pub country: String,
    pub zip_code: String,
    #[serde(default)]
    pub is_default: bool,
}

fn default_country() -> String {
    "India".to_string()
}

impl From<&ShippingAddress> for AddressDraft {
    fn from(a: &ShippingAddress) -> Self {
        Self {
            name: a.name.clone(),
            phone: a.phone.clone(),
            address_line1: a.address_line1.clone(),
            address_line2: a.address_line2.clone(),
            city: a.city.clone(),
            state: a.state.clone(),
            country: a.country.clone(),
            zip_code: a.zip_code.clone(),
            is_default: a.is_default,
        }
    }
}
