//! The address entered at checkout.

use crate::address::ShippingAddress;
use crate::error::ValidationErrors;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Indian mobile number.
static PHONE: LazyLock<Regex> = LazyLock::new(|| ascii_pattern(r"^[6-9]\d{9}$"));

/// Six-digit postal code.
static PINCODE: LazyLock<Regex> = LazyLock::new(|| ascii_pattern(r"^\d{6}$"));

/// `\d` matches ASCII digits only, as in the storefront's form rules.
pub(crate) fn ascii_pattern(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .unicode(false)
        .build()
        .expect("Invalid regex")
}

/// Fields of the checkout address form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressField {
    FullName,
    Phone,
    AddressLine1,
    City,
    State,
    Pincode,
}

impl AddressField {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressField::FullName => "full_name",
            AddressField::Phone => "phone",
            AddressField::AddressLine1 => "address_line1",
            AddressField::City => "city",
            AddressField::State => "state",
            AddressField::Pincode => "pincode",
        }
    }
}

impl fmt::Display for AddressField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shipping address for one checkout.
///
/// Not stored anywhere until it is copied into the order record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutAddress {
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

impl CheckoutAddress {
    /// Check every field, collecting one message per invalid field.
    ///
    /// Values are checked exactly as entered.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if char_len(&self.full_name) < 2 {
            errors.push(AddressField::FullName, "Name is required");
        }
        if !PHONE.is_match(&self.phone) {
            errors.push(AddressField::Phone, "Enter valid 10-digit phone number");
        }
        if char_len(&self.address_line1) < 5 {
            errors.push(AddressField::AddressLine1, "Address is required");
        }
        if char_len(&self.city) < 2 {
            errors.push(AddressField::City, "City is required");
        }
        if char_len(&self.state) < 2 {
            errors.push(AddressField::State, "State is required");
        }
        if !PINCODE.is_match(&self.pincode) {
            errors.push(AddressField::Pincode, "Enter valid 6-digit pincode");
        }
        errors.into_result()
    }

    /// A copy with a blank second line dropped.
    pub fn normalized(&self) -> Self {
        Self {
            address_line2: self
                .address_line2
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string),
            ..self.clone()
        }
    }
}

impl From<&ShippingAddress> for CheckoutAddress {
    fn from(a: &ShippingAddress) -> Self {
        Self {
            full_name: a.name.clone(),
            phone: a.phone.clone(),
            address_line1: a.address_line1.clone(),
            address_line2: a.address_line2.clone(),
            city: a.city.clone(),
            state: a.state.clone(),
            pincode: a.zip_code.clone(),
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
