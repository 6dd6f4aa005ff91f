//! Order types.

use crate::cart::CartLineItem;
use crate::checkout::address::ascii_pattern;
use crate::checkout::{CheckoutAddress, OrderTotals};
use crate::ids::{OrderId, ProductId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{LazyLock, Mutex};

/// Client-generated order number, also the idempotency key of a checkout attempt.
///
/// `YF`, then the millisecond timestamp in upper-case base 36, then three
/// random base-36 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

const PREFIX: &str = "YF";
const SUFFIX_LEN: usize = 3;
const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

static LAST_ISSUED: Mutex<Option<String>> = Mutex::new(None);

static ORDER_NUMBER: LazyLock<Regex> = LazyLock::new(|| ascii_pattern(r"^YF[0-9A-Z]+$"));

impl OrderNumber {
    /// Generate a number for the current instant.
    pub fn generate() -> Self {
        let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        Self::generate_at(millis)
    }

    /// Generate a number for the given millisecond timestamp.
    ///
    /// Never returns the same number twice in a row within this process.
    pub fn generate_at(millis: u64) -> Self {
        let mut last = LAST_ISSUED.lock().unwrap_or_else(|e| e.into_inner());
        let mut rng = rand::thread_rng();
        loop {
            let mut number = String::with_capacity(PREFIX.len() + 9 + SUFFIX_LEN);
            number.push_str(PREFIX);
            number.push_str(&to_base36(millis));
            for _ in 0..SUFFIX_LEN {
                number.push(char::from(DIGITS[rng.gen_range(0..DIGITS.len())]));
            }
            if last.as_deref() != Some(number.as_str()) {
                *last = Some(number.clone());
                return Self(number);
            }
        }
    }

    /// Accept a number received from the server.
    pub fn parse(s: &str) -> Option<Self> {
        Self::is_valid(s).then(|| Self(s.to_string()))
    }

    /// Check a string against `^YF[0-9A-Z]+$`.
    pub fn is_valid(s: &str) -> bool {
        ORDER_NUMBER.is_match(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    digits.into_iter().map(char::from).collect()
}

/// Order status. Owned by the server; the client only reads it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    #[serde(alias = "PENDING")]
    Pending,
    #[serde(alias = "SHIPPED")]
    Shipped,
    #[serde(alias = "DELIVERED")]
    Delivered,
    #[serde(alias = "CANCELLED")]
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Check if order is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// How the shopper pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "cod")]
    CashOnDelivery,
    #[serde(rename = "online")]
    Online,
}

impl PaymentMethod {
    /// Every method, in display order.
    pub const ALL: [PaymentMethod; 2] = [PaymentMethod::CashOnDelivery, PaymentMethod::Online];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "cod",
            PaymentMethod::Online => "online",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "Cash on Delivery",
            PaymentMethod::Online => "Online Payment",
        }
    }

    /// Only cash on delivery is accepted for now.
    pub fn is_enabled(&self) -> bool {
        matches!(self, PaymentMethod::CashOnDelivery)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A cart line frozen at submission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_image: String,
    pub price: Money,
    pub quantity: u32,
}

impl OrderLine {
    pub fn line_total(&self) -> Money {
        self.price.times(self.quantity)
    }
}

impl From<&CartLineItem> for OrderLine {
    fn from(line: &CartLineItem) -> Self {
        Self {
            product_id: line.product_id,
            product_name: line.name.clone(),
            product_image: line.image.clone(),
            price: line.unit_price,
            quantity: line.quantity,
        }
    }
}

/// An order record as submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub status: OrderStatus,
    pub total_amount: Money,
    pub shipping_address: CheckoutAddress,
    pub payment_method: PaymentMethod,
}

/// An order record as the server reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub order_number: OrderNumber,
    #[serde(default)]
    pub status: OrderStatus,
    pub total_amount: Money,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A placed order, as held by a completed checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub status: OrderStatus,
    pub totals: OrderTotals,
    pub shipping_address: CheckoutAddress,
    pub payment_method: PaymentMethod,
    pub line_items: Vec<OrderLine>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Amount charged, delivery included.
    pub fn total_amount(&self) -> Money {
        self.totals.grand_total
    }

    /// Get total item count.
    pub fn item_count(&self) -> u32 {
        self.line_items.iter().map(|l| l.quantity).sum()
    }
}
