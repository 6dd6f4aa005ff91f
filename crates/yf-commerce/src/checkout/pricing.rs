//! Delivery charge and order totals.

use crate::money::Money;
use serde::{Deserialize, Serialize};

/// Flat delivery charge, waived at or above a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryPolicy {
    pub free_threshold: Money,
    pub flat_charge: Money,
}

impl DeliveryPolicy {
    pub fn new(free_threshold: Money, flat_charge: Money) -> Self {
        Self {
            free_threshold,
            flat_charge,
        }
    }

    /// Delivery charge for a cart total.
    pub fn delivery_charge(&self, subtotal: Money) -> Money {
        if subtotal >= self.free_threshold {
            Money::ZERO
        } else {
            self.flat_charge
        }
    }

    /// How much more must be added to ship free, if anything.
    pub fn amount_to_free_delivery(&self, subtotal: Money) -> Option<Money> {
        (subtotal < self.free_threshold).then(|| self.free_threshold - subtotal)
    }

    /// Totals for a cart total.
    pub fn quote(&self, subtotal: Money) -> OrderTotals {
        let delivery_charge = self.delivery_charge(subtotal);
        OrderTotals {
            subtotal,
            delivery_charge,
            grand_total: subtotal + delivery_charge,
        }
    }
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self::new(Money::from_rupees(999), Money::from_rupees(99))
    }
}

/// Price breakdown of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub delivery_charge: Money,
    pub grand_total: Money,
}

impl OrderTotals {
    /// Check if delivery is free.
    pub fn is_free_delivery(&self) -> bool {
        self.delivery_charge.is_zero()
    }
}
