//! Money type for representing rupee amounts.
//!
//! Amounts are held as integer paise to avoid floating-point drift in
//! totals. On the wire (and in config files) money is a plain number of
//! rupees, which is what the backend speaks.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul, Sub};

/// Paise per rupee.
const MINOR_PER_MAJOR: i64 = 100;

/// A monetary value in Indian rupees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Money {
    paise: i64,
}

impl Money {
    /// Zero rupees.
    pub const ZERO: Money = Money { paise: 0 };

    /// Create from paise.
    pub const fn from_paise(paise: i64) -> Self {
        Self { paise }
    }

    /// Create from whole rupees.
    ///
    /// ```
    /// use yf_commerce::Money;
    /// assert_eq!(Money::from_rupees(999).paise(), 99_900);
    /// ```
    pub const fn from_rupees(rupees: i64) -> Self {
        Self {
            paise: rupees.saturating_mul(MINOR_PER_MAJOR),
        }
    }

    /// Create from a decimal rupee amount, rounding to the nearest paisa.
    pub fn from_decimal(rupees: f64) -> Self {
        Self {
            paise: (rupees * MINOR_PER_MAJOR as f64).round() as i64,
        }
    }

    /// Amount in paise.
    pub fn paise(&self) -> i64 {
        self.paise
    }

    /// Amount as decimal rupees.
    pub fn to_decimal(&self) -> f64 {
        self.paise as f64 / MINOR_PER_MAJOR as f64
    }

    /// Check if this is zero.
    pub fn is_zero(&self) -> bool {
        self.paise == 0
    }

    /// Check if this is positive.
    pub fn is_positive(&self) -> bool {
        self.paise > 0
    }

    /// Check if this is negative.
    pub fn is_negative(&self) -> bool {
        self.paise < 0
    }

    /// Multiply by a quantity, saturating instead of overflowing.
    pub fn times(&self, quantity: u32) -> Money {
        Money::from_paise(self.paise.saturating_mul(i64::from(quantity)))
    }

    /// Subtract, flooring at zero.
    pub fn saturating_sub(&self, other: Money) -> Money {
        Money::from_paise(self.paise.saturating_sub(other.paise).max(0))
    }

    /// Whole-number percentage of `self` that `part` represents.
    pub fn percent_of(&self, part: Money) -> u8 {
        if self.paise <= 0 || part.paise <= 0 {
            return 0;
        }
        let pct = (part.paise as f64 / self.paise as f64 * 100.0).round();
        pct.clamp(0.0, 100.0) as u8
    }

    /// Format as a display string (e.g., "₹5,097" or "₹24.50").
    pub fn display(&self) -> String {
        let sign = if self.paise < 0 { "-" } else { "" };
        let abs = self.paise.unsigned_abs();
        let rupees = group_indian(abs / MINOR_PER_MAJOR as u64);
        let paise = abs % MINOR_PER_MAJOR as u64;
        if paise == 0 {
            format!("{sign}\u{20b9}{rupees}")
        } else {
            format!("{sign}\u{20b9}{rupees}.{paise:02}")
        }
    }
}

/// Group digits the Indian way: last three, then pairs (1,00,000).
fn group_indian(n: u64) -> String {
    let digits = n.to_string();
    if digits.len() <= 3 {
        return digits;
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut out = String::with_capacity(digits.len() + digits.len() / 2);
    let lead = head.len() % 2;
    for (i, ch) in head.chars().enumerate() {
        if i > 0 && (i + 2 - lead) % 2 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.push(',');
    out.push_str(tail);
    out
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money::from_paise(self.paise.saturating_add(other.paise))
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money::from_paise(self.paise.saturating_sub(other.paise))
    }
}

impl Mul<u32> for Money {
    type Output = Money;

    fn mul(self, quantity: u32) -> Money {
        self.times(quantity)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.paise % MINOR_PER_MAJOR == 0 {
            serializer.serialize_i64(self.paise / MINOR_PER_MAJOR)
        } else {
            serializer.serialize_f64(self.to_decimal())
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        f64::deserialize(deserializer).map(Money::from_decimal)
    }
}
