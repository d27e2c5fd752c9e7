//! Non-negative money, quantity and discount primitives.
//!
//! Every amount in a sale is a [`Money`] value: a decimal that can never be
//! negative. Constructors clamp instead of failing, so a negative price or a
//! stray minus sign from a text box never enters the model. Arithmetic
//! saturates rather than panicking on overflow.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of decimal places amounts are rounded to for presentation.
const DISPLAY_SCALE: u32 = 2;

/// A non-negative amount of money in the store's single currency.
///
/// Serialized as a JSON number, which is what the backend stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create an amount, clamping negative values to zero.
    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        Self(amount.max(Decimal::ZERO))
    }

    /// Create an amount from whole currency units.
    #[must_use]
    pub fn from_units(units: i64) -> Self {
        Self::new(Decimal::from(units))
    }

    /// Parse free-text numeric input the way a cashier types it.
    ///
    /// Every character that is not an ASCII digit or a dot is discarded before
    /// parsing. Input that is still not a number afterwards (empty, `"1.2.3"`)
    /// yields zero.
    ///
    /// ```
    /// use optic_desk_core::Money;
    ///
    /// assert_eq!(Money::parse_lenient("Rs 1,500.50"), "1500.50".parse().unwrap());
    /// assert_eq!(Money::parse_lenient("abc"), Money::ZERO);
    /// ```
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        let sanitized: String = raw
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        let trimmed = sanitized.trim_end_matches('.');
        if trimmed.is_empty() {
            return Self::ZERO;
        }
        let normalized = if trimmed.starts_with('.') {
            format!("0{trimmed}")
        } else {
            trimmed.to_owned()
        };
        Decimal::from_str(&normalized).map_or(Self::ZERO, Self::new)
    }

    /// Returns the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Subtract, stopping at zero.
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        Self::new(self.0.saturating_sub(other.0))
    }

    /// Multiply by a quantity.
    #[must_use]
    pub fn times(self, quantity: Quantity) -> Self {
        Self(self.0.saturating_mul(Decimal::from(quantity.get())))
    }

    /// The given percentage of this amount, unrounded.
    #[must_use]
    pub fn percentage(self, percent: DiscountPercent) -> Self {
        Self(self.0.saturating_mul(percent.value()) / Decimal::ONE_HUNDRED)
    }

    /// Round to two decimal places, midpoint away from zero.
    #[must_use]
    pub fn rounded(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Step the amount up or down, clamping at zero.
    #[must_use]
    pub fn stepped(self, step: Decimal, up: bool) -> Self {
        if up {
            Self(self.0.saturating_add(step))
        } else {
            Self::new(self.0.saturating_sub(step))
        }
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.rounded().0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    /// Strict parse; negative values are clamped to zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Self::new)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = rust_decimal::serde::float::deserialize(deserializer)?;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(serde::de::Error::custom(format!(
                "amount must not be negative (got {amount})"
            )));
        }
        Ok(Self(amount))
    }
}

/// A non-negative item count.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    /// Zero items.
    pub const ZERO: Self = Self(0);
    /// A single item.
    pub const ONE: Self = Self(1);

    /// Create a quantity.
    #[must_use]
    pub const fn new(count: u32) -> Self {
        Self(count)
    }

    /// Create a quantity from a possibly negative count, clamping into range.
    #[must_use]
    pub fn clamped(count: i64) -> Self {
        Self(u32::try_from(count.max(0)).unwrap_or(u32::MAX))
    }

    /// Returns the count.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Step the count by one, clamping at zero.
    #[must_use]
    pub const fn stepped(self, up: bool) -> Self {
        if up {
            Self(self.0.saturating_add(1))
        } else {
            Self(self.0.saturating_sub(1))
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A discount percentage, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DiscountPercent(Decimal);

impl DiscountPercent {
    /// No discount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a percentage, clamping into `0..=100`.
    #[must_use]
    pub fn clamped(value: Decimal) -> Self {
        Self(value.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED))
    }

    /// Returns the percentage value.
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for DiscountPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}

impl Serialize for DiscountPercent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for DiscountPercent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        rust_decimal::serde::float::deserialize(deserializer).map(Self::clamped)
    }
}
