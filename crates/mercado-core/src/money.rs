//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    1200 × 0.18 = 215.99999999999997  ❌                                 │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    120000 cents × 1800 bps / 10000 = 21600 cents  ✅                    │
//! │                                                                         │
//! │  Prices, subtotals, IGV and totals are all stored as cents.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use mercado_core::money::Money;
//!
//! let price = Money::from_major_minor(10, 0); // S/ 10.00
//! let subtotal = price.checked_multiply_quantity(50).unwrap();
//! assert_eq!(subtotal.cents(), 50_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use ts_rs::TS;

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (céntimos).
///
/// The marketplace is single-currency, so no currency code is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use mercado_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ## Note
    /// For negative amounts, only the major unit should be negative.
    /// `from_major_minor(-5, 50)` = -5.50, not -4.50
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates tax at the given rate, rounding half up to the cent.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`.
    /// i128 keeps large wholesale orders (tonnes × price) from overflowing.
    ///
    /// ## Example
    /// ```rust
    /// use mercado_core::money::Money;
    /// use mercado_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_major_minor(500, 0);
    /// let igv = subtotal.calculate_tax(TaxRate::igv());
    /// assert_eq!(igv.cents(), 9_000); // S/ 90.00
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(tax_cents as i64)
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// Returns `None` on overflow instead of wrapping.
    ///
    /// ## User Workflow
    /// ```text
    /// Product: Papa amarilla S/ 10.00 per kg
    /// Order:   2 tn → 2000 kg
    ///      │
    ///      ▼
    /// checked_multiply_quantity(2000) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Subtotal: S/ 20000.00
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds two amounts, returning `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Formats as a plain two-decimal string (no currency symbol).
    ///
    /// ## Example
    /// ```rust
    /// use mercado_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(21_600).to_decimal_string(), "216.00");
    /// ```
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money with the sol symbol (debugging and logs only).
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S/ {}", self.to_decimal_string())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "S/ 10.99");
        assert_eq!(format!("{}", Money::from_cents(-550)), "S/ -5.50");
        assert_eq!(format!("{}", Money::zero()), "S/ 0.00");
    }

    #[test]
    fn test_igv_on_scenario_subtotals() {
        let rate = TaxRate::igv();
        assert_eq!(Money::from_cents(50_000).calculate_tax(rate).cents(), 9_000);
        assert_eq!(Money::from_cents(120_000).calculate_tax(rate).cents(), 21_600);
    }

    #[test]
    fn test_checked_add() {
        let a = Money::from_cents(1_500);
        assert_eq!(a.checked_add(Money::from_cents(270)), Some(Money::from_cents(1_770)));
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
    }

    #[test]
    fn test_tax_rounds_half_up() {
        // 0.18 × 0.25 = 0.045 → 0.05
        let tax = Money::from_cents(25).calculate_tax(TaxRate::igv());
        assert_eq!(tax.cents(), 5);
    }

    #[test]
    fn test_checked_multiply_quantity() {
        let unit_price = Money::from_cents(800);
        assert_eq!(unit_price.checked_multiply_quantity(150), Some(Money::from_cents(120_000)));
        assert_eq!(Money::from_cents(i64::MAX).checked_multiply_quantity(2), None);
    }

    #[test]
    fn test_to_decimal_string() {
        assert_eq!(Money::from_cents(9_000).to_decimal_string(), "90.00");
        assert_eq!(Money::from_cents(5).to_decimal_string(), "0.05");
        assert_eq!(Money::from_cents(-120).to_decimal_string(), "-1.20");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(50_000);
        let b = Money::from_cents(9_000);
        assert_eq!((a + b).cents(), 59_000);
        assert_eq!((a - b).cents(), 41_000);

        let mut c = Money::zero();
        c += a;
        assert_eq!(c, a);
        assert!(!c.is_zero());
        assert!(!c.is_negative());
    }
}
