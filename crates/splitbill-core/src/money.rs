//! # Money Module
//!
//! Provides the `Money` type for stored monetary values.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Prices, tax and tip are stored as whole cents.                       │
//! │    Splitting an item between sharers produces a `Share` (exact         │
//! │    rational), never a rounded Money.                                    │
//! │                                                                         │
//! │  Floats appear only at the JSON boundary (extraction payloads and      │
//! │  HTTP bodies use major units) and are converted here, once.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use splitbill_core::money::Money;
//!
//! let price = Money::from_cents(1099); // $10.99
//! let line_total = price.multiply_quantity(2);
//! assert_eq!(line_total.cents(), 2198);
//!
//! let tip = Money::try_from_major(3.5, "tip").unwrap();
//! assert_eq!(tip.cents(), 350);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Item.price_cents ──► Item.line_total ──► Share (split per sharer)      │
/// │                                                                         │
/// │  Bill.tax_cents + Bill.tip_cents ──► total_tax_tip ──► Share per person │
/// │                                                                         │
/// │  BillSummary: every Share rounded back to Money for display            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use splitbill_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Converts a major-unit number (as sent by the extraction workflow or a
    /// client) into cents, rounding half away from zero.
    ///
    /// ## Errors
    /// `InvalidFormat` for NaN, infinities, and values outside the `i64`
    /// cent range. Sign is NOT checked here; use the validators for that.
    ///
    /// ## Example
    /// ```rust
    /// use splitbill_core::money::Money;
    ///
    /// assert_eq!(Money::try_from_major(12.5, "price").unwrap().cents(), 1250);
    /// assert_eq!(Money::try_from_major(0.125, "price").unwrap().cents(), 13);
    /// assert!(Money::try_from_major(f64::NAN, "price").is_err());
    /// ```
    pub fn try_from_major(amount: f64, field: &str) -> Result<Self, ValidationError> {
        if !amount.is_finite() {
            return Err(ValidationError::InvalidFormat {
                field: field.to_string(),
                reason: "amount must be a finite number".to_string(),
            });
        }

        // f64::round is half away from zero
        let cents = (amount * 100.0).round();
        if cents < i64::MIN as f64 || cents > i64::MAX as f64 {
            return Err(ValidationError::InvalidFormat {
                field: field.to_string(),
                reason: "amount is out of range".to_string(),
            });
        }

        Ok(Money(cents as i64))
    }

    /// Returns the value in major units for JSON output.
    ///
    /// ```rust
    /// use splitbill_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1250).to_major(), 12.5);
    /// ```
    #[inline]
    pub fn to_major(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use splitbill_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(1000); // $10.00
    /// let line_total = unit_price.multiply_quantity(2);
    /// assert_eq!(line_total.cents(), 2000); // $20.00
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money as `$12.34`. Debug output only; clients format their own.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
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

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
