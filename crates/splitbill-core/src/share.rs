//! # Share Module
//!
//! Exact fractional amounts of cents.
//!
//! An item split three ways gives each sharer a third of its line total.
//! `Money` can't hold that, so the allocation works in `Share` and rounds
//! only when building the presentation summary.
//!
//! ```text
//! $10.00 item, 3 sharers
//!
//!   Money:  333 + 333 + 333 = 999        ❌ one cent leaked
//!   Share:  1000/3 + 1000/3 + 1000/3 = 1000  ✅ exact
//! ```

use num_rational::Ratio;
use num_traits::{Signed, Zero};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

use crate::money::Money;

/// Exact amount of cents, possibly fractional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Share(Ratio<i128>);

impl Share {
    #[inline]
    pub fn zero() -> Self {
        Share(Ratio::zero())
    }

    /// Builds a share from a whole number of cents.
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Share(Ratio::from_integer(cents as i128))
    }

    /// Numerator and denominator in cents, reduced, denominator positive.
    pub fn as_fraction(&self) -> (i128, i128) {
        (*self.0.numer(), *self.0.denom())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Splits this amount evenly between `sharers` people.
    ///
    /// Returns zero for zero sharers; nobody receives anything.
    pub fn split(self, sharers: usize) -> Share {
        if sharers == 0 {
            return Share::zero();
        }
        Share(self.0 / Ratio::from_integer(sharers as i128))
    }

    /// Returns `self × part / whole`, or zero when `whole` is zero.
    ///
    /// ```rust
    /// use splitbill_core::share::Share;
    ///
    /// let tax_tip = Share::from_cents(500);
    /// let mine = tax_tip.proportion(Share::from_cents(1200), Share::from_cents(2000));
    /// assert_eq!(mine, Share::from_cents(300));
    /// ```
    pub fn proportion(self, part: Share, whole: Share) -> Share {
        if whole.is_zero() {
            return Share::zero();
        }
        Share(self.0 * part.0 / whole.0)
    }

    /// Rounds to the nearest cent, ties to even.
    ///
    /// ```rust
    /// use splitbill_core::share::Share;
    ///
    /// assert_eq!(Share::from_cents(1000).split(3).round_to_money().cents(), 333);
    /// assert_eq!(Share::from_cents(5).split(2).round_to_money().cents(), 2);  // 2.5 → 2
    /// assert_eq!(Share::from_cents(7).split(2).round_to_money().cents(), 4);  // 3.5 → 4
    /// ```
    pub fn round_to_money(&self) -> Money {
        let floor = self.0.floor();
        let frac = self.0 - floor;
        let half = Ratio::new(1, 2);
        let floor_int = floor.to_integer();

        let rounded = if frac > half {
            floor_int + 1
        } else if frac < half {
            floor_int
        } else if floor_int % 2 == 0 {
            floor_int
        } else {
            floor_int + 1
        };

        Money::from_cents(rounded as i64)
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }
}

impl From<Money> for Share {
    fn from(money: Money) -> Self {
        Share::from_cents(money.cents())
    }
}

impl Add for Share {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Share(self.0 + other.0)
    }
}

impl AddAssign for Share {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Share {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Share(self.0 - other.0)
    }
}

impl Sum for Share {
    fn sum<I: Iterator<Item = Share>>(iter: I) -> Self {
        iter.fold(Share::zero(), Add::add)
    }
}

impl fmt::Display for Share {
    /// Displays the exact fraction of cents, e.g. `1000/3¢`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}¢", self.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
