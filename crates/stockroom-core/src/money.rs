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
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  A bulk +10% on 1,000 products in floats drifts by fractions of a      │
//! │  cent per product and the drift is invisible until reports disagree.    │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Prices, line totals, sale totals, credit: all i64 cents             │
//! │    Percentages: basis points, rounded once at the boundary             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::money::Money;
//!
//! let price = Money::from_cents(1099); // $10.99
//! let doubled = price.multiply_quantity(2).unwrap(); // $21.98
//! assert_eq!(doubled.cents(), 2198);
//!
//! // Arithmetic is checked; overflow surfaces as None
//! assert!(Money::from_cents(i64::MAX).multiply_quantity(2).is_none());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::types::Percentage;

/// Basis points in 100%.
const BPS_SCALE: i128 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: margins and adjustments can be negative
/// - **Single field tuple struct**: Zero-cost abstraction over i64
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
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

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Subtracts two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_sub(&self, other: Money) -> Option<Money> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Multiplies money by a quantity, `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).map(|m| m.cents()), Some(897));
    /// assert_eq!(Money::from_cents(i64::MAX).multiply_quantity(2), None);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Sums amounts, `None` on overflow.
    pub fn checked_sum(amounts: impl IntoIterator<Item = Money>) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }

    /// Returns `percentage` of this amount, rounded half-up to the cent.
    ///
    /// `None` when the result does not fit in i64 cents.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`.
    /// The +5000 provides rounding (5000/10000 = 0.5).
    pub fn percentage_of(&self, percentage: Percentage) -> Option<Money> {
        // i128 so the intermediate product cannot overflow
        let cents = (self.0 as i128 * percentage.bps() as i128 + BPS_SCALE / 2) / BPS_SCALE;
        i64::try_from(cents).ok().map(Money::from_cents)
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::money::Money;
    /// use stockroom_core::types::Percentage;
    ///
    /// let subtotal = Money::from_cents(10000);
    /// let discounted = subtotal.apply_percentage_discount(Percentage::from_bps(1000));
    /// assert_eq!(discounted.map(|m| m.cents()), Some(9000));
    /// ```
    pub fn apply_percentage_discount(&self, discount: Percentage) -> Option<Money> {
        self.checked_sub(self.percentage_of(discount)?)
    }

    /// Raises the amount by a percentage: `amount × (1 + p/100)`.
    ///
    /// ## User Workflow
    /// ```text
    /// PUT /api/categories/{id}/prices  { "percentage": 10 }
    ///      │
    ///      ▼
    /// Product price: 100.00
    ///      │
    ///      ▼
    /// apply_percentage_increase(10%) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// New price: 110.00
    /// ```
    pub fn apply_percentage_increase(&self, increase: Percentage) -> Option<Money> {
        self.checked_add(self.percentage_of(increase)?)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation for logs and debugging.
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

// =============================================================================
// Unit Tests
// =============================================================================
