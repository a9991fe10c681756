//! # Money Module
//!
//! Provides the `Money` type used for fine amounts.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  A fine of 0.50 per day stored as f64, multiplied by overdue days:      │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ drift                            │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    50 cents/day × 3 days = 150 cents, exactly, forever                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use libris_core::money::Money;
//!
//! let daily = Money::from_cents(50); // $0.50
//! let fine = daily.times(3);         // $1.50
//! assert_eq!(fine.to_string(), "$1.50");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Where Money is Used
/// ```text
/// LendingPolicy.daily_fine ──► × overdue days ──► Fine.amount_cents
///                                                      │
///                                                      ▼
///                                     FinePayment.amount ("$1.50")
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use libris_core::money::Money;
    ///
    /// let fine = Money::from_cents(150); // Represents $1.50
    /// assert_eq!(fine.cents(), 150);
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

    /// Multiplies a per-unit amount by a count (e.g., a daily rate by days).
    ///
    /// ## Example
    /// ```rust
    /// use libris_core::money::Money;
    ///
    /// let daily = Money::from_cents(50);
    /// assert_eq!(daily.times(10).cents(), 500);
    /// ```
    #[inline]
    pub const fn times(&self, count: i64) -> Self {
        Money(self.0 * count)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money as `$D.CC`.
///
/// ## Note
/// This is for logs and confirmations. Localized formatting belongs to
/// whatever renders the API response.
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
