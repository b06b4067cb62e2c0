//! Rank - the comparable score of an audited result.
//!
//! Ranks order partial (failing) results so the search driver can keep the
//! closest-to-passing one. Decimal-valued because grade-point aggregates
//! contribute fractional partial credit.

use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

use rust_decimal::Decimal;
use serde::Serialize;

/// A numeric score comparing audit results.
///
/// # Examples
///
/// ```
/// use reqsolve_core::Rank;
///
/// let partial = Rank::of(1);
/// let full = Rank::of(2);
///
/// assert!(full > partial);
/// assert_eq!(partial + Rank::ONE, full);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Rank(Decimal);

impl Rank {
    /// The zero rank.
    pub const ZERO: Rank = Rank(Decimal::ZERO);

    /// A rank of 1 (one satisfied unit-weight rule).
    pub const ONE: Rank = Rank(Decimal::ONE);

    /// Creates a rank from an integer count.
    #[inline]
    pub fn of(n: i64) -> Self {
        Rank(Decimal::from(n))
    }

    /// Creates a rank from a decimal value.
    #[inline]
    pub const fn from_decimal(d: Decimal) -> Self {
        Rank(d)
    }

    /// Returns the underlying decimal value.
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Returns the smaller of two ranks.
    pub fn min(self, other: Self) -> Self {
        if self <= other {
            self
        } else {
            other
        }
    }

    /// Returns the larger of two ranks.
    pub fn max(self, other: Self) -> Self {
        if self >= other {
            self
        } else {
            other
        }
    }
}

impl Ord for Rank {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for Rank {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Rank(self.0 + other.0)
    }
}

impl AddAssign for Rank {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Rank {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Rank(self.0 - other.0)
    }
}

impl Sum for Rank {
    fn sum<I: Iterator<Item = Rank>>(iter: I) -> Self {
        iter.fold(Rank::ZERO, Add::add)
    }
}

impl From<Decimal> for Rank {
    fn from(d: Decimal) -> Self {
        Rank(d)
    }
}

impl fmt::Debug for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rank({})", self.0)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
