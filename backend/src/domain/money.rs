//! Monetary amounts in minor currency units.
//!
//! Prices are stored as whole paise so totals never drift through floating
//! point. The payment gateway also expects minor units, so the
//! major-to-minor conversion (× 100) happens exactly once, in
//! [`Money::from_major`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Currency used for every gateway order.
pub const CURRENCY: &str = "INR";

const MINOR_PER_MAJOR: i64 = 100;

/// Non-negative amount in minor units (paise).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Build from minor units, rejecting negative values.
    #[must_use]
    pub const fn from_minor(minor: i64) -> Option<Self> {
        if minor < 0 { None } else { Some(Self(minor)) }
    }

    /// Build from whole rupees.
    #[must_use]
    pub fn from_major(major: u32) -> Self {
        Self(i64::from(major) * MINOR_PER_MAJOR)
    }

    /// Amount in minor units.
    #[must_use]
    pub const fn minor_units(self) -> i64 {
        self.0
    }

    /// Sum of two amounts, or `None` when it does not fit in an `i64`.
    #[must_use]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(sum) => Some(Self(sum)),
            None => None,
        }
    }

    /// Total of every amount, or `None` on overflow.
    pub fn checked_sum(amounts: impl IntoIterator<Item = Self>) -> Option<Self> {
        amounts
            .into_iter()
            .try_fold(Self::ZERO, Self::checked_add)
    }
}

impl fmt::Display for Money {
    #[expect(
        clippy::integer_division,
        clippy::integer_division_remainder_used,
        reason = "splitting paise into rupees and paise for display"
    )]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₹{}.{:02}", self.0 / MINOR_PER_MAJOR, self.0 % MINOR_PER_MAJOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_sum_minor_units() {
        let total = Money::checked_sum([Money::from_major(100), Money::from_major(250)]);
        assert_eq!(total, Some(Money::from_major(350)));
        assert_eq!(total.map(Money::minor_units), Some(35_000));
    }

    #[test]
    fn overflowing_total_is_refused() {
        let near_max = Money(i64::MAX - 10);
        assert_eq!(near_max.checked_add(Money(10)), Some(Money(i64::MAX)));
        assert_eq!(near_max.checked_add(Money(11)), None);
        assert_eq!(Money::checked_sum([near_max, Money(5), Money(6)]), None);
    }

    #[test]
    fn empty_total_is_zero() {
        assert_eq!(Money::checked_sum([]), Some(Money::ZERO));
    }

    #[test]
    fn rejects_negative_minor_units() {
        assert!(Money::from_minor(-1).is_none());
        assert_eq!(Money::from_minor(2_999), Some(Money(2_999)));
    }

    #[test]
    fn displays_rupees_and_paise() {
        assert_eq!(Money(2_999).to_string(), "₹29.99");
    }
}
