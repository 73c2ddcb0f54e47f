//! Fixed-point money.
//!
//! Amounts are stored in the smallest currency unit (e.g. cents); all
//! arithmetic is exact integer arithmetic. No `f64` anywhere on this type.

use serde::{Deserialize, Serialize};

/// A monetary amount in minor units (cents).
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor_units(minor_units: i64) -> Self {
        Self(minor_units)
    }

    pub const fn minor_units(self) -> i64 {
        self.0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Exact sum; `None` on i64 overflow.
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Exact `unit price × quantity`; `None` on i64 overflow.
    pub fn checked_mul(self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(quantity)).map(Money)
    }
}

impl core::fmt::Display for Money {
    /// Renders as a plain decimal with two fraction digits, e.g. `9.99`.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_two_fraction_digits() {
        assert_eq!(Money::from_minor_units(999).to_string(), "9.99");
        assert_eq!(Money::from_minor_units(500).to_string(), "5.00");
        assert_eq!(Money::from_minor_units(7).to_string(), "0.07");
        assert_eq!(Money::from_minor_units(-1250).to_string(), "-12.50");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn line_total_is_exact() {
        // 9.99 * 2 + 5.00 * 1 = 24.98, no rounding drift.
        let a = Money::from_minor_units(999).checked_mul(2).unwrap();
        let b = Money::from_minor_units(500).checked_mul(1).unwrap();
        assert_eq!(a.checked_add(b).unwrap(), Money::from_minor_units(2498));
    }

    #[test]
    fn overflow_is_reported_not_wrapped() {
        let max = Money::from_minor_units(i64::MAX);
        assert!(max.checked_mul(2).is_none());
        assert!(max.checked_add(Money::from_minor_units(1)).is_none());
    }
}
