//! Lossless monetary amount backed by rust_decimal.
//!
//! Amounts are persisted as canonical strings and exchanged over JSON as
//! strings (numbers are accepted on input).

use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Monetary amount for bids, base prices and budgets.
///
/// Backed by rust_decimal so that commit followed by reversal restores
/// `amount_spent` bit-for-bit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct Amount(RustDecimal);

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_canonical_string())
    }
}

impl Amount {
    pub fn new(value: RustDecimal) -> Self {
        Amount(value)
    }

    /// Parse an amount from a string losslessly.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s).map(Amount)
    }

    /// Format without trailing zeros or exponent notation.
    pub fn to_canonical_string(&self) -> String {
        format!("{}", self.0.normalize())
    }

    pub fn inner(&self) -> RustDecimal {
        self.0
    }

    pub fn zero() -> Self {
        Amount(RustDecimal::ZERO)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    /// Subtract, returning `None` if the result would go below zero.
    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        let out = self.0 - rhs.0;
        if out.is_sign_negative() && !out.is_zero() {
            None
        } else {
            Some(Amount(out))
        }
    }

    /// Add, returning `None` on decimal overflow.
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    /// Largest amount accepted for a single bid, base price or step.
    ///
    /// Keeps every running total comfortably inside the decimal range.
    pub fn ceiling() -> Amount {
        Amount(RustDecimal::from(1_000_000_000_000_000i64))
    }

    pub fn exceeds_ceiling(&self) -> bool {
        *self > Amount::ceiling()
    }

    /// `self` as a percentage of `whole`, rounded to two places. `None` if
    /// the result does not fit.
    ///
    /// A zero `whole` is treated as one, matching how the budget bar is drawn
    /// for seasons without a budget.
    pub fn percent_of(&self, whole: Amount) -> Option<Amount> {
        let denom = if whole.is_zero() {
            RustDecimal::ONE
        } else {
            whole.0
        };
        let scaled = self.0.checked_mul(RustDecimal::ONE_HUNDRED)?;
        scaled.checked_div(denom).map(|p| Amount(p.round_dp(2)))
    }

    /// Move by `steps` increments of `step`, clamped at zero. `None` on
    /// overflow.
    pub fn stepped(&self, step: Amount, steps: i32) -> Option<Amount> {
        let delta = step.0.checked_mul(RustDecimal::from(steps))?;
        let moved = self.0.checked_add(delta)?;
        if moved.is_sign_negative() {
            Some(Amount::zero())
        } else {
            Some(Amount(moved))
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Amount {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<RustDecimal> for Amount {
    fn from(value: RustDecimal) -> Self {
        Amount(value)
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Amount(RustDecimal::from(value))
    }
}

/// Saturates at the decimal maximum; only used for display totals.
impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::zero(), |acc, a| {
            acc.checked_add(a).unwrap_or(Amount(RustDecimal::MAX))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a(s: &str) -> Amount {
        Amount::from_str_canonical(s).unwrap()
    }

    #[test]
    fn test_canonical_string_drops_trailing_zeros() {
        assert_eq!(a("12.500").to_canonical_string(), "12.5");
        assert_eq!(a("3.00").to_canonical_string(), "3");
    }

    #[test]
    fn test_add_then_checked_sub_is_exact() {
        let spent = a("10.1");
        let bid = a("0.2");
        let after = spent.checked_add(bid).unwrap();
        assert_eq!(after.checked_sub(bid), Some(spent));
    }

    #[test]
    fn test_checked_sub_refuses_negative() {
        assert_eq!(a("1").checked_sub(a("1.25")), None);
        assert_eq!(a("1").checked_sub(a("1")), Some(Amount::zero()));
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(a("25").percent_of(a("100")), Some(a("25")));
        assert_eq!(a("1").percent_of(a("3")), Some(a("33.33")));
        assert_eq!(a("5").percent_of(Amount::zero()), Some(a("500")));
    }

    #[test]
    fn test_stepped_clamps_at_zero() {
        let step = a("0.25");
        assert_eq!(a("1").stepped(step, 2), Some(a("1.5")));
        assert_eq!(a("1").stepped(step, -1), Some(a("0.75")));
        assert_eq!(a("0.25").stepped(step, -3), Some(Amount::zero()));
    }

    #[test]
    fn test_json_accepts_number_and_string() {
        let from_num: Amount = serde_json::from_str("2.75").unwrap();
        let from_str: Amount = serde_json::from_str("\"2.75\"").unwrap();
        assert_eq!(from_num, from_str);
        assert_eq!(serde_json::to_string(&from_num).unwrap(), "\"2.75\"");
    }

    #[test]
    fn test_json_output_is_canonical() {
        let stepped = a("4").stepped(a("0.25"), -2).unwrap();
        assert_eq!(serde_json::to_string(&stepped).unwrap(), "\"3.5\"");
    }

    #[test]
    fn test_arithmetic_at_decimal_max_does_not_panic() {
        let max = Amount::new(RustDecimal::MAX);
        assert_eq!(max.stepped(Amount::from(1), 1), None);
        assert_eq!(max.checked_add(Amount::from(1)), None);
        assert_eq!(max.percent_of(Amount::from(1)), None);
        assert_eq!(vec![max, max].into_iter().sum::<Amount>(), max);
    }

    #[test]
    fn test_ceiling() {
        assert!(!Amount::ceiling().exceeds_ceiling());
        assert!(a("1000000000000000.01").exceeds_ceiling());
        assert!(Amount::new(RustDecimal::MAX).exceeds_ceiling());
    }
}
