use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{MAX_EXP, ParseError, Percentage};

/// A fixed-point decimal number with an explicit exponent (number of decimal
/// places).
///
/// Arithmetic never loses precision silently: addition and subtraction
/// rescale to the larger exponent of the two operands, multiplication keeps
/// the larger exponent and rounds the surplus with banker's rounding, and
/// [`Amount::rescale`] rounds half away from zero.
///
/// Equality and ordering compare the numeric value, so `10.0 == 10.00`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    /// Zero with no decimal places.
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Create an amount from an integer value and exponent:
    /// `Amount::new(1050, 2)` is `10.50`.
    pub fn new(value: i64, exp: u32) -> Self {
        Self(Decimal::new(value, exp.min(MAX_EXP)))
    }

    /// Zero with the given number of decimal places.
    pub fn zero(exp: u32) -> Self {
        Self::new(0, exp)
    }

    /// Wrap a decimal, keeping its scale as the exponent.
    pub fn from_decimal(value: Decimal) -> Self {
        Self(value)
    }

    /// The underlying decimal.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Integer value before applying the exponent.
    pub fn value(&self) -> i128 {
        self.0.mantissa()
    }

    /// Number of decimal places.
    pub fn exp(&self) -> u32 {
        self.0.scale()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Same value with the sign flipped.
    pub fn invert(&self) -> Self {
        Self(-self.0)
    }

    /// Multiply two amounts. The result keeps the larger of the two
    /// exponents; surplus digits are removed with banker's rounding.
    pub fn multiply(&self, other: Amount) -> Self {
        let exp = self.exp().max(other.exp());
        let product = self.0.saturating_mul(other.0);
        Self(scaled(product, exp, RoundingStrategy::MidpointNearestEven))
    }

    /// Divide by another amount keeping this amount's exponent. Division by
    /// zero yields zero.
    pub fn divide(&self, other: Amount) -> Self {
        match self.0.checked_div(other.0) {
            Some(q) => Self(scaled(q, self.exp(), RoundingStrategy::MidpointAwayFromZero)),
            None => Self::zero(self.exp()),
        }
    }

    /// Round (half away from zero) or pad to exactly `exp` decimal places.
    pub fn rescale(&self, exp: u32) -> Self {
        Self(scaled(self.0, exp, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Ensure at least `exp` decimal places. Never reduces precision.
    pub fn rescale_up(&self, exp: u32) -> Self {
        if exp > self.exp() {
            self.rescale(exp)
        } else {
            *self
        }
    }

    /// Reduce to at most `exp` decimal places. Never adds precision.
    pub fn rescale_down(&self, exp: u32) -> Self {
        if exp < self.exp() {
            self.rescale(exp)
        } else {
            *self
        }
    }

    /// Increase precision by `accuracy` places.
    pub fn upscale(&self, accuracy: u32) -> Self {
        self.rescale(self.exp() + accuracy)
    }

    /// Decrease precision by `accuracy` places, stopping at zero.
    pub fn downscale(&self, accuracy: u32) -> Self {
        self.rescale(self.exp().saturating_sub(accuracy))
    }

    /// Take whichever of the two exponents is higher.
    pub fn match_precision(&self, other: Amount) -> Self {
        self.rescale_up(other.exp())
    }

    /// Net amount after taking out a tax percentage that is already
    /// included in this (gross) amount.
    pub fn remove(&self, percent: Percentage) -> Self {
        *self - percent.from_gross(*self)
    }

    pub fn compare(&self, other: Amount) -> Ordering {
        self.cmp(&other)
    }

    /// String without trailing zeros, e.g. `"12.5"` for `12.500`.
    pub fn minimal_string(&self) -> String {
        self.0.normalize().to_string()
    }
}

/// Round or pad `value` to exactly `exp` places using `strategy`.
fn scaled(value: Decimal, exp: u32, strategy: RoundingStrategy) -> Decimal {
    let exp = exp.min(MAX_EXP);
    let mut out = if value.scale() > exp {
        value.round_dp_with_strategy(exp, strategy)
    } else {
        value
    };
    out.rescale(exp);
    out
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, other: Amount) -> Amount {
        let exp = self.exp().max(other.exp());
        Amount(scaled(self.0.saturating_add(other.0), exp, RoundingStrategy::MidpointAwayFromZero))
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, other: Amount) -> Amount {
        let exp = self.exp().max(other.exp());
        Amount(scaled(self.0.saturating_sub(other.0), exp, RoundingStrategy::MidpointAwayFromZero))
    }
}

impl Neg for Amount {
    type Output = Amount;

    fn neg(self) -> Amount {
        self.invert()
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self::new(value, 0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Decimal::from_str(s)
            .map(Amount)
            .map_err(|_| ParseError::Amount(s.to_string()))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

struct AmountVisitor;

impl Visitor<'_> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal amount as a string or number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        Amount::from_str(v).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        Ok(Amount::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(Amount(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
        Amount::from_str(&v.to_string()).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amt(s: &str) -> Amount {
        s.parse().unwrap()
    }

    #[test]
    fn parse_keeps_exponent() {
        let a = amt("12.000");
        assert_eq!(a.value(), 12000);
        assert_eq!(a.exp(), 3);
        assert_eq!(a.to_string(), "12.000");
        assert!("12,5".parse::<Amount>().is_err());
    }

    #[test]
    fn add_and_subtract_use_max_exponent() {
        let a = amt("10.5");
        let b = amt("0.25");
        assert_eq!((a + b).to_string(), "10.75");
        assert_eq!((a - b).to_string(), "10.25");
        assert_eq!((b - a).to_string(), "-10.25");
        assert_eq!((amt("1") + amt("2.000")).to_string(), "3.000");
    }

    #[test]
    fn multiply_keeps_max_exponent() {
        assert_eq!(amt("10.00").multiply(amt("3")).to_string(), "30.00");
        assert_eq!(amt("100.00").multiply(amt("0.210")).to_string(), "21.000");
        // 0.125 * 0.5 = 0.0625 -> banker's rounding to 3 places
        assert_eq!(amt("0.125").multiply(amt("0.5")).to_string(), "0.062");
        assert_eq!(amt("0.135").multiply(amt("0.5")).to_string(), "0.068");
    }

    #[test]
    fn rescale_rounds_half_away_from_zero() {
        assert_eq!(amt("1.005").rescale(2).to_string(), "1.01");
        assert_eq!(amt("-1.005").rescale(2).to_string(), "-1.01");
        assert_eq!(amt("1.004").rescale(2).to_string(), "1.00");
        assert_eq!(amt("1.5").rescale(3).to_string(), "1.500");
    }

    #[test]
    fn rescale_up_never_loses_precision() {
        assert_eq!(amt("1.2345").rescale_up(2).to_string(), "1.2345");
        assert_eq!(amt("1.2").rescale_up(4).to_string(), "1.2000");
        assert_eq!(amt("1.2").match_precision(amt("0.001")).to_string(), "1.200");
        assert_eq!(amt("1.2345").rescale_down(2).to_string(), "1.23");
    }

    #[test]
    fn divide_by_zero_is_zero() {
        assert_eq!(amt("10.00").divide(amt("0")).to_string(), "0.00");
        assert_eq!(amt("10.00").divide(amt("3")).to_string(), "3.33");
    }

    #[test]
    fn remove_included_percentage() {
        let p: Percentage = "21%".parse().unwrap();
        assert_eq!(amt("121.00").remove(p).to_string(), "100.00");
    }

    #[test]
    fn equality_ignores_exponent() {
        assert_eq!(amt("10.0"), amt("10.00"));
        assert!(amt("10.01") > amt("10.0"));
        assert_eq!(amt("12.500").minimal_string(), "12.5");
        assert_eq!(amt("12.000").minimal_string(), "12");
    }

    #[test]
    fn json_round_trip_preserves_decimals() {
        let a: Amount = serde_json::from_str("\"10.00\"").unwrap();
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"10.00\"");
        let n: Amount = serde_json::from_str("12.5").unwrap();
        assert_eq!(n.to_string(), "12.5");
        let i: Amount = serde_json::from_str("7").unwrap();
        assert_eq!(i.to_string(), "7");
    }

    #[test]
    fn sum_of_amounts() {
        let total: Amount = [amt("1.10"), amt("2.205"), amt("3")].into_iter().sum();
        assert_eq!(total.to_string(), "6.305");
    }
}
