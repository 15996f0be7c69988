use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{Amount, MAX_EXP, ParseError};

/// A percentage stored as a fraction: `"21.0%"` is held as `0.210`.
///
/// The textual form always keeps the precision of the fraction, two places
/// fewer after the percent shift, so `Percentage::new(210, 3)` prints as
/// `"21.0%"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Percentage(Amount);

impl Percentage {
    /// Build from the fraction's integer value and exponent:
    /// `Percentage::new(160, 3)` is 16.0%.
    pub fn new(value: i64, exp: u32) -> Self {
        Self(Amount::new(value, exp))
    }

    /// Wrap a fraction amount (`0.21` for 21%).
    pub fn from_fraction(fraction: Amount) -> Self {
        Self(fraction)
    }

    /// The fraction as an amount.
    pub fn amount(&self) -> Amount {
        self.0
    }

    pub fn exp(&self) -> u32 {
        self.0.exp()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn invert(&self) -> Self {
        Self(self.0.invert())
    }

    /// Apply the percentage to `base`, rounding to the base's exponent.
    pub fn of(&self, base: Amount) -> Amount {
        let product = base.as_decimal().saturating_mul(self.0.as_decimal());
        Amount::from_decimal(product).rescale(base.exp())
    }

    /// The part of `gross` that corresponds to this percentage when the
    /// percentage is already included in it: `21%` of `121.00` gross is `21.00`.
    pub fn from_gross(&self, gross: Amount) -> Amount {
        let net = gross.divide(self.factor());
        gross - net
    }

    /// `1 + percentage`, for multiplying a net value up to gross.
    pub fn factor(&self) -> Amount {
        Amount::new(1, 0) + self.0
    }

    /// Numeric value in percent units (`21.0` for 21.0%).
    fn percent_value(&self) -> Decimal {
        let fraction = self.0.as_decimal();
        let scale = fraction.scale();
        if scale >= 2 {
            Decimal::from_i128_with_scale(fraction.mantissa(), scale - 2)
        } else {
            Amount::from_decimal(fraction.saturating_mul(Decimal::ONE_HUNDRED))
                .rescale(0)
                .as_decimal()
        }
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent_value())
    }
}

impl FromStr for Percentage {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseError::Percentage(s.to_string());
        match s.strip_suffix('%') {
            Some(number) => {
                let value = Decimal::from_str(number.trim()).map_err(|_| err())?;
                let scale = value.scale() + 2;
                if scale > MAX_EXP {
                    return Err(err());
                }
                Ok(Self(Amount::from_decimal(Decimal::from_i128_with_scale(
                    value.mantissa(),
                    scale,
                ))))
            }
            None => Decimal::from_str(s)
                .map(|d| Self(Amount::from_decimal(d)))
                .map_err(|_| err()),
        }
    }
}

impl Serialize for Percentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

struct PercentageVisitor;

impl Visitor<'_> for PercentageVisitor {
    type Value = Percentage;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a percentage such as \"21%\" or a fraction")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Percentage, E> {
        Percentage::from_str(v).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Percentage, E> {
        Ok(Percentage(Amount::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Percentage, E> {
        Ok(Percentage(Amount::from_decimal(Decimal::from(v))))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Percentage, E> {
        Percentage::from_str(&v.to_string()).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Percentage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PercentageVisitor)
    }
}
