use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cbc::Definition;
use crate::num::Amount;

/// Where intermediate precision is dropped while calculating totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoundingRule {
    /// Keep every intermediate value at full precision and round once at
    /// the end.
    #[default]
    Precise,
    /// Round each line and each tax base to the currency's precision.
    Currency,
    /// Work with two extra decimal places per line, round when summing.
    SumThenRound,
}

/// Extra places kept beyond the currency or price precision.
pub const EXTRA_PRECISION: u32 = 2;

impl RoundingRule {
    pub fn key(&self) -> &'static str {
        match self {
            RoundingRule::Precise => "precise",
            RoundingRule::Currency => "currency",
            RoundingRule::SumThenRound => "sum-then-round",
        }
    }

    /// Exponent for per-line work given the item price and currency
    /// exponents.
    pub fn line_exp(&self, price_exp: u32, currency_exp: u32) -> u32 {
        match self {
            RoundingRule::Precise => price_exp.max(currency_exp) + EXTRA_PRECISION,
            RoundingRule::Currency => currency_exp,
            RoundingRule::SumThenRound => currency_exp + EXTRA_PRECISION,
        }
    }

    /// Prepare a line amount for accumulation into tax bases.
    pub fn base(&self, amount: Amount, currency_exp: u32) -> Amount {
        match self {
            RoundingRule::Precise => amount,
            RoundingRule::Currency => amount.rescale(currency_exp),
            RoundingRule::SumThenRound => amount.rescale(currency_exp + EXTRA_PRECISION),
        }
    }

    pub fn defs() -> Vec<Definition> {
        vec![
            Definition::key("precise", "Precise")
                .desc("Keep full precision in intermediate values and round totals once."),
            Definition::key("currency", "Currency")
                .desc("Round every line and tax base to the currency's precision."),
            Definition::key("sum-then-round", "Sum then round")
                .desc("Keep two extra decimal places per line and round the sums."),
        ]
    }
}

impl fmt::Display for RoundingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_exponents() {
        assert_eq!(RoundingRule::Precise.line_exp(3, 2), 5);
        assert_eq!(RoundingRule::Precise.line_exp(0, 2), 4);
        assert_eq!(RoundingRule::Currency.line_exp(3, 2), 2);
        assert_eq!(RoundingRule::SumThenRound.line_exp(3, 2), 4);
    }

    #[test]
    fn json_keys() {
        let r: RoundingRule = serde_json::from_str("\"sum-then-round\"").unwrap();
        assert_eq!(r, RoundingRule::SumThenRound);
        assert_eq!(serde_json::to_string(&RoundingRule::Currency).unwrap(), "\"currency\"");
        assert_eq!(RoundingRule::defs().len(), 3);
    }
}
