use serde::{Deserialize, Serialize};

use crate::cbc::{Code, Key};
use crate::currency::ExchangeRate;
use crate::error::GoblError;
use crate::l10n::CountryCode;
use crate::num::{Amount, Percentage};

use super::{Combo, Extensions, RoundingRule, Set};
use super::rounding::EXTRA_PRECISION;

/// Tax totals broken down by category and rate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Total {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<CategoryTotal>,
    /// Taxes added minus taxes retained.
    pub sum: Amount,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryTotal {
    pub code: Code,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub retained: bool,
    pub rates: Vec<RateTotal>,
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surcharge: Option<Amount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateTotal {
    #[serde(default, skip_serializing_if = "Key::is_empty")]
    pub key: Key,
    #[serde(default, skip_serializing_if = "CountryCode::is_empty")]
    pub country: CountryCode,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub ext: Extensions,
    pub base: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<Percentage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surcharge: Option<RateTotalSurcharge>,
    pub amount: Amount,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateTotalSurcharge {
    pub percent: Percentage,
    pub amount: Amount,
}

impl Total {
    pub fn category(&self, code: &Code) -> Option<&CategoryTotal> {
        self.categories.iter().find(|c| &c.code == code)
    }

    /// Sum of non-retained category amounts and surcharges.
    pub fn pre_sum(&self) -> Option<Amount> {
        self.sum_where(false)
    }

    /// Sum of retained category amounts, if any category is retained.
    pub fn retained_sum(&self) -> Option<Amount> {
        self.sum_where(true)
    }

    /// Convert every amount with the exchange rate, rounding to the
    /// precision of the target currency.
    pub fn exchange(&mut self, rate: &ExchangeRate) {
        self.map_amounts(|a| rate.exchange(a));
    }

    /// Multiply every amount by `factor`, rounding to `exp` places. Used to
    /// take the share of a document's taxes covered by a partial payment.
    pub fn scale(&mut self, factor: Amount, exp: u32) {
        self.map_amounts(|a| a.multiply(factor).rescale(exp));
    }

    fn map_amounts(&mut self, f: impl Fn(Amount) -> Amount) {
        for ct in &mut self.categories {
            for rt in &mut ct.rates {
                rt.base = f(rt.base);
                rt.amount = f(rt.amount);
                if let Some(sc) = &mut rt.surcharge {
                    sc.amount = f(sc.amount);
                }
            }
            ct.amount = f(ct.amount);
            ct.surcharge = ct.surcharge.map(&f);
        }
        self.sum = f(self.sum);
    }

    /// Combined totals of both, adding up rates with the same key, country,
    /// extensions and percentages.
    pub fn merge(&self, other: &Total) -> Total {
        let mut out = self.clone();
        for oc in &other.categories {
            let Some(ct) = out.categories.iter_mut().find(|c| c.code == oc.code) else {
                out.categories.push(oc.clone());
                continue;
            };
            for or in &oc.rates {
                match ct.rates.iter_mut().find(|r| r.same_rate(or)) {
                    Some(rt) => {
                        rt.base = rt.base + or.base;
                        rt.amount = rt.amount + or.amount;
                        if let (Some(a), Some(b)) = (&mut rt.surcharge, &or.surcharge) {
                            a.amount = a.amount + b.amount;
                        }
                    }
                    None => ct.rates.push(or.clone()),
                }
            }
            ct.amount = ct.amount + oc.amount;
            ct.surcharge = match (ct.surcharge, oc.surcharge) {
                (Some(a), Some(b)) => Some(a + b),
                (a, b) => a.or(b),
            };
        }
        out.sum = out.sum + other.sum;
        out
    }

    fn sum_where(&self, retained: bool) -> Option<Amount> {
        self.categories
            .iter()
            .filter(|c| c.retained == retained)
            .map(|c| c.amount + c.surcharge.unwrap_or_default())
            .reduce(|a, b| a + b)
    }

    fn rate_total_for(&mut self, combo: &Combo, zero: Amount) -> &mut RateTotal {
        let ci = match self.categories.iter().position(|c| c.code == combo.category) {
            Some(i) => i,
            None => {
                self.categories.push(CategoryTotal {
                    code: combo.category.clone(),
                    retained: combo.is_retained(),
                    amount: zero,
                    ..Default::default()
                });
                self.categories.len() - 1
            }
        };
        let cat = &mut self.categories[ci];
        let ri = match cat.rates.iter().position(|r| r.matches(combo)) {
            Some(i) => i,
            None => {
                cat.rates.push(RateTotal {
                    key: combo.rate.clone(),
                    country: combo.country.clone(),
                    ext: combo.ext.clone(),
                    base: zero,
                    percent: combo.percent,
                    surcharge: combo.surcharge.map(|percent| RateTotalSurcharge { percent, amount: zero }),
                    amount: zero,
                });
                cat.rates.len() - 1
            }
        };
        &mut cat.rates[ri]
    }
}

impl RateTotal {
    fn same_rate(&self, other: &RateTotal) -> bool {
        self.key == other.key
            && self.country == other.country
            && self.ext == other.ext
            && self.percent == other.percent
            && self.surcharge.as_ref().map(|s| s.percent) == other.surcharge.as_ref().map(|s| s.percent)
    }

    fn matches(&self, combo: &Combo) -> bool {
        self.key == combo.rate
            && self.country == combo.country
            && self.ext == combo.ext
            && self.percent == combo.percent
            && self.surcharge.as_ref().map(|s| s.percent) == combo.surcharge
    }
}

/// A line that contributes to tax totals.
pub trait TaxableLine {
    fn taxes(&self) -> &Set;
    /// Net amount at the precision chosen for calculation.
    fn total(&self) -> Amount;
}

/// Accumulates the tax bases of a set of lines and works out the amount
/// due per rate and category.
pub struct TotalCalculator<'a> {
    /// Zero in the document currency; fixes the final precision.
    pub zero: Amount,
    pub rounding: RoundingRule,
    /// Category already included in line prices.
    pub includes: Option<&'a Code>,
    pub lines: Vec<&'a dyn TaxableLine>,
}

impl TotalCalculator<'_> {
    pub fn calculate(&self) -> Result<Total, GoblError> {
        let exp = self.zero.exp();
        let mut total = Total::default();

        for line in &self.lines {
            let base = self.line_base(*line)?;
            for combo in line.taxes().iter() {
                if combo.percent.is_none() && combo.rate.is_empty() {
                    continue;
                }
                let rt = total.rate_total_for(combo, self.zero);
                rt.base = rt.base + base;
            }
        }

        let mut sum = self.zero;
        for ct in &mut total.categories {
            let mut amount = self.zero;
            let mut surcharge: Option<Amount> = None;
            for rt in &mut ct.rates {
                let base = rt.base;
                rt.amount = match rt.percent {
                    Some(p) => p.of(base),
                    None => self.zero,
                };
                amount = amount + rt.amount;
                if let Some(sc) = &mut rt.surcharge {
                    let value = sc.percent.of(base);
                    surcharge = Some(surcharge.unwrap_or(self.zero) + value);
                    sc.amount = value.rescale(exp);
                }
                rt.base = base.rescale(exp);
                rt.amount = rt.amount.rescale(exp);
            }
            let with_surcharge = amount + surcharge.unwrap_or(self.zero);
            sum = if ct.retained { sum - with_surcharge } else { sum + with_surcharge };
            ct.amount = amount.rescale(exp);
            ct.surcharge = surcharge.map(|s| s.rescale(exp));
        }
        total.sum = sum.rescale(exp);
        Ok(total)
    }

    /// Line total with any included tax removed, at the precision of the
    /// rounding rule.
    fn line_base(&self, line: &dyn TaxableLine) -> Result<Amount, GoblError> {
        let exp = self.zero.exp();
        let mut base = line.total();
        if let Some(inc) = self.includes {
            if let Some(combo) = line.taxes().get(inc) {
                if combo.is_retained() {
                    return Err(GoblError::Tax(format!("cannot include retained category '{inc}'")));
                }
                if let Some(p) = combo.percent {
                    base = base.rescale_up(exp + EXTRA_PRECISION).remove(p);
                }
            }
        }
        Ok(self.rounding.base(base, exp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestLine {
        total: Amount,
        taxes: Set,
    }

    impl TaxableLine for TestLine {
        fn taxes(&self) -> &Set {
            &self.taxes
        }
        fn total(&self) -> Amount {
            self.total
        }
    }

    fn amt(s: &str) -> Amount {
        s.parse().unwrap()
    }

    fn vat(p: &str) -> Set {
        let mut c = Combo::new("VAT", "standard");
        c.percent = Some(p.parse().unwrap());
        Set::from(vec![c])
    }

    fn line(total: &str, taxes: Set) -> TestLine {
        TestLine { total: amt(total), taxes }
    }

    fn calc(lines: &[TestLine], includes: Option<&Code>, rounding: RoundingRule) -> Total {
        TotalCalculator {
            zero: Amount::zero(2),
            rounding,
            includes,
            lines: lines.iter().map(|l| l as &dyn TaxableLine).collect(),
        }
        .calculate()
        .unwrap()
    }

    #[test]
    fn single_rate() {
        let t = calc(&[line("1000.0000", vat("21%"))], None, RoundingRule::Precise);
        let ct = &t.categories[0];
        assert_eq!(ct.code, "VAT");
        assert_eq!(ct.rates[0].base.to_string(), "1000.00");
        assert_eq!(ct.amount.to_string(), "210.00");
        assert_eq!(t.sum.to_string(), "210.00");
    }

    #[test]
    fn rates_grouped_by_percent() {
        let lines = [
            line("100.0000", vat("21%")),
            line("50.0000", vat("21%")),
            line("10.0000", vat("10%")),
        ];
        let t = calc(&lines, None, RoundingRule::Precise);
        let ct = &t.categories[0];
        assert_eq!(ct.rates.len(), 2);
        assert_eq!(ct.rates[0].base.to_string(), "150.00");
        assert_eq!(ct.amount.to_string(), "32.50");
    }

    #[test]
    fn included_tax_is_removed_from_base() {
        let vat_code = Code::from("VAT");
        let t = calc(&[line("900.0000", vat("21%"))], Some(&vat_code), RoundingRule::Precise);
        let rt = &t.categories[0].rates[0];
        assert_eq!(rt.base.to_string(), "743.80");
        assert_eq!(rt.amount.to_string(), "156.20");
    }

    #[test]
    fn currency_rounding_rounds_each_base() {
        let lines = [line("0.3333", vat("21%")), line("0.3333", vat("21%"))];
        let precise = calc(&lines, None, RoundingRule::Precise);
        let currency = calc(&lines, None, RoundingRule::Currency);
        assert_eq!(precise.categories[0].rates[0].base.to_string(), "0.67");
        assert_eq!(currency.categories[0].rates[0].base.to_string(), "0.66");
    }

    #[test]
    fn exempt_rate_has_zero_amount() {
        let exempt = Set::from(vec![Combo::new("VAT", "exempt")]);
        let t = calc(&[line("100.00", exempt)], None, RoundingRule::Precise);
        let ct = &t.categories[0];
        assert!(ct.rates[0].percent.is_none());
        assert!(ct.amount.is_zero());
        assert_eq!(t.pre_sum().unwrap().to_string(), "0.00");
        assert!(t.retained_sum().is_none());
    }

    #[test]
    fn surcharge_is_added_to_sum() {
        let mut c = Combo::new("VAT", "standard+eqs");
        c.percent = Some("21%".parse().unwrap());
        c.surcharge = Some("5.2%".parse().unwrap());
        let t = calc(&[line("100.00", Set::from(vec![c]))], None, RoundingRule::Precise);
        let ct = &t.categories[0];
        assert_eq!(ct.surcharge.unwrap().to_string(), "5.20");
        assert_eq!(ct.rates[0].surcharge.as_ref().unwrap().amount.to_string(), "5.20");
        assert_eq!(t.sum.to_string(), "26.20");
    }

    #[test]
    fn merge_adds_matching_rates() {
        let a = calc(&[line("100.00", vat("21%"))], None, RoundingRule::Precise);
        let b = calc(&[line("50.00", vat("21%")), line("10.00", vat("10%"))], None, RoundingRule::Precise);
        let m = a.merge(&b);
        let ct = &m.categories[0];
        assert_eq!(ct.rates.len(), 2);
        assert_eq!(ct.rates[0].base.to_string(), "150.00");
        assert_eq!(ct.amount.to_string(), "32.50");
        assert_eq!(m.sum.to_string(), "32.50");
    }

    #[test]
    fn scale_takes_a_share() {
        let mut t = calc(&[line("100.00", vat("21%"))], None, RoundingRule::Precise);
        t.scale(amt("0.5000"), 2);
        assert_eq!(t.categories[0].rates[0].base.to_string(), "50.00");
        assert_eq!(t.categories[0].amount.to_string(), "10.50");
        assert_eq!(t.sum.to_string(), "10.50");
    }

    #[test]
    fn exchange_converts_amounts() {
        let mut t = calc(&[line("100.00", vat("21%"))], None, RoundingRule::Precise);
        t.exchange(&ExchangeRate::new("USD", "EUR", amt("0.5")));
        assert_eq!(t.categories[0].rates[0].base.to_string(), "50.00");
        assert_eq!(t.sum.to_string(), "10.50");
    }

    #[test]
    fn json_shape() {
        let t = calc(&[line("10.00", vat("21%"))], None, RoundingRule::Precise);
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["categories"][0]["code"], "VAT");
        assert_eq!(json["categories"][0]["rates"][0]["percent"], "21%");
        assert_eq!(json["sum"], "2.10");
    }
}
