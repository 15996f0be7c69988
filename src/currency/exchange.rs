use serde::{Deserialize, Serialize};
use tracing::debug;

use super::CurrencyCode;
use crate::num::Amount;

/// Extra decimal places kept while multiplying by an exchange rate.
pub const CONVERSION_ACCURACY: u32 = 6;

/// Conversion rate from one currency to another: one unit of `from` is worth
/// `amount` units of `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub amount: Amount,
}

impl ExchangeRate {
    pub fn new(from: impl Into<CurrencyCode>, to: impl Into<CurrencyCode>, amount: Amount) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            amount,
        }
    }

    /// Convert `amount` using this rate. The result keeps the precision of
    /// the input amount.
    pub fn convert(&self, amount: Amount) -> Amount {
        let exp = amount.exp();
        amount
            .upscale(CONVERSION_ACCURACY)
            .multiply(self.amount)
            .rescale(exp)
    }

    /// Convert `amount` and round the result to the precision of the
    /// target currency. Unknown target currencies keep the input precision.
    pub fn exchange(&self, amount: Amount) -> Amount {
        let exp = self.to.def().map(|d| d.subunits).unwrap_or(amount.exp());
        amount
            .upscale(CONVERSION_ACCURACY)
            .multiply(self.amount)
            .rescale(exp)
    }
}

/// Find the rate that converts `from` into `to`.
pub fn match_exchange_rate<'a>(
    rates: &'a [ExchangeRate],
    from: &CurrencyCode,
    to: &CurrencyCode,
) -> Option<&'a ExchangeRate> {
    rates.iter().find(|r| &r.from == from && &r.to == to)
}

/// Convert `amount` from one currency to another, rounded to the target
/// currency's precision. Same-currency conversions return the amount
/// untouched; `None` when no rate is available.
pub fn convert(
    rates: &[ExchangeRate],
    from: &CurrencyCode,
    to: &CurrencyCode,
    amount: Amount,
) -> Option<Amount> {
    if from == to {
        return Some(amount);
    }
    let rate = match_exchange_rate(rates, from, to)?;
    let out = rate.exchange(amount);
    debug!(%from, %to, %amount, converted = %out, "converted amount");
    Some(out)
}

/// True when an amount in `from` can be expressed in `to` with the given rates.
pub fn can_convert_into(rates: &[ExchangeRate], from: &CurrencyCode, to: &CurrencyCode) -> bool {
    from == to || match_exchange_rate(rates, from, to).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amt(s: &str) -> Amount {
        s.parse().unwrap()
    }

    fn rates() -> Vec<ExchangeRate> {
        vec![
            ExchangeRate::new("USD", "EUR", amt("0.875967")),
            ExchangeRate::new("EUR", "USD", amt("1.141860")),
        ]
    }

    #[test]
    fn convert_rounds_to_target_currency() {
        let usd = CurrencyCode::new("USD");
        let eur = CurrencyCode::new("EUR");
        let out = convert(&rates(), &usd, &eur, amt("100.00")).unwrap();
        assert_eq!(out.to_string(), "87.60");
        let back = convert(&rates(), &eur, &usd, out).unwrap();
        assert_eq!(back.to_string(), "100.03");

        let clp = CurrencyCode::new("CLP");
        let mut rates = rates();
        rates.push(ExchangeRate::new("EUR", "CLP", amt("1006.29")));
        assert_eq!(convert(&rates, &eur, &clp, amt("100.00")).unwrap().to_string(), "100629");
    }

    #[test]
    fn rate_conversion_keeps_input_precision() {
        let rate = ExchangeRate::new("EUR", "CLP", amt("1006.29"));
        assert_eq!(rate.convert(amt("1.500000")).to_string(), "1509.435000");
        assert_eq!(rate.exchange(amt("1.50")).to_string(), "1509");
    }

    #[test]
    fn same_currency_is_identity() {
        let eur = CurrencyCode::new("EUR");
        assert_eq!(convert(&[], &eur, &eur, amt("10.123")).unwrap().to_string(), "10.123");
        assert!(can_convert_into(&[], &eur, &eur));
    }

    #[test]
    fn missing_rate() {
        let gbp = CurrencyCode::new("GBP");
        let eur = CurrencyCode::new("EUR");
        assert!(convert(&rates(), &gbp, &eur, amt("1.00")).is_none());
        assert!(!can_convert_into(&rates(), &gbp, &eur));
    }
}
