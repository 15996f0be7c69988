use tracing::debug;

use crate::currency::{CurrencyCode, ExchangeRate, match_exchange_rate};
use crate::engine::{Engine, engine};
use crate::error::GoblError;
use crate::num::Amount;
use crate::tax::EXTRA_PRECISION;

use super::Invoice;

impl Invoice {
    /// Copy of the invoice with every price and fixed amount expressed in
    /// `currency`, using the invoice's own exchange rates.
    pub fn convert_into(&self, currency: &CurrencyCode) -> Result<Invoice, GoblError> {
        self.convert_into_with(engine(), currency)
    }

    pub fn convert_into_with(&self, engine: &Engine, currency: &CurrencyCode) -> Result<Invoice, GoblError> {
        let mut inv = self.clone();
        inv.calculate_with(engine)?;
        if &inv.currency == currency {
            return Ok(inv);
        }
        let rate = match_exchange_rate(&inv.exchange_rates, &inv.currency, currency)
            .cloned()
            .ok_or_else(|| {
                GoblError::Exchange(format!("missing exchange rate from '{}' to '{currency}'", inv.currency))
            })?;
        debug!(from = %inv.currency, to = %currency, rate = %rate.amount, "converting invoice");

        for l in &mut inv.lines {
            l.convert_into(&rate);
        }
        for d in inv.discounts.iter_mut().filter(|d| d.percent.is_none()) {
            d.amount = convert_amount(&rate, d.amount);
        }
        for c in inv.charges.iter_mut().filter(|c| c.percent.is_none()) {
            c.amount = convert_amount(&rate, c.amount);
        }
        for d in &mut inv.discounts {
            d.base = d.base.map(|b| convert_amount(&rate, b));
        }
        for c in &mut inv.charges {
            c.base = c.base.map(|b| convert_amount(&rate, b));
        }
        if let Some(p) = &mut inv.payment {
            for a in p.advances.iter_mut().filter(|a| a.percent.is_none()) {
                a.amount = convert_amount(&rate, a.amount);
                a.currency = currency.clone();
            }
        }
        inv.currency = currency.clone();
        inv.totals = None;
        inv.calculate_with(engine)?;
        Ok(inv)
    }
}

fn convert_amount(rate: &ExchangeRate, amount: Amount) -> Amount {
    rate.convert(amount.upscale(EXTRA_PRECISION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bill::{Discount, Line};
    use crate::org::{Item, Party};
    use crate::tax::{self, Combo};

    fn amt(s: &str) -> Amount {
        s.parse().unwrap()
    }

    fn invoice() -> Invoice {
        let mut inv = Invoice {
            code: "001".into(),
            currency: "EUR".into(),
            issue_date: chrono::NaiveDate::from_ymd_opt(2024, 3, 1),
            supplier: Party::new("Provide One S.L.").with_tax_id(tax::Identity::new("ES", "B98602642")),
            exchange_rates: vec![ExchangeRate::new("EUR", "USD", amt("1.12"))],
            ..Default::default()
        };
        inv.lines.push(
            Line::new(amt("1"), Item::new("Development services", amt("100.00")))
                .with_tax(Combo::new("VAT", "standard")),
        );
        inv
    }

    #[cfg(feature = "es")]
    #[test]
    fn converts_prices_and_totals() {
        let e = Engine::new();
        let inv = invoice();
        let usd = inv.convert_into_with(&e, &CurrencyCode::new("USD")).unwrap();
        assert_eq!(usd.currency, "USD");
        let item = usd.lines[0].item.as_ref().unwrap();
        assert_eq!(item.price.unwrap().to_string(), "112.0000");
        assert_eq!(usd.totals.as_ref().unwrap().total_with_tax.to_string(), "135.52");
        assert_eq!(inv.currency, "EUR");
    }

    #[cfg(feature = "es")]
    #[test]
    fn converts_fixed_discounts() {
        let e = Engine::new();
        let mut inv = invoice();
        inv.discounts.push(Discount::new("Loyalty", amt("10.00")));
        let usd = inv.convert_into_with(&e, &CurrencyCode::new("USD")).unwrap();
        assert_eq!(usd.discounts[0].amount.to_string(), "11.20");
    }

    #[cfg(feature = "es")]
    #[test]
    fn same_currency_is_a_copy() {
        let e = Engine::new();
        let inv = invoice();
        let same = inv.convert_into_with(&e, &CurrencyCode::new("EUR")).unwrap();
        assert_eq!(same.totals.as_ref().unwrap().payable.to_string(), "121.00");
    }

    #[cfg(feature = "es")]
    #[test]
    fn missing_rate() {
        let e = Engine::new();
        let inv = invoice();
        let err = inv.convert_into_with(&e, &CurrencyCode::new("GBP")).unwrap_err();
        assert_eq!(err.to_string(), "exchange: missing exchange rate from 'EUR' to 'GBP'");
    }
}
