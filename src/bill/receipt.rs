use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::cbc::{Code, Key, Note};
use crate::currency::{self, CurrencyCode, ExchangeRate};
use crate::engine::{Engine, engine};
use crate::error::GoblError;
use crate::l10n::CountryCode;
use crate::num::Amount;
use crate::org::{DocumentRef, Party};
use crate::pay::Instructions;
use crate::schema::{self, BILL_RECEIPT, Document};
use crate::tax::{self, Context, Extensions, Normalizers, Object, ObjectMut};
use crate::validation::{
    Errors, Validate, by, date_not_zero, nested, required_msg, validate_struct, when,
};

use super::Ordering;
use super::calculator;
use super::invoice::{check_code, check_currency, check_exchange, named_party};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReceiptType {
    /// Acknowledges funds received.
    #[default]
    Payment,
    /// Details the documents covered by a transfer.
    Remittance,
}

impl ReceiptType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiptType::Payment => "payment",
            ReceiptType::Remittance => "remittance",
        }
    }

    pub fn key(&self) -> Key {
        Key::from(self.as_str())
    }
}

/// Confirmation of payments received or a remittance advice, balancing
/// debits against credits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Receipt {
    #[serde(rename = "$schema", default, skip_serializing_if = "String::is_empty")]
    pub schema: String,
    #[serde(rename = "$regime", default, skip_serializing_if = "CountryCode::is_empty")]
    pub regime: CountryCode,
    #[serde(rename = "$addons", default, skip_serializing_if = "Vec::is_empty")]
    pub addons: Vec<Key>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    #[serde(default, rename = "type")]
    pub kind: ReceiptType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<Instructions>,
    #[serde(default, skip_serializing_if = "Code::is_empty")]
    pub series: Code,
    #[serde(default, skip_serializing_if = "Code::is_empty")]
    pub code: Code,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "CurrencyCode::is_empty")]
    pub currency: CurrencyCode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exchange_rates: Vec<ExchangeRate>,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub ext: Extensions,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preceding: Vec<DocumentRef>,
    #[serde(default)]
    pub supplier: Party,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<Party>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payee: Option<Party>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<ReceiptLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordering: Option<Ordering>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<tax::Total>,
    #[serde(default)]
    pub total: Amount,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub complements: Vec<Document>,
}

/// One movement on a receipt, optionally in a foreign currency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReceiptLine {
    #[serde(rename = "i", default)]
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentRef>,
    /// Currency of the debit and credit, when not the receipt's.
    #[serde(default, skip_serializing_if = "CurrencyCode::is_empty")]
    pub currency: CurrencyCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debit: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<tax::Total>,
    /// Debit minus credit in the receipt's currency.
    #[serde(default)]
    pub total: Amount,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
}

impl ReceiptLine {
    pub fn debit(amount: Amount) -> Self {
        Self {
            debit: Some(amount),
            ..Default::default()
        }
    }

    pub fn credit(amount: Amount) -> Self {
        Self {
            credit: Some(amount),
            ..Default::default()
        }
    }

    fn normalize(&mut self, n: &Normalizers<'_>) {
        if let Some(d) = &mut self.document {
            d.normalize(n);
        }
        for note in &mut self.notes {
            note.normalize(n);
        }
    }

    fn calculate(
        &mut self,
        index: usize,
        currency: &CurrencyCode,
        zero: Amount,
        rates: &[ExchangeRate],
    ) -> Result<(), GoblError> {
        self.index = index;
        let from = if self.currency.is_empty() { currency } else { &self.currency };
        let rate = if from == currency {
            None
        } else {
            let rate = currency::match_exchange_rate(rates, from, currency).ok_or_else(|| {
                GoblError::Exchange(format!("missing exchange rate from '{from}' to '{currency}'"))
            })?;
            Some(rate)
        };
        let convert = |a: Amount| rate.map(|r| r.exchange(a)).unwrap_or(a);
        let mut total = zero;
        if let Some(d) = self.debit {
            total = total.match_precision(d) + convert(d);
        }
        if let Some(c) = self.credit {
            total = total.match_precision(c) - convert(c);
        }
        self.total = total;
        if let (Some(t), Some(r)) = (&mut self.tax, rate) {
            t.exchange(r);
        }
        Ok(())
    }
}

impl Validate for ReceiptLine {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        validate_struct()
            .field("document", &self.document, vec![nested(ctx)])
            .field("currency", &self.currency, vec![by(check_currency)])
            .field(
                "debit",
                &self.debit,
                vec![when(self.credit.is_none(), vec![required_msg("must have either debit or credit")])],
            )
            .field("notes", &self.notes, vec![nested(ctx)])
            .finish()
    }
}

impl Receipt {
    pub fn calculate(&mut self) -> Result<(), GoblError> {
        self.calculate_with(engine())
    }

    pub fn calculate_with(&mut self, engine: &Engine) -> Result<(), GoblError> {
        self.schema = schema::id(BILL_RECEIPT);
        let ctx = calculator::resolve_context(engine, &mut self.regime, &mut self.addons, Some(&self.supplier))?;
        self.normalize(&ctx.normalizers());

        calculator::set_issue_date(&ctx, &mut self.issue_date, None);
        let zero = calculator::document_zero(&ctx, &mut self.currency)?;
        for c in &mut self.complements {
            c.calculate_with(engine)?;
        }
        for r in &mut self.preceding {
            r.calculate(zero);
        }

        let mut total = zero;
        let mut taxes: Option<tax::Total> = None;
        for (i, line) in self.lines.iter_mut().enumerate() {
            line.calculate(i + 1, &self.currency, zero, &self.exchange_rates)?;
            total = total + line.total;
            if let Some(t) = &line.tax {
                taxes = Some(match taxes {
                    Some(acc) => acc.merge(t),
                    None => t.clone(),
                });
            }
        }
        self.total = total.rescale(zero.exp());
        self.tax = taxes;
        debug!(lines = self.lines.len(), total = %self.total, "calculated receipt");
        Ok(())
    }

    pub fn normalize(&mut self, n: &Normalizers<'_>) {
        self.series = self.series.normalize();
        self.code = self.code.normalize();
        self.ext.clean();
        if let Some(m) = &mut self.method {
            m.normalize(n);
        }
        for r in &mut self.preceding {
            r.normalize(n);
        }
        let parties = std::iter::once(&mut self.supplier)
            .chain(self.customer.as_mut())
            .chain(self.payee.as_mut());
        for p in parties {
            p.normalize(n);
        }
        for l in &mut self.lines {
            l.normalize(n);
        }
        if let Some(o) = &mut self.ordering {
            o.normalize(n);
        }
        for note in &mut self.notes {
            note.normalize(n);
        }
        n.each(ObjectMut::Receipt(self));
    }

    pub fn validate(&self) -> Result<(), GoblError> {
        self.validate_using(engine())
    }

    pub fn validate_using(&self, engine: &Engine) -> Result<(), GoblError> {
        let ctx = Context::new(engine, Some(&self.regime), &self.addons)?;
        self.validate_with(&ctx).map_err(GoblError::Validation)
    }
}

impl Validate for Receipt {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        validate_struct()
            .field("method", &self.method, vec![nested(ctx)])
            .field("series", &self.series, vec![by(check_code)])
            .field("code", &self.code, vec![by(check_code)])
            .field("issue_date", &self.issue_date, vec![date_not_zero()])
            .field("currency", &self.currency, vec![by(check_currency)])
            .field(
                "exchange_rates",
                &self.exchange_rates,
                vec![by(|rates: &Vec<ExchangeRate>| check_exchange(ctx, &self.currency, rates))],
            )
            .field("ext", &self.ext, vec![nested(ctx)])
            .field("preceding", &self.preceding, vec![nested(ctx)])
            .field("supplier", &self.supplier, vec![named_party(ctx)])
            .field("customer", &self.customer, vec![nested(ctx)])
            .field("payee", &self.payee, vec![nested(ctx)])
            .field("lines", &self.lines, vec![nested(ctx)])
            .field("ordering", &self.ordering, vec![nested(ctx)])
            .field("notes", &self.notes, vec![nested(ctx)])
            .field("complements", &self.complements, vec![nested(ctx)])
            .with(ctx.validate(Object::Receipt(self)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amt(s: &str) -> Amount {
        s.parse().unwrap()
    }

    fn receipt() -> Receipt {
        Receipt {
            code: "R-1".into(),
            currency: "EUR".into(),
            issue_date: NaiveDate::from_ymd_opt(2024, 4, 2),
            supplier: Party::new("Provide One S.L."),
            lines: vec![ReceiptLine::debit(amt("100.00")), ReceiptLine::credit(amt("25.50"))],
            ..Default::default()
        }
    }

    #[test]
    fn total_is_debit_minus_credit() {
        let e = Engine::new();
        let mut rct = receipt();
        rct.calculate_with(&e).unwrap();
        assert_eq!(rct.lines[0].total.to_string(), "100.00");
        assert_eq!(rct.lines[1].total.to_string(), "-25.50");
        assert_eq!(rct.lines[1].index, 2);
        assert_eq!(rct.total.to_string(), "74.50");
        assert!(rct.validate_using(&e).is_ok());
    }

    #[test]
    fn foreign_lines_are_converted() {
        let e = Engine::new();
        let mut rct = receipt();
        rct.exchange_rates = vec![ExchangeRate::new("USD", "EUR", amt("0.9"))];
        rct.lines.push(ReceiptLine {
            currency: "USD".into(),
            ..ReceiptLine::debit(amt("10.00"))
        });
        rct.calculate_with(&e).unwrap();
        assert_eq!(rct.lines[2].total.to_string(), "9.00");
        assert_eq!(rct.total.to_string(), "83.50");

        rct.exchange_rates.clear();
        let err = rct.calculate_with(&e).unwrap_err();
        assert!(matches!(err, GoblError::Exchange(_)));
        assert_eq!(err.to_string(), "exchange: missing exchange rate from 'USD' to 'EUR'");
    }

    #[test]
    fn line_needs_debit_or_credit() {
        let e = Engine::new();
        let mut rct = receipt();
        rct.lines.push(ReceiptLine::default());
        rct.calculate_with(&e).unwrap();
        let err = rct.validate_using(&e).unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().message("lines.2.debit"),
            Some("must have either debit or credit")
        );
    }
}
