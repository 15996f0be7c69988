use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::cbc::{Code, Key, Note};
use crate::currency::{CurrencyCode, ExchangeRate, match_exchange_rate};
use crate::engine::{Engine, engine};
use crate::error::GoblError;
use crate::l10n::CountryCode;
use crate::num::Amount;
use crate::org::{DocumentRef, Party};
use crate::pay::Instructions;
use crate::schema::{self, BILL_PAYMENT, Document};
use crate::tax::{self, Context, EXTRA_PRECISION, Extensions, Normalizers, Object, ObjectMut};
use crate::validation::{
    Errors, Validate, by, date_not_zero, nested, positive, required, validate_struct,
    zero_or_positive,
};

use super::Ordering;
use super::calculator;
use super::invoice::{check_code, check_currency, check_exchange, named_party};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentType {
    /// Asks the customer to pay.
    Request,
    /// Tells the supplier a payment has been made.
    Advice,
    /// Confirms the supplier received the payment.
    #[default]
    Receipt,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Request => "request",
            PaymentType::Advice => "advice",
            PaymentType::Receipt => "receipt",
        }
    }

    pub fn key(&self) -> Key {
        Key::from(self.as_str())
    }
}

/// A payment of, or request to pay, one or more documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Payment {
    #[serde(rename = "$schema", default, skip_serializing_if = "String::is_empty")]
    pub schema: String,
    #[serde(rename = "$regime", default, skip_serializing_if = "CountryCode::is_empty")]
    pub regime: CountryCode,
    #[serde(rename = "$addons", default, skip_serializing_if = "Vec::is_empty")]
    pub addons: Vec<Key>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    #[serde(default, rename = "type")]
    pub kind: PaymentType,
    /// How the payment was or should be made.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<Instructions>,
    #[serde(default, skip_serializing_if = "Code::is_empty")]
    pub series: Code,
    #[serde(default, skip_serializing_if = "Code::is_empty")]
    pub code: Code,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_time: Option<NaiveTime>,
    /// When the funds were transferred.
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
    /// Receiver of the funds, when not the supplier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payee: Option<Party>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<PaymentLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordering: Option<Ordering>,
    /// Taxes covered by the payment, from the documents paid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<tax::Total>,
    #[serde(default)]
    pub total: Amount,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub complements: Vec<Document>,
}

/// The part of a payment that settles one document or installment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentLine {
    #[serde(rename = "i", default)]
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentRef>,
    /// Installment number when the document is paid in parts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installment: Option<u32>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Amount due on the document, in the payment's currency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payable: Option<Amount>,
    /// Amount already paid before this payment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advances: Option<Amount>,
    pub amount: Amount,
    /// Still outstanding after this payment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<tax::Total>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
}

impl PaymentLine {
    pub fn new(document: DocumentRef, amount: Amount) -> Self {
        Self {
            document: Some(document),
            amount,
            ..Default::default()
        }
    }

    fn normalize(&mut self, n: &Normalizers<'_>) {
        self.description = self.description.trim().to_string();
        if let Some(d) = &mut self.document {
            d.normalize(n);
        }
        for note in &mut self.notes {
            note.normalize(n);
        }
    }

    /// Work out the payable and due amounts, and the share of the
    /// document's taxes this payment covers.
    fn calculate(
        &mut self,
        index: usize,
        currency: &CurrencyCode,
        zero: Amount,
        rates: &[ExchangeRate],
    ) -> Result<(), GoblError> {
        self.index = index;
        self.amount = self.amount.match_precision(zero);
        let mut line_tax = None;
        if let Some(doc) = &mut self.document {
            let rate = if doc.currency.is_empty() || &doc.currency == currency {
                None
            } else {
                let rate = match_exchange_rate(rates, &doc.currency, currency).ok_or_else(|| {
                    GoblError::Exchange(format!("missing exchange rate from '{}' to '{currency}'", doc.currency))
                })?;
                Some(rate)
            };
            doc.calculate(doc.currency.def().map(|d| d.zero()).unwrap_or(zero));
            line_tax = doc.tax.clone();
            if let (Some(t), Some(r)) = (&mut line_tax, rate) {
                t.exchange(r);
            }
            if let Some(p) = doc.payable {
                self.payable = Some(rate.map(|r| r.exchange(p)).unwrap_or(p));
            }
        }
        if let Some(payable) = self.payable {
            if let Some(mut t) = line_tax {
                let factor = self.amount.upscale(EXTRA_PRECISION).divide(payable);
                t.scale(factor, zero.exp());
                self.tax = Some(t);
            }
            let due = payable - self.advances.unwrap_or(zero) - self.amount;
            self.due = Some(due);
        }
        Ok(())
    }
}

impl Validate for PaymentLine {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        let payable = self.payable.unwrap_or_default();
        let open = payable - self.advances.unwrap_or_default();
        validate_struct()
            .field("document", &self.document, vec![nested(ctx)])
            .field("payable", &self.payable, vec![positive()])
            .field(
                "advances",
                &self.advances,
                vec![zero_or_positive(), by(move |a: &Option<Amount>| {
                    match (a, self.payable) {
                        (Some(a), Some(p)) if *a > p => Err(format!("must be no greater than {p}")),
                        _ => Ok(()),
                    }
                })],
            )
            .field("amount", &self.amount, vec![required(), positive(), by(move |a: &Amount| {
                if self.payable.is_some() && *a > open {
                    Err(format!("must be no greater than {open}"))
                } else {
                    Ok(())
                }
            })])
            .field("due", &self.due, vec![zero_or_positive()])
            .field("tax", &self.tax, vec![by(|t: &Option<tax::Total>| {
                match t {
                    Some(t) if t.categories.is_empty() => Err("must have categories".into()),
                    _ => Ok(()),
                }
            })])
            .field("notes", &self.notes, vec![nested(ctx)])
            .finish()
    }
}

impl Payment {
    pub fn calculate(&mut self) -> Result<(), GoblError> {
        self.calculate_with(engine())
    }

    pub fn calculate_with(&mut self, engine: &Engine) -> Result<(), GoblError> {
        self.schema = schema::id(BILL_PAYMENT);
        let ctx = calculator::resolve_context(engine, &mut self.regime, &mut self.addons, Some(&self.supplier))?;
        self.normalize(&ctx.normalizers());

        calculator::set_issue_date(&ctx, &mut self.issue_date, Some(&mut self.issue_time));
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
            total = total + line.amount;
            if let Some(t) = &line.tax {
                taxes = Some(match taxes {
                    Some(acc) => acc.merge(t),
                    None => t.clone(),
                });
            }
        }
        self.total = total.rescale(zero.exp());
        self.tax = taxes;
        debug!(lines = self.lines.len(), total = %self.total, "calculated payment");
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
        n.each(ObjectMut::Payment(self));
    }

    pub fn validate(&self) -> Result<(), GoblError> {
        self.validate_using(engine())
    }

    pub fn validate_using(&self, engine: &Engine) -> Result<(), GoblError> {
        let ctx = Context::new(engine, Some(&self.regime), &self.addons)?;
        self.validate_with(&ctx).map_err(GoblError::Validation)
    }
}

impl Validate for Payment {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        let sum = self.lines.iter().fold(Amount::ZERO, |acc, l| acc + l.amount);
        validate_struct()
            .field("method", &self.method, vec![nested(ctx)])
            .field("series", &self.series, vec![by(check_code)])
            .field("code", &self.code, vec![by(check_code)])
            .field("issue_date", &self.issue_date, vec![date_not_zero()])
            .field("currency", &self.currency, vec![required(), by(check_currency)])
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
            .field("lines", &self.lines, vec![required(), nested(ctx)])
            .field("ordering", &self.ordering, vec![nested(ctx)])
            .field("total", &self.total, vec![by(move |t: &Amount| {
                if *t == sum { Ok(()) } else { Err(format!("must equal the sum of lines {sum}")) }
            })])
            .field("notes", &self.notes, vec![nested(ctx)])
            .field("complements", &self.complements, vec![nested(ctx)])
            .with(ctx.validate(Object::Payment(self)))
            .finish()
    }
}
