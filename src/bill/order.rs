use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cbc::{Code, Key, Note};
use crate::currency::{CurrencyCode, ExchangeRate};
use crate::engine::{Engine, engine};
use crate::error::GoblError;
use crate::l10n::CountryCode;
use crate::org::{DocumentRef, Identity, Party};
use crate::schema::{self, BILL_ORDER, Document};
use crate::tax::{Context, Normalizers, Object, ObjectMut};
use crate::validation::{Errors, Validate, by, date_not_zero, nested, required, validate_struct};

use super::calculator::{self, Billable};
use super::invoice::{check_code, check_currency, check_exchange, named_party};
use super::{Charge, DeliveryDetails, Discount, Line, PaymentDetails, Period, Tax, Totals};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderType {
    /// Sent by the customer to request goods or services.
    #[default]
    Purchase,
    /// Sent by the supplier to confirm what will be provided.
    Sale,
    /// Offer from the supplier, not yet accepted.
    Quote,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Purchase => "purchase",
            OrderType::Sale => "sale",
            OrderType::Quote => "quote",
        }
    }

    pub fn key(&self) -> Key {
        Key::from(self.as_str())
    }
}

/// A request or offer for goods and services, priced like an invoice but
/// not a demand for payment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Order {
    #[serde(rename = "$schema", default, skip_serializing_if = "String::is_empty")]
    pub schema: String,
    #[serde(rename = "$regime", default, skip_serializing_if = "CountryCode::is_empty")]
    pub regime: CountryCode,
    #[serde(rename = "$addons", default, skip_serializing_if = "Vec::is_empty")]
    pub addons: Vec<Key>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    #[serde(default, rename = "type")]
    pub kind: OrderType,
    #[serde(default, skip_serializing_if = "Code::is_empty")]
    pub series: Code,
    #[serde(default, skip_serializing_if = "Code::is_empty")]
    pub code: Code,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "CurrencyCode::is_empty")]
    pub currency: CurrencyCode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exchange_rates: Vec<ExchangeRate>,
    /// Framework agreements the order is placed under.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contracts: Vec<DocumentRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preceding: Vec<DocumentRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identities: Vec<Identity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<Tax>,
    #[serde(default)]
    pub supplier: Party,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<Party>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer: Option<Party>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller: Option<Party>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<Line>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discounts: Vec<Discount>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub charges: Vec<Charge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totals: Option<Totals>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub complements: Vec<Document>,
}

impl Order {
    pub fn calculate(&mut self) -> Result<(), GoblError> {
        self.calculate_with(engine())
    }

    pub fn calculate_with(&mut self, engine: &Engine) -> Result<(), GoblError> {
        self.schema = schema::id(BILL_ORDER);
        let ctx = calculator::resolve_context(engine, &mut self.regime, &mut self.addons, Some(&self.supplier))?;
        self.normalize(&ctx.normalizers());
        calculator::calculate(
            Billable {
                schema: BILL_ORDER,
                doc_type: self.kind.key(),
                issue_date: &mut self.issue_date,
                issue_time: None,
                value_date: self.value_date,
                currency: &mut self.currency,
                exchange_rates: &self.exchange_rates,
                tax: &mut self.tax,
                customer: self.customer.as_ref(),
                preceding: &mut self.preceding,
                lines: &mut self.lines,
                discounts: &mut self.discounts,
                charges: &mut self.charges,
                payment: self.payment.as_mut(),
                totals: &mut self.totals,
                notes: &mut self.notes,
                complements: &mut self.complements,
            },
            &ctx,
        )
    }

    pub fn normalize(&mut self, n: &Normalizers<'_>) {
        self.series = self.series.normalize();
        self.code = self.code.normalize();
        if let Some(t) = &mut self.tax {
            t.normalize(n);
        }
        if self.tax.as_ref().is_some_and(Tax::is_empty) {
            self.tax = None;
        }
        for r in self.contracts.iter_mut().chain(self.preceding.iter_mut()) {
            r.normalize(n);
        }
        for id in &mut self.identities {
            id.normalize(n);
        }
        let parties = std::iter::once(&mut self.supplier)
            .chain(self.customer.as_mut())
            .chain(self.buyer.as_mut())
            .chain(self.seller.as_mut());
        for p in parties {
            p.normalize(n);
        }
        for l in &mut self.lines {
            l.normalize(n);
        }
        for d in &mut self.discounts {
            d.normalize(n);
        }
        for c in &mut self.charges {
            c.normalize(n);
        }
        if let Some(p) = &mut self.payment {
            p.normalize(n);
        }
        if self.payment.as_ref().is_some_and(PaymentDetails::is_empty) {
            self.payment = None;
        }
        if let Some(d) = &mut self.delivery {
            d.normalize(n);
        }
        for note in &mut self.notes {
            note.normalize(n);
        }
        n.each(ObjectMut::Order(self));
    }

    pub fn validate(&self) -> Result<(), GoblError> {
        self.validate_using(engine())
    }

    pub fn validate_using(&self, engine: &Engine) -> Result<(), GoblError> {
        let ctx = Context::new(engine, Some(&self.regime), &self.addons)?;
        self.validate_with(&ctx).map_err(GoblError::Validation)
    }
}

impl Validate for Order {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        validate_struct()
            .field("series", &self.series, vec![by(check_code)])
            .field("code", &self.code, vec![by(check_code)])
            .field("issue_date", &self.issue_date, vec![date_not_zero()])
            .field("currency", &self.currency, vec![required(), by(check_currency)])
            .field(
                "exchange_rates",
                &self.exchange_rates,
                vec![by(|rates: &Vec<ExchangeRate>| check_exchange(ctx, &self.currency, rates))],
            )
            .field("contracts", &self.contracts, vec![nested(ctx)])
            .field("preceding", &self.preceding, vec![nested(ctx)])
            .field("identities", &self.identities, vec![nested(ctx)])
            .field("period", &self.period, vec![nested(ctx)])
            .field("tax", &self.tax, vec![nested(ctx)])
            .field("supplier", &self.supplier, vec![named_party(ctx)])
            .field("customer", &self.customer, vec![nested(ctx)])
            .field("buyer", &self.buyer, vec![nested(ctx)])
            .field("seller", &self.seller, vec![nested(ctx)])
            .field("lines", &self.lines, vec![required(), nested(ctx)])
            .field("discounts", &self.discounts, vec![nested(ctx)])
            .field("charges", &self.charges, vec![nested(ctx)])
            .field("payment", &self.payment, vec![nested(ctx)])
            .field("delivery", &self.delivery, vec![nested(ctx)])
            .field("notes", &self.notes, vec![nested(ctx)])
            .field("complements", &self.complements, vec![nested(ctx)])
            .with(ctx.validate(Object::Order(self)))
            .finish()
    }
}
