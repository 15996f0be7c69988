use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::cbc::{Code, Key, Note};
use crate::currency::{CurrencyCode, ExchangeRate, match_exchange_rate};
use crate::engine::{Engine, engine};
use crate::error::GoblError;
use crate::l10n::CountryCode;
use crate::org::{DocumentRef, Party};
use crate::schema::{self, BILL_DELIVERY, Document};
use crate::tax::{Context, EXTRA_PRECISION, Normalizers, Object, ObjectMut};
use crate::validation::{Errors, Validate, by, date_not_zero, nested, required, validate_struct};

use super::calculator::{self, Billable};
use super::invoice::{check_code, check_currency, check_exchange, named_party};
use super::{Charge, Discount, Line, Ordering, Tax, Totals};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryType {
    /// Notice of an upcoming delivery.
    #[default]
    Advice,
    /// Accompanies the goods.
    Note,
    /// Transport document issued by the carrier.
    Waybill,
    /// Confirmation the goods arrived.
    Receipt,
}

impl DeliveryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryType::Advice => "advice",
            DeliveryType::Note => "note",
            DeliveryType::Waybill => "waybill",
            DeliveryType::Receipt => "receipt",
        }
    }

    pub fn key(&self) -> Key {
        Key::from(self.as_str())
    }
}

/// Carrier tracking details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tracking {
    #[serde(default, skip_serializing_if = "Code::is_empty")]
    pub code: Code,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub website: String,
}

/// Goods sent or received. Totals are only calculated when lines carry
/// prices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Delivery {
    #[serde(rename = "$schema", default, skip_serializing_if = "String::is_empty")]
    pub schema: String,
    #[serde(rename = "$regime", default, skip_serializing_if = "CountryCode::is_empty")]
    pub regime: CountryCode,
    #[serde(rename = "$addons", default, skip_serializing_if = "Vec::is_empty")]
    pub addons: Vec<Key>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    #[serde(default, rename = "type")]
    pub kind: DeliveryType,
    #[serde(default, skip_serializing_if = "Code::is_empty")]
    pub series: Code,
    #[serde(default, skip_serializing_if = "Code::is_empty")]
    pub code: Code,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "CurrencyCode::is_empty")]
    pub currency: CurrencyCode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exchange_rates: Vec<ExchangeRate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordering: Option<Ordering>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preceding: Vec<DocumentRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking: Option<Tracking>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub despatch_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receive_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<Tax>,
    #[serde(default)]
    pub supplier: Party,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<Party>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub despatcher: Option<Party>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<Party>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courier: Option<Party>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<Line>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discounts: Vec<Discount>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub charges: Vec<Charge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totals: Option<Totals>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub complements: Vec<Document>,
}

impl Delivery {
    pub fn calculate(&mut self) -> Result<(), GoblError> {
        self.calculate_with(engine())
    }

    pub fn calculate_with(&mut self, engine: &Engine) -> Result<(), GoblError> {
        self.schema = schema::id(BILL_DELIVERY);
        let ctx = calculator::resolve_context(engine, &mut self.regime, &mut self.addons, Some(&self.supplier))?;
        self.normalize(&ctx.normalizers());
        calculator::calculate(
            Billable {
                schema: BILL_DELIVERY,
                doc_type: self.kind.key(),
                issue_date: &mut self.issue_date,
                issue_time: Some(&mut self.issue_time),
                value_date: self.value_date,
                currency: &mut self.currency,
                exchange_rates: &self.exchange_rates,
                tax: &mut self.tax,
                customer: self.customer.as_ref(),
                preceding: &mut self.preceding,
                lines: &mut self.lines,
                discounts: &mut self.discounts,
                charges: &mut self.charges,
                payment: None,
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
        if let Some(t) = &mut self.tracking {
            t.code = t.code.normalize();
            t.website = t.website.trim().to_string();
        }
        if let Some(t) = &mut self.tax {
            t.normalize(n);
        }
        if self.tax.as_ref().is_some_and(Tax::is_empty) {
            self.tax = None;
        }
        if let Some(o) = &mut self.ordering {
            o.normalize(n);
        }
        for r in &mut self.preceding {
            r.normalize(n);
        }
        let parties = std::iter::once(&mut self.supplier)
            .chain(self.customer.as_mut())
            .chain(self.despatcher.as_mut())
            .chain(self.receiver.as_mut())
            .chain(self.courier.as_mut());
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
        for note in &mut self.notes {
            note.normalize(n);
        }
        n.each(ObjectMut::Delivery(self));
    }

    pub fn validate(&self) -> Result<(), GoblError> {
        self.validate_using(engine())
    }

    pub fn validate_using(&self, engine: &Engine) -> Result<(), GoblError> {
        let ctx = Context::new(engine, Some(&self.regime), &self.addons)?;
        self.validate_with(&ctx).map_err(GoblError::Validation)
    }

    /// Copy of the delivery with prices expressed in `currency`.
    pub fn convert_into(&self, currency: &CurrencyCode) -> Result<Delivery, GoblError> {
        self.convert_into_with(engine(), currency)
    }

    pub fn convert_into_with(&self, engine: &Engine, currency: &CurrencyCode) -> Result<Delivery, GoblError> {
        let mut dlv = self.clone();
        dlv.calculate_with(engine)?;
        if &dlv.currency == currency {
            return Ok(dlv);
        }
        let rate = match_exchange_rate(&dlv.exchange_rates, &dlv.currency, currency)
            .cloned()
            .ok_or_else(|| {
                GoblError::Exchange(format!("missing exchange rate from '{}' to '{currency}'", dlv.currency))
            })?;
        debug!(from = %dlv.currency, to = %currency, "converting delivery");
        for l in &mut dlv.lines {
            l.convert_into(&rate);
        }
        for d in dlv.discounts.iter_mut().filter(|d| d.percent.is_none()) {
            d.amount = rate.convert(d.amount.upscale(EXTRA_PRECISION));
        }
        for c in dlv.charges.iter_mut().filter(|c| c.percent.is_none()) {
            c.amount = rate.convert(c.amount.upscale(EXTRA_PRECISION));
        }
        dlv.currency = currency.clone();
        dlv.totals = None;
        dlv.calculate_with(engine)?;
        Ok(dlv)
    }
}

impl Validate for Delivery {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        validate_struct()
            .field("series", &self.series, vec![by(check_code)])
            .field("code", &self.code, vec![by(check_code)])
            .field("issue_date", &self.issue_date, vec![date_not_zero()])
            .field("currency", &self.currency, vec![by(check_currency)])
            .field(
                "exchange_rates",
                &self.exchange_rates,
                vec![by(|rates: &Vec<ExchangeRate>| check_exchange(ctx, &self.currency, rates))],
            )
            .field("ordering", &self.ordering, vec![nested(ctx)])
            .field("preceding", &self.preceding, vec![nested(ctx)])
            .field("tax", &self.tax, vec![nested(ctx)])
            .field("supplier", &self.supplier, vec![named_party(ctx)])
            .field("customer", &self.customer, vec![nested(ctx)])
            .field("despatcher", &self.despatcher, vec![nested(ctx)])
            .field("receiver", &self.receiver, vec![nested(ctx)])
            .field("courier", &self.courier, vec![nested(ctx)])
            .field("lines", &self.lines, vec![required(), nested(ctx)])
            .field("discounts", &self.discounts, vec![nested(ctx)])
            .field("charges", &self.charges, vec![nested(ctx)])
            .field("notes", &self.notes, vec![nested(ctx)])
            .field("complements", &self.complements, vec![nested(ctx)])
            .with(ctx.validate(Object::Delivery(self)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::org::Item;
    use crate::tax::{self, Combo};

    fn delivery() -> Delivery {
        Delivery {
            kind: DeliveryType::Note,
            code: "DN-001".into(),
            issue_date: NaiveDate::from_ymd_opt(2024, 3, 4),
            supplier: Party::new("Provide One S.L.").with_tax_id(tax::Identity::new("ES", "B98602642")),
            tracking: Some(Tracking {
                code: " ab123 ".into(),
                website: "https://track.example.com".into(),
            }),
            lines: vec![Line::new(
                "5".parse().unwrap(),
                Item {
                    name: "Pallet".into(),
                    ..Default::default()
                },
            )],
            ..Default::default()
        }
    }

    #[cfg(feature = "es")]
    #[test]
    fn unpriced_lines_have_no_totals() {
        let e = Engine::new();
        let mut dlv = delivery();
        dlv.calculate_with(&e).unwrap();
        assert_eq!(dlv.currency, "EUR");
        assert!(dlv.totals.is_none());
        assert!(dlv.lines[0].total.is_none());
        assert_eq!(dlv.tracking.as_ref().unwrap().code, "AB123");
        assert!(dlv.validate_using(&e).is_ok());
    }

    #[cfg(feature = "es")]
    #[test]
    fn priced_lines_have_totals() {
        let e = Engine::new();
        let mut dlv = delivery();
        dlv.lines.push(
            Line::new("1".parse().unwrap(), Item::new("Transport", "50.00".parse().unwrap()))
                .with_tax(Combo::new("VAT", "standard")),
        );
        dlv.calculate_with(&e).unwrap();
        let t = dlv.totals.as_ref().unwrap();
        assert_eq!(t.sum.to_string(), "50.00");
        assert_eq!(t.payable.to_string(), "60.50");
    }

    #[test]
    fn json_type() {
        let dlv: Delivery = serde_json::from_str(r#"{"type":"waybill","code":"W1"}"#).unwrap();
        assert_eq!(dlv.kind, DeliveryType::Waybill);
        assert_eq!(serde_json::to_value(&dlv).unwrap()["type"], "waybill");
    }
}
