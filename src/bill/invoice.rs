use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::cbc::{Code, Definition, Key, Note};
use crate::currency::{self, CurrencyCode, ExchangeRate};
use crate::engine::{Engine, engine};
use crate::error::GoblError;
use crate::l10n::CountryCode;
use crate::org::{DocumentRef, Party};
use crate::schema::{self, BILL_INVOICE, Document};
use crate::tax::{Context, Normalizers, Object, ObjectMut, ScenarioSummary};
use crate::validation::{
    Errors, FieldError, Rule, Validate, by, date_not_zero, nested, required, validate_struct,
};

use super::calculator::{self, Billable};
use super::{Charge, DeliveryDetails, Discount, Line, Ordering, PaymentDetails, Tax, Totals};

/// Kind of invoice, each with its UNTDID 1001 document code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvoiceType {
    /// 380: Regular commercial invoice.
    #[default]
    Standard,
    /// 325: Pro forma, not a demand for payment.
    Proforma,
    /// 380: Simplified invoice or receipt, usually without customer.
    Simplified,
    /// 380: Commercial invoice, used in some regimes for exports.
    Commercial,
    /// 326: Partial invoice.
    Partial,
    /// 384: Corrected invoice replacing a previous one.
    Corrective,
    /// 381: Credit note.
    CreditNote,
    /// 383: Debit note.
    DebitNote,
    /// 389: Self-billed invoice.
    SelfBilled,
}

const INVOICE_TYPES: &[(InvoiceType, &str, &str, &str)] = &[
    (InvoiceType::Standard, "standard", "Standard", "380"),
    (InvoiceType::Proforma, "proforma", "Proforma", "325"),
    (InvoiceType::Simplified, "simplified", "Simplified", "380"),
    (InvoiceType::Commercial, "commercial", "Commercial", "380"),
    (InvoiceType::Partial, "partial", "Partial", "326"),
    (InvoiceType::Corrective, "corrective", "Corrective", "384"),
    (InvoiceType::CreditNote, "credit-note", "Credit Note", "381"),
    (InvoiceType::DebitNote, "debit-note", "Debit Note", "383"),
    (InvoiceType::SelfBilled, "self-billed", "Self Billed", "389"),
];

impl InvoiceType {
    fn entry(&self) -> &'static (InvoiceType, &'static str, &'static str, &'static str) {
        // every variant is listed
        INVOICE_TYPES.iter().find(|(t, ..)| t == self).unwrap_or(&INVOICE_TYPES[0])
    }

    pub fn as_str(&self) -> &'static str {
        self.entry().1
    }

    pub fn key(&self) -> Key {
        Key::from(self.as_str())
    }

    /// UNTDID 1001 document name code.
    pub fn untdid_code(&self) -> &'static str {
        self.entry().3
    }

    pub fn from_key(key: &str) -> Option<Self> {
        INVOICE_TYPES.iter().find(|(_, k, ..)| *k == key).map(|(t, ..)| *t)
    }

    /// Types produced by correcting another invoice.
    pub fn is_correction(&self) -> bool {
        matches!(self, InvoiceType::Corrective | InvoiceType::CreditNote | InvoiceType::DebitNote)
    }

    pub fn defs() -> Vec<Definition> {
        INVOICE_TYPES.iter().map(|(_, k, name, _)| Definition::key(k, name)).collect()
    }
}

impl std::fmt::Display for InvoiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A commercial document requesting payment for goods or services.
///
/// ```
/// use gobl::bill::{Invoice, Line};
/// use gobl::org::{Item, Party};
/// use gobl::tax::{self, Combo};
///
/// let mut inv = Invoice::default();
/// inv.series = "SAMPLE".into();
/// inv.code = "001".into();
/// inv.currency = "EUR".into();
/// inv.supplier = Party::new("Provide One S.L.").with_tax_id(tax::Identity::new("ES", "B98602642"));
/// inv.lines.push(
///     Line::new("10".parse().unwrap(), Item::new("Development services", "100.00".parse().unwrap()))
///         .with_tax(Combo::new("VAT", "standard")),
/// );
/// inv.calculate().unwrap();
/// assert_eq!(inv.totals.unwrap().payable.to_string(), "1210.00");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Invoice {
    #[serde(rename = "$schema", default, skip_serializing_if = "String::is_empty")]
    pub schema: String,
    /// Regime code, derived from the supplier when empty.
    #[serde(rename = "$regime", default, skip_serializing_if = "CountryCode::is_empty")]
    pub regime: CountryCode,
    #[serde(rename = "$addons", default, skip_serializing_if = "Vec::is_empty")]
    pub addons: Vec<Key>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    #[serde(default, rename = "type")]
    pub kind: InvoiceType,
    #[serde(default, skip_serializing_if = "Code::is_empty")]
    pub series: Code,
    #[serde(default, skip_serializing_if = "Code::is_empty")]
    pub code: Code,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<NaiveDate>,
    /// Set to `00:00:00` to have the current time filled in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_time: Option<NaiveTime>,
    /// When the goods or services were supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op_date: Option<NaiveDate>,
    /// Date used to resolve tax rates, when different from the issue date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "CurrencyCode::is_empty")]
    pub currency: CurrencyCode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exchange_rates: Vec<ExchangeRate>,
    /// Documents this one corrects.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preceding: Vec<DocumentRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<Tax>,
    #[serde(default)]
    pub supplier: Party,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<Party>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<Line>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discounts: Vec<Discount>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub charges: Vec<Charge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordering: Option<Ordering>,
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

impl Invoice {
    pub fn new(kind: InvoiceType) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    /// Fill in defaults, normalize and work out every total with the
    /// process-wide engine.
    pub fn calculate(&mut self) -> Result<(), GoblError> {
        self.calculate_with(engine())
    }

    pub fn calculate_with(&mut self, engine: &Engine) -> Result<(), GoblError> {
        self.schema = schema::id(BILL_INVOICE);
        let ctx = self.context(engine)?;
        self.normalize(&ctx.normalizers());
        self.compute(&ctx)
    }

    /// Resolve the regime and addons, recording the regime derived from the
    /// supplier and any addons pulled in as requirements.
    pub(crate) fn context<'e>(&mut self, engine: &'e Engine) -> Result<Context<'e>, GoblError> {
        calculator::resolve_context(engine, &mut self.regime, &mut self.addons, Some(&self.supplier))
    }

    fn compute(&mut self, ctx: &Context<'_>) -> Result<(), GoblError> {
        calculator::calculate(
            Billable {
                schema: BILL_INVOICE,
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
                payment: self.payment.as_mut(),
                totals: &mut self.totals,
                notes: &mut self.notes,
                complements: &mut self.complements,
            },
            ctx,
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
        self.supplier.normalize(n);
        if let Some(c) = &mut self.customer {
            c.normalize(n);
        }
        for r in &mut self.preceding {
            r.normalize(n);
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
        if let Some(o) = &mut self.ordering {
            o.normalize(n);
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
        n.each(ObjectMut::Invoice(self));
    }

    /// Check the invoice against its regime and addons with the
    /// process-wide engine.
    pub fn validate(&self) -> Result<(), GoblError> {
        self.validate_using(engine())
    }

    pub fn validate_using(&self, engine: &Engine) -> Result<(), GoblError> {
        let ctx = Context::new(engine, Some(&self.regime), &self.addons)?;
        self.validate_with(&ctx).map_err(GoblError::Validation)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tax.as_ref().is_some_and(|t| t.has_tag(tag))
    }

    /// Flip the sign of every quantity and fixed amount, so an invoice
    /// becomes its own cancellation. The payable amount must invert exactly.
    pub fn invert(&mut self) -> Result<(), GoblError> {
        self.invert_with(engine())
    }

    pub fn invert_with(&mut self, engine: &Engine) -> Result<(), GoblError> {
        if self.totals.is_none() {
            self.calculate_with(engine)?;
        }
        let payable = self.totals.as_ref().map(|t| t.payable).unwrap_or_default();
        for l in &mut self.lines {
            l.invert();
        }
        for d in &mut self.discounts {
            d.amount = d.amount.invert();
        }
        for c in &mut self.charges {
            c.amount = c.amount.invert();
        }
        if let Some(p) = &mut self.payment {
            p.invert();
        }
        if let Some(t) = &mut self.totals {
            t.rounding = t.rounding.map(|r| r.invert());
        }
        self.calculate_with(engine)?;
        let inverted = self.totals.as_ref().map(|t| t.payable.invert()).unwrap_or_default();
        if inverted != payable {
            return Err(GoblError::Correction(format!(
                "inverted invoice totals do not match {payable} != {inverted}"
            )));
        }
        Ok(())
    }

    /// Prepare a copy for issuing again: identifiers and dates are cleared
    /// and the totals recalculated.
    pub fn replicate(&mut self) -> Result<(), GoblError> {
        self.replicate_with(engine())
    }

    pub fn replicate_with(&mut self, engine: &Engine) -> Result<(), GoblError> {
        self.uuid = None;
        self.code = Code::EMPTY;
        self.issue_date = None;
        self.issue_time = None;
        self.op_date = None;
        self.value_date = None;
        self.calculate_with(engine)
    }

    /// Rewrite prices that include a tax category as net prices. Any
    /// difference in the total with tax is kept as rounding so the payable
    /// amount stays the same.
    pub fn remove_included_taxes(&mut self) -> Result<(), GoblError> {
        self.remove_included_taxes_with(engine())
    }

    pub fn remove_included_taxes_with(&mut self, engine: &Engine) -> Result<(), GoblError> {
        let Some(category) = self
            .tax
            .as_ref()
            .map(|t| t.prices_include.clone())
            .filter(|c| !c.is_empty())
        else {
            return Ok(());
        };
        self.calculate_with(engine)?;
        let original = self.totals.as_ref().map(|t| t.total_with_tax);

        for l in &mut self.lines {
            l.remove_included_taxes(&category);
        }
        for d in self.discounts.iter_mut().filter(|d| d.percent.is_none()) {
            if let Some(p) = d.taxes.get(&category).and_then(|c| c.percent) {
                d.amount = d.amount.upscale(crate::tax::EXTRA_PRECISION).remove(p);
            }
        }
        for c in self.charges.iter_mut().filter(|c| c.percent.is_none()) {
            if let Some(p) = c.taxes.get(&category).and_then(|c| c.percent) {
                c.amount = c.amount.upscale(crate::tax::EXTRA_PRECISION).remove(p);
            }
        }
        if let Some(t) = &mut self.tax {
            t.prices_include = Code::EMPTY;
        }
        self.totals = None;
        self.calculate_with(engine)?;

        if let (Some(before), Some(t)) = (original, self.totals.as_mut()) {
            let delta = before - t.total_with_tax;
            if !delta.is_zero() {
                debug!(%delta, "keeping included tax difference as rounding");
                t.rounding = Some(delta);
                self.calculate_with(engine)?;
            }
        }
        Ok(())
    }

    /// Notes, codes and extensions of every scenario matching the invoice.
    pub fn scenario_summary(&self) -> Result<ScenarioSummary, GoblError> {
        self.scenario_summary_with(engine())
    }

    pub fn scenario_summary_with(&self, engine: &Engine) -> Result<ScenarioSummary, GoblError> {
        let ctx = Context::new(engine, Some(&self.regime), &self.addons)?;
        let tags = self.tax.as_ref().map(|t| t.tags.clone()).unwrap_or_default();
        let exts = calculator::scenario_exts(self.tax.as_ref(), self.totals.as_ref());
        let mut summary = ScenarioSummary::default();
        for set in ctx.scenario_sets(BILL_INVOICE) {
            set.add_to(&mut summary, &self.kind.key(), &tags, &exts);
        }
        Ok(summary)
    }
}

/// Nested party checks plus a required name.
pub(crate) fn named_party<'a>(ctx: &'a Context<'a>) -> Rule<'a, Party> {
    Box::new(move |p: &Party| party_errors(p, ctx, true).into_result().map_err(FieldError::Nested))
}

/// Optional customer: the name is only required once a tax ID code is given.
fn customer_party<'a>(ctx: &'a Context<'a>) -> Rule<'a, Option<Party>> {
    Box::new(move |p: &Option<Party>| {
        let Some(p) = p else { return Ok(()) };
        let name_required = p.tax_id.as_ref().is_some_and(|id| !id.code.is_empty());
        party_errors(p, ctx, name_required).into_result().map_err(FieldError::Nested)
    })
}

fn party_errors(p: &Party, ctx: &Context<'_>, name_required: bool) -> Errors {
    let mut errs = p.validate_with(ctx).err().unwrap_or_default();
    if name_required && p.name.is_empty() {
        errs.add("name", "cannot be blank");
    }
    errs
}

pub(crate) fn check_code(code: &Code) -> Result<(), String> {
    if code.is_empty() || code.is_valid() {
        Ok(())
    } else {
        Err("must be in a valid format".into())
    }
}

pub(crate) fn check_currency(code: &CurrencyCode) -> Result<(), String> {
    if code.is_empty() || code.def().is_some() {
        Ok(())
    } else {
        Err("must be a valid value".into())
    }
}

/// Amounts in a currency other than the regime's must be convertible into it.
pub(crate) fn check_exchange(
    ctx: &Context<'_>,
    currency: &CurrencyCode,
    rates: &[ExchangeRate],
) -> Result<(), String> {
    let Some(regime) = ctx.regime() else { return Ok(()) };
    if currency.is_empty() || regime.currency.is_empty() {
        return Ok(());
    }
    if currency::can_convert_into(rates, currency, &regime.currency) {
        Ok(())
    } else {
        Err(format!("no exchange rate defined for '{currency}' to '{}'", regime.currency))
    }
}

impl Validate for Invoice {
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
            .field("preceding", &self.preceding, vec![nested(ctx)])
            .field("tax", &self.tax, vec![nested(ctx)])
            .field("supplier", &self.supplier, vec![named_party(ctx)])
            .field("customer", &self.customer, vec![customer_party(ctx)])
            .field("lines", &self.lines, vec![required(), nested(ctx)])
            .field("discounts", &self.discounts, vec![nested(ctx)])
            .field("charges", &self.charges, vec![nested(ctx)])
            .field("ordering", &self.ordering, vec![nested(ctx)])
            .field("payment", &self.payment, vec![nested(ctx)])
            .field("delivery", &self.delivery, vec![nested(ctx)])
            .field("totals", &self.totals, vec![required()])
            .field("notes", &self.notes, vec![nested(ctx)])
            .field("complements", &self.complements, vec![nested(ctx)])
            .with(ctx.validate(Object::Invoice(self)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bill::LineDiscount;
    use crate::org::Item;
    use crate::tax::{self, Combo};

    fn amt(s: &str) -> crate::num::Amount {
        s.parse().unwrap()
    }

    fn engine() -> Engine {
        Engine::new()
    }

    fn base_invoice() -> Invoice {
        let mut inv = Invoice {
            series: "SAMPLE".into(),
            code: "001".into(),
            currency: "EUR".into(),
            issue_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            supplier: Party::new("Provide One S.L.").with_tax_id(tax::Identity::new("ES", "B98602642")),
            customer: Some(Party::new("Sample Consumer").with_tax_id(tax::Identity::new("ES", "54387763P"))),
            ..Default::default()
        };
        inv.lines.push(
            Line::new(amt("10"), Item::new("Development services", amt("100.00")))
                .with_tax(Combo::new("VAT", "standard")),
        );
        inv
    }

    #[test]
    fn type_codes() {
        assert_eq!(InvoiceType::CreditNote.untdid_code(), "381");
        assert_eq!(InvoiceType::Proforma.untdid_code(), "325");
        assert_eq!(InvoiceType::from_key("self-billed"), Some(InvoiceType::SelfBilled));
        assert_eq!(InvoiceType::from_key("unknown"), None);
        assert_eq!(InvoiceType::default().key(), "standard");
        assert!(InvoiceType::DebitNote.is_correction());
    }

    #[cfg(feature = "es")]
    #[test]
    fn calculates_standard_vat() {
        let e = engine();
        let mut inv = base_invoice();
        inv.calculate_with(&e).unwrap();
        assert_eq!(inv.regime, "ES");
        assert_eq!(inv.schema, "https://gobl.org/draft-0/bill/invoice");
        let t = inv.totals.as_ref().unwrap();
        assert_eq!(t.sum.to_string(), "1000.00");
        assert_eq!(t.tax.to_string(), "210.00");
        assert_eq!(t.payable.to_string(), "1210.00");
        assert_eq!(inv.lines[0].index, 1);
    }

    #[cfg(feature = "es")]
    #[test]
    fn calculate_is_idempotent() {
        let e = engine();
        let mut inv = base_invoice();
        inv.lines[0].discounts.push(LineDiscount::percent("10%".parse().unwrap()));
        inv.calculate_with(&e).unwrap();
        let first = inv.clone();
        inv.calculate_with(&e).unwrap();
        assert_eq!(inv, first);
    }

    #[cfg(feature = "es")]
    #[test]
    fn prices_including_tax() {
        let e = engine();
        let mut inv = base_invoice();
        inv.tax = Some(Tax {
            prices_include: "VAT".into(),
            ..Default::default()
        });
        inv.lines[0].discounts.push(LineDiscount::percent("10%".parse().unwrap()));
        inv.calculate_with(&e).unwrap();
        let t = inv.totals.as_ref().unwrap();
        assert_eq!(t.sum.to_string(), "900.00");
        assert_eq!(t.tax_included.unwrap().to_string(), "156.20");
        assert_eq!(t.total.to_string(), "743.80");
        assert_eq!(t.total_with_tax.to_string(), "900.00");
        assert_eq!(t.payable.to_string(), "900.00");

        inv.remove_included_taxes_with(&e).unwrap();
        let t = inv.totals.as_ref().unwrap();
        assert!(inv.tax.as_ref().is_none_or(|t| t.prices_include.is_empty()));
        assert!(t.tax_included.is_none());
        assert_eq!(t.payable.to_string(), "900.00");
    }

    #[cfg(feature = "es")]
    #[test]
    fn invert_flips_totals() {
        let e = engine();
        let mut inv = base_invoice();
        inv.invert_with(&e).unwrap();
        assert_eq!(inv.lines[0].quantity.to_string(), "-10");
        assert_eq!(inv.totals.as_ref().unwrap().payable.to_string(), "-1210.00");
    }

    #[cfg(feature = "es")]
    #[test]
    fn replicate_clears_identifiers() {
        let e = engine();
        let mut inv = base_invoice();
        inv.uuid = Some(Uuid::new_v4());
        inv.op_date = NaiveDate::from_ymd_opt(2024, 2, 1);
        inv.replicate_with(&e).unwrap();
        assert!(inv.uuid.is_none());
        assert!(inv.code.is_empty());
        assert!(inv.op_date.is_none());
        assert!(inv.issue_date.is_some());
        assert_eq!(inv.series, "SAMPLE");
    }

    #[cfg(feature = "es")]
    #[test]
    fn zero_issue_time_is_filled() {
        let e = engine();
        let mut inv = base_invoice();
        inv.issue_time = Some(NaiveTime::MIN);
        inv.calculate_with(&e).unwrap();
        assert!(inv.issue_time.is_some());
        assert!(inv.issue_date.is_some());
    }

    #[cfg(feature = "es")]
    #[test]
    fn validation_paths() {
        let e = engine();
        let mut inv = base_invoice();
        inv.supplier.name.clear();
        inv.customer.as_mut().unwrap().name.clear();
        inv.calculate_with(&e).unwrap();
        let err = inv.validate_using(&e).unwrap_err();
        let errs = err.validation_errors().unwrap();
        assert_eq!(errs.message("supplier.name"), Some("cannot be blank"));
        assert_eq!(errs.message("customer.name"), Some("cannot be blank"));
    }

    #[cfg(feature = "es")]
    #[test]
    fn foreign_currency_needs_rate() {
        let e = engine();
        let mut inv = base_invoice();
        inv.currency = "USD".into();
        inv.calculate_with(&e).unwrap();
        let err = inv.validate_using(&e).unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().message("exchange_rates"),
            Some("no exchange rate defined for 'USD' to 'EUR'")
        );
    }

    #[test]
    fn unknown_addon() {
        let e = engine();
        let mut inv = base_invoice();
        inv.addons = vec![Key::from("xx-yy")];
        let err = inv.calculate_with(&e).unwrap_err();
        assert_eq!(err.to_string(), "registry: addon 'xx-yy' not registered");
    }

    #[test]
    fn json_fields() {
        let inv: Invoice = serde_json::from_value(serde_json::json!({
            "$schema": "https://gobl.org/draft-0/bill/invoice",
            "type": "credit-note",
            "series": "TEST",
            "code": "123",
            "supplier": {"name": "Provide One S.L."}
        }))
        .unwrap();
        assert_eq!(inv.kind, InvoiceType::CreditNote);
        let out = serde_json::to_value(&inv).unwrap();
        assert_eq!(out["type"], "credit-note");
        assert!(out.get("lines").is_none());
    }
}
