//! Totals calculation shared by invoices, orders and deliveries.

use chrono::{NaiveDate, NaiveTime};
use tracing::debug;

use crate::cbc::{Key, Note};
use crate::currency::{CurrencyCode, ExchangeRate};
use crate::engine::Engine;
use crate::error::GoblError;
use crate::l10n::CountryCode;
use crate::num::Amount;
use crate::org::{DocumentRef, Party};
use crate::schema::Document;
use crate::tax::{self, Context, Extensions, RateScope, TaxableLine, TotalCalculator};

use super::line::LineScope;
use super::{Charge, Discount, Line, PaymentDetails, Tax, Totals};

/// Mutable view of the parts of a document the calculator works on.
pub(crate) struct Billable<'a> {
    pub schema: &'static str,
    pub doc_type: Key,
    pub issue_date: &'a mut Option<NaiveDate>,
    pub issue_time: Option<&'a mut Option<NaiveTime>>,
    pub value_date: Option<NaiveDate>,
    pub currency: &'a mut CurrencyCode,
    pub exchange_rates: &'a [ExchangeRate],
    pub tax: &'a mut Option<Tax>,
    pub customer: Option<&'a Party>,
    pub preceding: &'a mut [DocumentRef],
    pub lines: &'a mut [Line],
    pub discounts: &'a mut [Discount],
    pub charges: &'a mut [Charge],
    pub payment: Option<&'a mut PaymentDetails>,
    pub totals: &'a mut Option<Totals>,
    pub notes: &'a mut Vec<Note>,
    pub complements: &'a mut [Document],
}

/// Resolve the regime and addons of a document, taking the regime from the
/// supplier's tax ID when none is set and recording any addons pulled in as
/// requirements.
pub(crate) fn resolve_context<'e>(
    engine: &'e Engine,
    regime: &mut CountryCode,
    addons: &mut Vec<Key>,
    supplier: Option<&Party>,
) -> Result<Context<'e>, GoblError> {
    if regime.is_empty() {
        if let Some(country) = supplier.and_then(|p| p.tax_id.as_ref()).map(|id| &id.country) {
            if engine.regime_for_code(country).is_some() {
                *regime = country.clone();
            }
        }
    }
    let ctx = Context::new(engine, Some(&*regime), addons.as_slice())?;
    *addons = ctx.addon_keys();
    Ok(ctx)
}

/// Fill in the issue date, and the time as well when it was given as
/// `00:00:00`.
pub(crate) fn set_issue_date(
    ctx: &Context<'_>,
    issue_date: &mut Option<NaiveDate>,
    issue_time: Option<&mut Option<NaiveTime>>,
) {
    match issue_time {
        Some(t) if *t == Some(NaiveTime::MIN) => {
            *issue_date = Some(ctx.today());
            *t = Some(ctx.now_time());
        }
        _ if issue_date.is_none() => *issue_date = Some(ctx.today()),
        _ => {}
    }
}

/// Zero in the document currency, defaulting the currency to the regime's.
pub(crate) fn document_zero(ctx: &Context<'_>, currency: &mut CurrencyCode) -> Result<Amount, GoblError> {
    if currency.is_empty() || currency.def().is_none() {
        let r = ctx.regime().ok_or_else(|| GoblError::Currency("missing".into()))?;
        *currency = r.currency.clone();
    }
    currency
        .def()
        .map(|d| d.zero())
        .ok_or_else(|| GoblError::Currency(format!("'{currency}' undefined")))
}

pub(crate) fn calculate(doc: Billable<'_>, ctx: &Context<'_>) -> Result<(), GoblError> {
    let regime = ctx.regime();
    let Billable {
        schema,
        doc_type,
        issue_date,
        issue_time,
        value_date,
        currency,
        exchange_rates,
        tax,
        customer,
        preceding,
        lines,
        discounts,
        charges,
        payment,
        totals,
        notes,
        complements,
    } = doc;

    set_issue_date(ctx, issue_date, issue_time);
    let zero = document_zero(ctx, currency)?;
    let cur_exp = zero.exp();

    let rounding = tax.as_ref().and_then(|t| t.rounding).unwrap_or_else(|| ctx.rounding());
    let includes = tax.as_ref().map(|t| t.prices_include.clone()).filter(|c| !c.is_empty());
    let tags: Vec<Key> = tax.as_ref().map(|t| t.tags.clone()).unwrap_or_default();
    tax::check_tags(ctx, &tags)?;
    debug!(
        regime = %regime.map(|r| r.country.as_str()).unwrap_or("-"),
        currency = %currency,
        rounding = %rounding,
        lines = lines.len(),
        "calculating document"
    );

    if tags.iter().any(|t| t == tax::TAG_CUSTOMER_RATES) {
        if let Some(country) = customer.and_then(|c| c.tax_id.as_ref()).map(|id| id.country.clone()) {
            let sets = lines
                .iter_mut()
                .map(|l| &mut l.taxes)
                .chain(discounts.iter_mut().map(|d| &mut d.taxes))
                .chain(charges.iter_mut().map(|c| &mut c.taxes));
            for set in sets {
                for combo in set.iter_mut() {
                    combo.country = country.clone();
                }
            }
        }
    }

    for c in complements.iter_mut() {
        c.calculate_with(ctx.engine())?;
    }

    for r in preceding.iter_mut() {
        let z = r.currency.def().map(|d| d.zero()).unwrap_or(zero);
        r.calculate(z);
    }

    let scope = LineScope {
        currency: &*currency,
        zero,
        rates: exchange_rates,
        rounding,
    };
    for (i, line) in lines.iter_mut().enumerate() {
        line.calculate(i + 1, &scope)?;
    }
    let sum = lines
        .iter()
        .filter(|l| l.total.is_some())
        .fold(zero, |acc, l| acc + TaxableLine::total(l));

    for (i, d) in discounts.iter_mut().enumerate() {
        d.calculate(i + 1, sum, cur_exp);
    }
    for (i, c) in charges.iter_mut().enumerate() {
        c.calculate(i + 1, sum, cur_exp);
    }

    let date = value_date.or(*issue_date).unwrap_or_else(|| ctx.today());
    let rate_scope = RateScope {
        engine: ctx.engine(),
        regime,
        date,
        tags: &tags,
    };
    for line in lines.iter_mut().filter(|l| l.total.is_some()) {
        line.taxes.prepare(&rate_scope)?;
    }
    for d in discounts.iter_mut() {
        d.taxes.prepare(&rate_scope)?;
    }
    for c in charges.iter_mut() {
        c.taxes.prepare(&rate_scope)?;
    }

    let taxable: Vec<&dyn TaxableLine> = lines
        .iter()
        .filter(|l| l.total.is_some())
        .map(|l| l as &dyn TaxableLine)
        .chain(discounts.iter().map(|d| d as &dyn TaxableLine))
        .chain(charges.iter().map(|c| c as &dyn TaxableLine))
        .collect();
    if taxable.is_empty() {
        *totals = None;
        apply_scenarios(schema, &doc_type, &tags, tax, None, notes, ctx);
        return Ok(());
    }
    let taxes = TotalCalculator {
        zero,
        rounding,
        includes: includes.as_ref(),
        lines: taxable,
    }
    .calculate()?;

    let previous_rounding = totals.as_ref().and_then(|t| t.rounding);
    let mut t = Totals {
        sum: sum.rescale(cur_exp),
        rounding: previous_rounding,
        ..Default::default()
    };
    t.total = t.sum;
    if !discounts.is_empty() {
        let d = discounts.iter().fold(zero, |acc, d| acc + d.amount);
        t.total = t.total - d;
        t.discount = Some(d);
    }
    if !charges.is_empty() {
        let c = charges.iter().fold(zero, |acc, c| acc + c.amount);
        t.total = t.total + c;
        t.charge = Some(c);
    }
    if let Some(ct) = includes.as_ref().and_then(|c| taxes.category(c)) {
        t.total = t.total - ct.amount;
        t.tax_included = Some(ct.amount);
    }
    t.tax = taxes.pre_sum().unwrap_or(zero);
    t.total_with_tax = t.total + t.tax;
    t.retained_tax = taxes.retained_sum();
    t.payable = t.total_with_tax - t.retained_tax.unwrap_or(zero) + t.rounding.unwrap_or(zero);
    t.taxes = if taxes.categories.is_empty() { None } else { Some(taxes) };

    if let Some(pd) = payment {
        if let Some(advances) = pd.calculate(t.payable) {
            t.due = Some(t.payable - advances);
            t.advances = Some(advances);
        }
    }
    *totals = Some(t);

    apply_scenarios(schema, &doc_type, &tags, tax, totals.as_ref(), notes, ctx);
    Ok(())
}

/// Remove the notes and extensions added by earlier runs, then add those
/// of every scenario matching the document.
fn apply_scenarios(
    schema: &str,
    doc_type: &Key,
    tags: &[Key],
    tax: &mut Option<Tax>,
    totals: Option<&Totals>,
    notes: &mut Vec<Note>,
    ctx: &Context<'_>,
) {
    let sets = ctx.scenario_sets(schema);
    if sets.is_empty() {
        return;
    }
    for set in &sets {
        if let Some(t) = tax.as_mut() {
            for key in set.all_ext_keys() {
                t.ext.delete(key.as_str());
            }
        }
        let known: Vec<Note> = set.all_notes().collect();
        notes.retain(|n| !known.iter().any(|k| k.same_as(n)));
    }

    let mut summary = tax::ScenarioSummary::default();
    {
        let exts = scenario_exts(tax.as_ref(), totals);
        for set in &sets {
            set.add_to(&mut summary, doc_type, tags, &exts);
        }
    }

    for note in summary.notes {
        if !notes.iter().any(|n| n.same_as(&note)) {
            notes.push(note);
        }
    }
    if !summary.ext.is_empty() {
        let t = tax.get_or_insert_with(Tax::default);
        t.ext = t.ext.merge(&summary.ext);
    }
    debug!(schema, doc_type = %doc_type, "applied scenarios");
}

/// Extensions scenarios are matched against: the document's tax options
/// and every rate in the tax totals.
pub(crate) fn scenario_exts<'a>(tax: Option<&'a Tax>, totals: Option<&'a Totals>) -> Vec<&'a Extensions> {
    let mut exts: Vec<&Extensions> = Vec::new();
    if let Some(t) = tax {
        exts.push(&t.ext);
    }
    if let Some(taxes) = totals.and_then(|t| t.taxes.as_ref()) {
        exts.extend(taxes.categories.iter().flat_map(|c| c.rates.iter().map(|r| &r.ext)));
    }
    exts
}
