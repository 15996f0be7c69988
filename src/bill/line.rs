use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cbc::{Code, Note};
use crate::currency::{self, CurrencyCode, ExchangeRate};
use crate::error::GoblError;
use crate::num::{Amount, Percentage};
use crate::org::{self, AltPrice, Item};
use crate::tax::{self, Context, EXTRA_PRECISION, Extensions, Normalizers, Object, ObjectMut, RoundingRule, TaxableLine};
use crate::validation::{Errors, Validate, by, nested, required, validate_struct, when};

use super::{LineCharge, LineDiscount};

/// A quantity of an item with its discounts, charges and taxes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Line {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    /// Position in the document, starting at 1.
    #[serde(default, rename = "i")]
    pub index: usize,
    pub quantity: Amount,
    /// Identity for this specific line, like a meter or serial number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<org::Identity>,
    /// Customer's order reference for the line.
    #[serde(default, skip_serializing_if = "Code::is_empty")]
    pub order: Code,
    /// Accounting cost code.
    #[serde(default, skip_serializing_if = "Code::is_empty")]
    pub cost: Code,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<Item>,
    /// Parts making up the item; their totals set the item price.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub breakdown: Vec<SubLine>,
    /// Items replaced by this one, kept for reference only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub substituted: Vec<SubLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sum: Option<Amount>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discounts: Vec<LineDiscount>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub charges: Vec<LineCharge>,
    #[serde(default, skip_serializing_if = "tax::Set::is_empty")]
    pub taxes: tax::Set,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Amount>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub ext: Extensions,
    #[serde(skip)]
    precise_total: Amount,
}

/// Part of a line's breakdown or a substituted item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    #[serde(default, rename = "i")]
    pub index: usize,
    pub quantity: Amount,
    pub item: Item,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sum: Option<Amount>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discounts: Vec<LineDiscount>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub charges: Vec<LineCharge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Amount>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
}

/// Document settings every line is calculated with.
pub(crate) struct LineScope<'a> {
    pub currency: &'a CurrencyCode,
    /// Zero in the document currency.
    pub zero: Amount,
    pub rates: &'a [ExchangeRate],
    pub rounding: RoundingRule,
}

impl Line {
    pub fn new(quantity: Amount, item: Item) -> Self {
        Self {
            quantity,
            item: Some(item),
            ..Default::default()
        }
    }

    pub fn with_tax(mut self, combo: tax::Combo) -> Self {
        self.taxes.push(combo);
        self
    }

    pub fn with_discount(mut self, discount: LineDiscount) -> Self {
        self.discounts.push(discount);
        self
    }

    pub fn with_charge(mut self, charge: LineCharge) -> Self {
        self.charges.push(charge);
        self
    }

    pub fn normalize(&mut self, n: &Normalizers<'_>) {
        self.order = self.order.normalize();
        self.cost = self.cost.normalize();
        self.ext.clean();
        if let Some(id) = &mut self.identifier {
            id.normalize(n);
        }
        if let Some(item) = &mut self.item {
            item.normalize(n);
        }
        for sub in self.breakdown.iter_mut().chain(self.substituted.iter_mut()) {
            sub.normalize(n);
        }
        for d in &mut self.discounts {
            d.normalize(n);
        }
        for c in &mut self.charges {
            c.normalize(n);
        }
        self.taxes.normalize(n);
        for note in &mut self.notes {
            note.normalize(n);
        }
        n.each(ObjectMut::Line(self));
    }

    pub(crate) fn calculate(&mut self, index: usize, scope: &LineScope<'_>) -> Result<(), GoblError> {
        self.index = index;
        for (i, sub) in self.substituted.iter_mut().enumerate() {
            sub.calculate(i + 1, scope)?;
        }
        if !self.breakdown.is_empty() {
            self.calculate_breakdown(scope)?;
        }

        self.precise_total = scope.zero;
        let Some(item) = self.item.as_mut() else {
            self.sum = None;
            self.total = None;
            return Ok(());
        };
        let Some(price) = item_price(item, scope)? else {
            self.sum = None;
            self.total = None;
            return Ok(());
        };
        let (sum, total) = line_amounts(self.quantity, price, &mut self.discounts, &mut self.charges, scope);
        self.sum = Some(sum.rescale(price.exp()));
        self.total = Some(total.rescale(price.exp()));
        self.precise_total = total;
        Ok(())
    }

    /// Item price from the sum of the breakdown totals.
    fn calculate_breakdown(&mut self, scope: &LineScope<'_>) -> Result<(), GoblError> {
        let mut sum: Option<Amount> = None;
        let mut exp = scope.zero.exp();
        for (i, sub) in self.breakdown.iter_mut().enumerate() {
            sub.calculate(i + 1, scope)?;
            if let Some(total) = sub.total {
                sum = Some(sum.unwrap_or(scope.zero) + total);
            }
            if let Some(p) = sub.item.price {
                exp = exp.max(p.exp());
            }
        }
        if let Some(sum) = sum {
            let item = self.item.get_or_insert_with(Item::default);
            item.price = Some(sum.rescale(exp));
            item.currency = scope.currency.clone();
            item.alt_prices.clear();
        }
        Ok(())
    }

    /// Take the included tax of `category` out of the item price and fixed
    /// amounts.
    pub(crate) fn remove_included_taxes(&mut self, category: &Code) {
        let Some(percent) = self.taxes.get(category).and_then(|c| c.percent) else {
            return;
        };
        if let Some(item) = &mut self.item {
            remove_from_price(item, percent);
        }
        for sub in &mut self.breakdown {
            remove_from_price(&mut sub.item, percent);
            remove_from_allowances(&mut sub.discounts, &mut sub.charges, percent);
        }
        remove_from_allowances(&mut self.discounts, &mut self.charges, percent);
    }

    /// Express prices and fixed amounts in the rate's target currency.
    pub(crate) fn convert_into(&mut self, rate: &ExchangeRate) {
        if let Some(item) = &mut self.item {
            convert_item(item, rate);
        }
        for sub in self.breakdown.iter_mut().chain(self.substituted.iter_mut()) {
            convert_item(&mut sub.item, rate);
            convert_allowances(&mut sub.discounts, &mut sub.charges, rate);
        }
        convert_allowances(&mut self.discounts, &mut self.charges, rate);
    }

    /// Flip the sign of the quantity and of every fixed amount.
    pub(crate) fn invert(&mut self) {
        self.quantity = self.quantity.invert();
        for d in &mut self.discounts {
            d.amount = d.amount.invert();
        }
        for c in &mut self.charges {
            c.amount = c.amount.invert();
            if let Some(q) = &mut c.quantity {
                *q = q.invert();
            }
        }
    }
}

impl TaxableLine for Line {
    fn taxes(&self) -> &tax::Set {
        &self.taxes
    }

    fn total(&self) -> Amount {
        self.precise_total
    }
}

impl SubLine {
    pub fn new(quantity: Amount, item: Item) -> Self {
        Self {
            quantity,
            item,
            ..Default::default()
        }
    }

    pub fn normalize(&mut self, n: &Normalizers<'_>) {
        self.item.normalize(n);
        for d in &mut self.discounts {
            d.normalize(n);
        }
        for c in &mut self.charges {
            c.normalize(n);
        }
        for note in &mut self.notes {
            note.normalize(n);
        }
    }

    fn calculate(&mut self, index: usize, scope: &LineScope<'_>) -> Result<(), GoblError> {
        self.index = index;
        match item_price(&mut self.item, scope)? {
            Some(price) => {
                let (sum, total) = line_amounts(self.quantity, price, &mut self.discounts, &mut self.charges, scope);
                self.sum = Some(sum.rescale(price.exp()));
                self.total = Some(total.rescale(price.exp()));
            }
            None => {
                self.sum = None;
                self.total = None;
            }
        }
        Ok(())
    }
}

/// Price of the item in the document currency. Prices in another currency
/// are replaced by a matching alternative price or converted with the
/// exchange rates, keeping the original as an alternative.
fn item_price(item: &mut Item, scope: &LineScope<'_>) -> Result<Option<Amount>, GoblError> {
    let Some(price) = item.price else {
        return Ok(None);
    };
    if item.currency.is_empty() || &item.currency == scope.currency {
        let price = price.match_precision(scope.zero);
        item.price = Some(price);
        return Ok(Some(price));
    }

    let own_zero = item.currency.def().map(|d| d.zero()).unwrap_or(scope.zero);
    let original = AltPrice {
        currency: item.currency.clone(),
        value: price.match_precision(own_zero),
    };
    let converted = match item.alt_prices.iter().find(|p| &p.currency == scope.currency) {
        Some(alt) => alt.value,
        None => currency::convert(scope.rates, &item.currency, scope.currency, original.value).ok_or_else(|| {
            GoblError::Exchange(format!(
                "missing exchange rate from '{}' to '{}'",
                item.currency, scope.currency
            ))
        })?,
    };
    let converted = converted.match_precision(scope.zero);
    item.price = Some(converted);
    item.currency = scope.currency.clone();
    item.alt_prices = vec![original];
    Ok(Some(converted))
}

/// Sum and total of a line at the working precision of the rounding rule.
/// Discount and charge amounts are kept at the currency's precision.
fn line_amounts(
    quantity: Amount,
    price: Amount,
    discounts: &mut [LineDiscount],
    charges: &mut [LineCharge],
    scope: &LineScope<'_>,
) -> (Amount, Amount) {
    let cur_exp = scope.zero.exp();
    let exp = scope.rounding.line_exp(price.exp(), cur_exp);
    let sum = price.rescale_up(exp).multiply(quantity).rescale(exp);
    let mut total = sum;
    for d in discounts.iter_mut() {
        d.calculate(sum, cur_exp);
        total = total - d.amount;
    }
    for c in charges.iter_mut() {
        c.calculate(sum, quantity, cur_exp);
        total = total + c.amount;
    }
    (sum, total)
}

fn remove_from_price(item: &mut Item, percent: Percentage) {
    if let Some(p) = &mut item.price {
        *p = p.upscale(EXTRA_PRECISION).remove(percent);
    }
}

fn remove_from_allowances(discounts: &mut [LineDiscount], charges: &mut [LineCharge], percent: Percentage) {
    for d in discounts.iter_mut().filter(|d| d.percent.is_none()) {
        d.amount = d.amount.upscale(EXTRA_PRECISION).remove(percent);
    }
    for c in charges.iter_mut().filter(|c| c.percent.is_none()) {
        match &mut c.rate {
            Some(r) => *r = r.upscale(EXTRA_PRECISION).remove(percent),
            None => c.amount = c.amount.upscale(EXTRA_PRECISION).remove(percent),
        }
    }
}

fn convert_item(item: &mut Item, rate: &ExchangeRate) {
    let Some(price) = item.price else {
        return;
    };
    if !item.currency.is_empty() && item.currency != rate.from {
        return;
    }
    let converted = match item.alt_prices.iter().position(|p| p.currency == rate.to) {
        Some(i) => item.alt_prices.remove(i).value,
        None => rate.convert(price.upscale(EXTRA_PRECISION)),
    };
    item.alt_prices.push(AltPrice {
        currency: rate.from.clone(),
        value: price,
    });
    item.price = Some(converted);
    item.currency = rate.to.clone();
}

fn convert_allowances(discounts: &mut [LineDiscount], charges: &mut [LineCharge], rate: &ExchangeRate) {
    for d in discounts.iter_mut().filter(|d| d.percent.is_none()) {
        d.amount = rate.convert(d.amount.upscale(EXTRA_PRECISION));
    }
    for c in charges.iter_mut().filter(|c| c.percent.is_none()) {
        match &mut c.rate {
            Some(r) => *r = rate.convert(r.upscale(EXTRA_PRECISION)),
            None => c.amount = rate.convert(c.amount.upscale(EXTRA_PRECISION)),
        }
    }
}

fn check_index(i: &usize) -> Result<(), String> {
    if *i == 0 { Err("cannot be blank".into()) } else { Ok(()) }
}

impl Validate for Line {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        let priced = self.item.as_ref().is_some_and(|i| i.price.is_some());
        validate_struct()
            .field("i", &self.index, vec![by(check_index)])
            .field("quantity", &self.quantity, vec![required()])
            .field("identifier", &self.identifier, vec![nested(ctx)])
            .field("item", &self.item, vec![required(), nested(ctx)])
            .field("breakdown", &self.breakdown, vec![nested(ctx)])
            .field("substituted", &self.substituted, vec![nested(ctx)])
            .field("sum", &self.sum, vec![when(priced, vec![required()])])
            .field("discounts", &self.discounts, vec![nested(ctx)])
            .field("charges", &self.charges, vec![nested(ctx)])
            .field("taxes", &self.taxes, vec![nested(ctx)])
            .field("total", &self.total, vec![when(priced, vec![required()])])
            .field("notes", &self.notes, vec![nested(ctx)])
            .field("ext", &self.ext, vec![nested(ctx)])
            .with(ctx.validate(Object::Line(self)))
            .finish()
    }
}

impl Validate for SubLine {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        validate_struct()
            .field("i", &self.index, vec![by(check_index)])
            .field("quantity", &self.quantity, vec![required()])
            .field("item", &self.item, vec![nested(ctx)])
            .field("discounts", &self.discounts, vec![nested(ctx)])
            .field("charges", &self.charges, vec![nested(ctx)])
            .field("notes", &self.notes, vec![nested(ctx)])
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amt(s: &str) -> Amount {
        s.parse().unwrap()
    }

    fn scope<'a>(cur: &'a CurrencyCode, rates: &'a [ExchangeRate], rounding: RoundingRule) -> LineScope<'a> {
        LineScope {
            currency: cur,
            zero: Amount::zero(2),
            rates,
            rounding,
        }
    }

    #[test]
    fn sum_and_total() {
        let eur = CurrencyCode::new("EUR");
        let mut line = Line::new(amt("10"), Item::new("Service", amt("100.00")))
            .with_discount(LineDiscount::percent("10%".parse().unwrap()));
        line.calculate(1, &scope(&eur, &[], RoundingRule::Precise)).unwrap();
        assert_eq!(line.index, 1);
        assert_eq!(line.sum.unwrap().to_string(), "1000.00");
        assert_eq!(line.total.unwrap().to_string(), "900.00");
        assert_eq!(line.discounts[0].amount.to_string(), "100.00");
        assert_eq!(TaxableLine::total(&line).to_string(), "900.0000");
    }

    #[test]
    fn price_precision_is_kept() {
        let eur = CurrencyCode::new("EUR");
        let mut line = Line::new(amt("3"), Item::new("Screws", amt("0.125")));
        line.calculate(1, &scope(&eur, &[], RoundingRule::Precise)).unwrap();
        assert_eq!(line.sum.unwrap().to_string(), "0.375");
        assert_eq!(line.total.unwrap().to_string(), "0.375");
    }

    #[test]
    fn currency_rounding_per_line() {
        let eur = CurrencyCode::new("EUR");
        let mut line = Line::new(amt("3"), Item::new("Screws", amt("0.125")));
        line.calculate(1, &scope(&eur, &[], RoundingRule::Currency)).unwrap();
        assert_eq!(TaxableLine::total(&line).to_string(), "0.38");
    }

    #[test]
    fn foreign_price_converted() {
        let eur = CurrencyCode::new("EUR");
        let rates = vec![ExchangeRate::new("USD", "EUR", amt("0.875967"))];
        let mut item = Item::new("Widget", amt("100.00"));
        item.currency = CurrencyCode::new("USD");
        let mut line = Line::new(amt("1"), item);
        line.calculate(1, &scope(&eur, &rates, RoundingRule::Precise)).unwrap();
        let item = line.item.as_ref().unwrap();
        assert_eq!(item.price.unwrap().to_string(), "87.60");
        assert_eq!(item.currency, eur);
        assert_eq!(item.alt_prices[0].currency, CurrencyCode::new("USD"));
        assert_eq!(item.alt_prices[0].value.to_string(), "100.00");
    }

    #[test]
    fn foreign_price_without_rate() {
        let eur = CurrencyCode::new("EUR");
        let mut item = Item::new("Widget", amt("100.00"));
        item.currency = CurrencyCode::new("GBP");
        let mut line = Line::new(amt("1"), item);
        let err = line.calculate(1, &scope(&eur, &[], RoundingRule::Precise)).unwrap_err();
        assert_eq!(err.to_string(), "exchange: missing exchange rate from 'GBP' to 'EUR'");
    }

    #[test]
    fn breakdown_sets_price() {
        let eur = CurrencyCode::new("EUR");
        let mut line = Line::new(amt("2"), Item::new("Kit", amt("1.00")));
        line.breakdown = vec![
            SubLine::new(amt("2"), Item::new("Part A", amt("10.00"))),
            SubLine::new(amt("1"), Item::new("Part B", amt("5.50"))),
        ];
        line.substituted = vec![SubLine::new(amt("1"), Item::new("Old kit", amt("99.00")))];
        line.calculate(1, &scope(&eur, &[], RoundingRule::Precise)).unwrap();
        assert_eq!(line.breakdown[1].index, 2);
        assert_eq!(line.item.as_ref().unwrap().price.unwrap().to_string(), "25.50");
        assert_eq!(line.total.unwrap().to_string(), "51.00");
        assert_eq!(line.substituted[0].total.unwrap().to_string(), "99.00");
    }

    #[test]
    fn unpriced_line_has_no_totals() {
        let eur = CurrencyCode::new("EUR");
        let mut line = Line::new(amt("1"), Item::default());
        line.sum = Some(amt("1.00"));
        line.calculate(1, &scope(&eur, &[], RoundingRule::Precise)).unwrap();
        assert!(line.sum.is_none());
        assert!(line.total.is_none());
    }

    #[test]
    fn invert_signs() {
        let mut line = Line::new(amt("10"), Item::new("Service", amt("100.00")))
            .with_discount(LineDiscount::amount(amt("5.00")));
        line.invert();
        assert_eq!(line.quantity.to_string(), "-10");
        assert_eq!(line.discounts[0].amount.to_string(), "-5.00");
    }

    #[test]
    fn json_index_field() {
        let line: Line = serde_json::from_str(r#"{"i":3,"quantity":"2","item":{"name":"x","price":"1.00"}}"#).unwrap();
        assert_eq!(line.index, 3);
        assert!(serde_json::from_str::<Line>(r#"{"quantity":"1","foo":1}"#).is_err());
    }
}
