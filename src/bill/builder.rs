use chrono::NaiveDate;

use crate::cbc::{Code, Key, Note};
use crate::currency::{CurrencyCode, ExchangeRate};
use crate::engine::{Engine, engine};
use crate::error::GoblError;
use crate::l10n::CountryCode;
use crate::num::{Amount, Percentage};
use crate::org::{Item, Party, Unit};
use crate::tax::Combo;

use super::{Charge, Discount, Invoice, InvoiceType, Line, LineCharge, LineDiscount, PaymentDetails, Tax};

const MAX_LINES: usize = 10_000;
const MAX_NOTES: usize = 100;

/// Builder for invoices that are calculated, and optionally validated, in
/// one step.
///
/// ```
/// use gobl::bill::{InvoiceBuilder, LineBuilder};
/// use gobl::org::Party;
/// use gobl::tax::Identity;
///
/// let inv = InvoiceBuilder::new("SAMPLE", "001")
///     .currency("EUR")
///     .supplier(Party::new("Provide One S.L.").with_tax_id(Identity::new("ES", "B98602642")))
///     .add_line(LineBuilder::new("Development services", "10", "100.00").tax("VAT", "standard").build())
///     .build_unchecked()
///     .unwrap();
/// assert_eq!(inv.totals.unwrap().payable.to_string(), "1210.00");
/// ```
pub struct InvoiceBuilder {
    series: Code,
    code: Code,
    kind: InvoiceType,
    regime: CountryCode,
    addons: Vec<Key>,
    issue_date: Option<NaiveDate>,
    op_date: Option<NaiveDate>,
    currency: CurrencyCode,
    exchange_rates: Vec<ExchangeRate>,
    tax: Tax,
    supplier: Option<Party>,
    customer: Option<Party>,
    lines: Vec<Line>,
    discounts: Vec<Discount>,
    charges: Vec<Charge>,
    payment: Option<PaymentDetails>,
    notes: Vec<Note>,
}

impl InvoiceBuilder {
    pub fn new(series: &str, code: &str) -> Self {
        Self {
            series: Code::from(series),
            code: Code::from(code),
            kind: InvoiceType::Standard,
            regime: CountryCode::default(),
            addons: Vec::new(),
            issue_date: None,
            op_date: None,
            currency: CurrencyCode::default(),
            exchange_rates: Vec::new(),
            tax: Tax::default(),
            supplier: None,
            customer: None,
            lines: Vec::new(),
            discounts: Vec::new(),
            charges: Vec::new(),
            payment: None,
            notes: Vec::new(),
        }
    }

    pub fn kind(mut self, kind: InvoiceType) -> Self {
        self.kind = kind;
        self
    }

    pub fn regime(mut self, country: &str) -> Self {
        self.regime = CountryCode::from(country);
        self
    }

    pub fn addon(mut self, key: &str) -> Self {
        self.addons.push(Key::from(key));
        self
    }

    pub fn issue_date(mut self, date: NaiveDate) -> Self {
        self.issue_date = Some(date);
        self
    }

    pub fn op_date(mut self, date: NaiveDate) -> Self {
        self.op_date = Some(date);
        self
    }

    pub fn currency(mut self, code: &str) -> Self {
        self.currency = CurrencyCode::new(code);
        self
    }

    pub fn exchange_rate(mut self, rate: ExchangeRate) -> Self {
        self.exchange_rates.push(rate);
        self
    }

    /// Item prices already include this tax category.
    pub fn prices_include(mut self, category: &str) -> Self {
        self.tax.prices_include = Code::from(category);
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tax.tags.push(Key::from(tag));
        self
    }

    pub fn tax_ext(mut self, key: &str, value: &str) -> Self {
        self.tax.ext.set(key, value);
        self
    }

    pub fn supplier(mut self, party: Party) -> Self {
        self.supplier = Some(party);
        self
    }

    pub fn customer(mut self, party: Party) -> Self {
        self.customer = Some(party);
        self
    }

    pub fn add_line(mut self, line: Line) -> Self {
        self.lines.push(line);
        self
    }

    pub fn add_discount(mut self, discount: Discount) -> Self {
        self.discounts.push(discount);
        self
    }

    pub fn add_charge(mut self, charge: Charge) -> Self {
        self.charges.push(charge);
        self
    }

    pub fn payment(mut self, payment: PaymentDetails) -> Self {
        self.payment = Some(payment);
        self
    }

    pub fn note(mut self, note: Note) -> Self {
        self.notes.push(note);
        self
    }

    /// Build, calculate and validate the invoice with the process-wide
    /// engine. Every validation error is reported, not just the first.
    pub fn build(self) -> Result<Invoice, GoblError> {
        self.build_with(engine())
    }

    pub fn build_with(self, engine: &Engine) -> Result<Invoice, GoblError> {
        let inv = self.build_unchecked_with(engine)?;
        inv.validate_using(engine)?;
        Ok(inv)
    }

    /// Build and calculate without validation, for importing external data.
    pub fn build_unchecked(self) -> Result<Invoice, GoblError> {
        self.build_unchecked_with(engine())
    }

    pub fn build_unchecked_with(self, engine: &Engine) -> Result<Invoice, GoblError> {
        let supplier = self
            .supplier
            .ok_or_else(|| GoblError::Builder("supplier is required".into()))?;
        if self.lines.is_empty() {
            return Err(GoblError::Builder("at least one line is required".into()));
        }
        if self.lines.len() > MAX_LINES {
            return Err(GoblError::Builder(format!("invoice cannot have more than {MAX_LINES} lines")));
        }
        if self.notes.len() > MAX_NOTES {
            return Err(GoblError::Builder(format!("invoice cannot have more than {MAX_NOTES} notes")));
        }

        let mut inv = Invoice {
            regime: self.regime,
            addons: self.addons,
            kind: self.kind,
            series: self.series,
            code: self.code,
            issue_date: self.issue_date,
            op_date: self.op_date,
            currency: self.currency,
            exchange_rates: self.exchange_rates,
            tax: Some(self.tax),
            supplier,
            customer: self.customer,
            lines: self.lines,
            discounts: self.discounts,
            charges: self.charges,
            payment: self.payment,
            notes: self.notes,
            ..Default::default()
        };
        inv.calculate_with(engine)?;
        Ok(inv)
    }
}

/// Builder for invoice lines.
pub struct LineBuilder {
    name: String,
    quantity: String,
    price: String,
    unit: Option<Unit>,
    reference: Option<Code>,
    taxes: Vec<Combo>,
    discounts: Vec<LineDiscount>,
    charges: Vec<LineCharge>,
}

impl LineBuilder {
    /// Quantity and price are given as decimal strings such as `"10"` and
    /// `"100.00"`; the precision of the price is kept.
    pub fn new(name: &str, quantity: &str, price: &str) -> Self {
        Self {
            name: name.to_string(),
            quantity: quantity.to_string(),
            price: price.to_string(),
            unit: None,
            reference: None,
            taxes: Vec::new(),
            discounts: Vec::new(),
            charges: Vec::new(),
        }
    }

    pub fn tax(mut self, category: &str, rate: &str) -> Self {
        self.taxes.push(Combo::new(category, rate));
        self
    }

    /// Tax with an explicit percentage instead of a regime rate key.
    pub fn tax_percent(mut self, category: &str, percent: Percentage) -> Self {
        let mut c = Combo::new(category, "");
        c.percent = Some(percent);
        self.taxes.push(c);
        self
    }

    pub fn unit(mut self, unit: &str) -> Self {
        self.unit = Some(Unit::new(unit));
        self
    }

    pub fn reference(mut self, reference: &str) -> Self {
        self.reference = Some(Code::from(reference));
        self
    }

    pub fn discount(mut self, discount: LineDiscount) -> Self {
        self.discounts.push(discount);
        self
    }

    pub fn charge(mut self, charge: LineCharge) -> Self {
        self.charges.push(charge);
        self
    }

    /// Unparseable quantities or prices are left as zero and reported by
    /// validation.
    pub fn build(self) -> Line {
        let quantity: Amount = self.quantity.parse().unwrap_or_default();
        let price: Amount = self.price.parse().unwrap_or_default();
        let mut item = Item::new(&self.name, price);
        if let Some(u) = self.unit {
            item.unit = u;
        }
        if let Some(r) = self.reference {
            item.reference = r;
        }
        let mut line = Line::new(quantity, item);
        for c in self.taxes {
            line = line.with_tax(c);
        }
        line.discounts = self.discounts;
        line.charges = self.charges;
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supplier_required() {
        let err = InvoiceBuilder::new("A", "1")
            .add_line(LineBuilder::new("Thing", "1", "1.00").build())
            .build_unchecked_with(&Engine::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "builder: supplier is required");
    }

    #[test]
    fn lines_required() {
        let err = InvoiceBuilder::new("A", "1")
            .supplier(Party::new("Provide One S.L."))
            .build_unchecked_with(&Engine::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "builder: at least one line is required");
    }

    #[test]
    fn line_builder() {
        let line = LineBuilder::new("Consulting", "2.5", "80.00")
            .unit("h")
            .reference("CNS")
            .tax_percent("VAT", "19%".parse().unwrap())
            .discount(LineDiscount::percent("10%".parse().unwrap()))
            .build();
        assert_eq!(line.quantity.to_string(), "2.5");
        let item = line.item.as_ref().unwrap();
        assert_eq!(item.price.unwrap().to_string(), "80.00");
        assert_eq!(item.unit.as_str(), "h");
        assert_eq!(line.taxes.iter().count(), 1);
        assert_eq!(line.discounts.len(), 1);
    }

    #[cfg(feature = "es")]
    #[test]
    fn build_validates() {
        let e = Engine::new();
        let inv = InvoiceBuilder::new("SAMPLE", "001")
            .currency("EUR")
            .supplier(Party::new("Provide One S.L.").with_tax_id(crate::tax::Identity::new("ES", "B98602642")))
            .add_line(LineBuilder::new("Development services", "10", "100.00").tax("VAT", "standard").build())
            .build_with(&e)
            .unwrap();
        assert_eq!(inv.totals.as_ref().unwrap().payable.to_string(), "1210.00");

        let err = InvoiceBuilder::new("SAMPLE", "002")
            .currency("EUR")
            .supplier(Party::new("").with_tax_id(crate::tax::Identity::new("ES", "B98602642")))
            .add_line(LineBuilder::new("Development services", "10", "100.00").tax("VAT", "standard").build())
            .build_with(&e)
            .unwrap_err();
        assert_eq!(err.validation_errors().unwrap().message("supplier.name"), Some("cannot be blank"));
    }
}
