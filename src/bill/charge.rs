use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cbc::{Code, Definition, Key};
use crate::num::{Amount, Percentage};
use crate::org::Unit;
use crate::tax::{self, Context, Extensions, Normalizers, Object, ObjectMut, TaxableLine};
use crate::validation::{Errors, Validate, by, empty, nested, required, validate_struct, when};

use super::discount::allowance_amount;

pub const CHARGE_STAMP_DUTY: &str = "stamp-duty";
pub const CHARGE_OUTLAY: &str = "outlay";
pub const CHARGE_TAX: &str = "tax";
pub const CHARGE_CUSTOMS: &str = "customs";
pub const CHARGE_DELIVERY: &str = "delivery";
pub const CHARGE_PACKING: &str = "packing";
pub const CHARGE_HANDLING: &str = "handling";
pub const CHARGE_INSURANCE: &str = "insurance";
pub const CHARGE_STORAGE: &str = "storage";
pub const CHARGE_ADMIN: &str = "admin";
pub const CHARGE_CLEANING: &str = "cleaning";

/// Charge keys with their UNTDID 7161 charge reason code.
static CHARGE_KEYS: &[(&str, &str, &str)] = &[
    (CHARGE_STAMP_DUTY, "Stamp Duty", "ST"),
    (CHARGE_OUTLAY, "Outlay", "AAT"),
    (CHARGE_TAX, "Tax", "TX"),
    (CHARGE_CUSTOMS, "Customs", "ABW"),
    (CHARGE_DELIVERY, "Delivery", "DL"),
    (CHARGE_PACKING, "Packing", "PC"),
    (CHARGE_HANDLING, "Handling", "HD"),
    (CHARGE_INSURANCE, "Insurance", "IN"),
    (CHARGE_STORAGE, "Storage", "ABA"),
    (CHARGE_ADMIN, "Administration", "AEM"),
    (CHARGE_CLEANING, "Cleaning", "CG"),
];

pub fn charge_key_defs() -> Vec<Definition> {
    CHARGE_KEYS.iter().map(|(k, name, _)| Definition::key(k, name)).collect()
}

/// UNTDID 7161 code for a charge key.
pub fn charge_untdid_code(key: &Key) -> Option<&'static str> {
    CHARGE_KEYS.iter().find(|(k, _, _)| key == k).map(|(_, _, code)| *code)
}

fn check_charge_key(key: &Key) -> Result<(), String> {
    if key.is_empty() || CHARGE_KEYS.iter().any(|(k, _, _)| key.base() == *k) {
        Ok(())
    } else {
        Err("must be a valid value".into())
    }
}

/// Charge applied to the whole document, with its own taxes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Charge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    #[serde(default, rename = "i")]
    pub index: usize,
    #[serde(default, skip_serializing_if = "Key::is_empty")]
    pub key: Key,
    #[serde(default, skip_serializing_if = "Code::is_empty")]
    pub code: Code,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<Percentage>,
    #[serde(default)]
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "tax::Set::is_empty")]
    pub taxes: tax::Set,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub ext: Extensions,
}

/// Charge on a single line: a percentage, a rate per unit or a fixed
/// amount.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineCharge {
    #[serde(default, skip_serializing_if = "Key::is_empty")]
    pub key: Key,
    #[serde(default, skip_serializing_if = "Code::is_empty")]
    pub code: Code,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<Percentage>,
    /// Units the rate applies to; the line quantity by default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Amount>,
    #[serde(default, skip_serializing_if = "Unit::is_empty")]
    pub unit: Unit,
    /// Amount charged per unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<Amount>,
    #[serde(default)]
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub ext: Extensions,
}

impl Charge {
    pub fn new(reason: &str, amount: Amount) -> Self {
        Self {
            reason: reason.to_string(),
            amount,
            ..Default::default()
        }
    }

    pub fn percent(reason: &str, percent: Percentage) -> Self {
        Self {
            reason: reason.to_string(),
            percent: Some(percent),
            ..Default::default()
        }
    }

    pub fn normalize(&mut self, n: &Normalizers<'_>) {
        self.key = self.key.normalize();
        self.code = self.code.normalize();
        self.ext.clean();
        n.each(ObjectMut::Charge(self));
        self.taxes.normalize(n);
    }

    pub(crate) fn calculate(&mut self, index: usize, sum: Amount, cur_exp: u32) {
        self.index = index;
        self.amount = allowance_amount(self.percent, self.base, self.amount, sum).rescale(cur_exp);
    }
}

impl TaxableLine for Charge {
    fn taxes(&self) -> &tax::Set {
        &self.taxes
    }

    fn total(&self) -> Amount {
        self.amount
    }
}

impl Validate for Charge {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        validate_struct()
            .field("key", &self.key, vec![by(check_charge_key)])
            .field("percent", &self.percent, vec![when(self.base.is_some(), vec![required()])])
            .field("amount", &self.amount, vec![required()])
            .field("taxes", &self.taxes, vec![nested(ctx)])
            .field("ext", &self.ext, vec![nested(ctx)])
            .with(ctx.validate(Object::Charge(self)))
            .finish()
    }
}

impl LineCharge {
    pub fn percent(percent: Percentage) -> Self {
        Self {
            percent: Some(percent),
            ..Default::default()
        }
    }

    pub fn amount(amount: Amount) -> Self {
        Self {
            amount,
            ..Default::default()
        }
    }

    /// Charge of `rate` for each unit of the line quantity.
    pub fn rate(rate: Amount) -> Self {
        Self {
            rate: Some(rate),
            ..Default::default()
        }
    }

    pub fn normalize(&mut self, n: &Normalizers<'_>) {
        self.key = self.key.normalize();
        self.code = self.code.normalize();
        self.ext.clean();
        n.each(ObjectMut::LineCharge(self));
    }

    pub(crate) fn calculate(&mut self, sum: Amount, quantity: Amount, cur_exp: u32) {
        let amount = match (self.percent, self.rate) {
            (None, Some(rate)) => {
                let qty = self.quantity.unwrap_or(quantity);
                rate.rescale_up(sum.exp()).multiply(qty)
            }
            _ => allowance_amount(self.percent, self.base, self.amount, sum),
        };
        self.amount = amount.rescale(cur_exp);
    }
}

impl Validate for LineCharge {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        validate_struct()
            .field("key", &self.key, vec![by(check_charge_key)])
            .field("percent", &self.percent, vec![when(self.base.is_some(), vec![required()])])
            .field("rate", &self.rate, vec![when(self.percent.is_some(), vec![empty()])])
            .field("amount", &self.amount, vec![required()])
            .field("ext", &self.ext, vec![nested(ctx)])
            .with(ctx.validate(Object::LineCharge(self)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amt(s: &str) -> Amount {
        s.parse().unwrap()
    }

    #[test]
    fn rate_times_quantity() {
        let mut c = LineCharge::rate(amt("0.50"));
        c.calculate(amt("100.0000"), amt("3"), 2);
        assert_eq!(c.amount.to_string(), "1.50");
        c.quantity = Some(amt("10"));
        c.calculate(amt("100.0000"), amt("3"), 2);
        assert_eq!(c.amount.to_string(), "5.00");
    }

    #[test]
    fn document_charge_percent() {
        let mut c = Charge::percent("Handling", "2.5%".parse().unwrap());
        c.calculate(2, amt("200.0000"), 2);
        assert_eq!(c.amount.to_string(), "5.00");
        assert_eq!(TaxableLine::total(&c).to_string(), "5.00");
    }

    #[test]
    fn keys() {
        assert_eq!(charge_untdid_code(&Key::from("delivery")), Some("DL"));
        assert!(check_charge_key(&Key::from("delivery+express")).is_ok());
        assert!(check_charge_key(&Key::from("bribe")).is_err());
        assert_eq!(charge_key_defs().len(), 11);
    }
}
