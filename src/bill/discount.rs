use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cbc::{Code, Definition, Key};
use crate::num::{Amount, Percentage};
use crate::tax::{self, Context, Extensions, Normalizers, Object, ObjectMut, TaxableLine};
use crate::validation::{Errors, Validate, by, nested, required, validate_struct, when};

pub const DISCOUNT_EARLY_COMPLETION: &str = "early-completion";
pub const DISCOUNT_MILITARY: &str = "military";
pub const DISCOUNT_WORK_ACCIDENT: &str = "work-accident";
pub const DISCOUNT_SPECIAL_AGREEMENT: &str = "special-agreement";
pub const DISCOUNT_PRODUCTION_ERROR: &str = "production-error";
pub const DISCOUNT_NEW_OUTLET: &str = "new-outlet";
pub const DISCOUNT_SAMPLE: &str = "sample";
pub const DISCOUNT_END_OF_RANGE: &str = "end-of-range";
pub const DISCOUNT_INCOTERM: &str = "incoterm";
pub const DISCOUNT_POS_THRESHOLD: &str = "pos-threshold";
pub const DISCOUNT_SPECIAL_REBATE: &str = "special-rebate";
pub const DISCOUNT_TEMPORARY: &str = "temporary";
pub const DISCOUNT_STANDARD: &str = "standard";
pub const DISCOUNT_YEARLY_TURNOVER: &str = "yearly-turnover";

/// Discount keys with their UNTDID 5189 allowance reason code.
static DISCOUNT_KEYS: &[(&str, &str, &str)] = &[
    (DISCOUNT_EARLY_COMPLETION, "Bonus for works ahead of schedule", "41"),
    (DISCOUNT_MILITARY, "Military discount", "62"),
    (DISCOUNT_WORK_ACCIDENT, "Work accident discount", "63"),
    (DISCOUNT_SPECIAL_AGREEMENT, "Special agreement discount", "64"),
    (DISCOUNT_PRODUCTION_ERROR, "Production error discount", "65"),
    (DISCOUNT_NEW_OUTLET, "New outlet discount", "66"),
    (DISCOUNT_SAMPLE, "Sample discount", "67"),
    (DISCOUNT_END_OF_RANGE, "End of range discount", "68"),
    (DISCOUNT_INCOTERM, "Incoterm discount", "70"),
    (DISCOUNT_POS_THRESHOLD, "Point of sale threshold discount", "71"),
    (DISCOUNT_SPECIAL_REBATE, "Special rebate", "100"),
    (DISCOUNT_TEMPORARY, "Temporary", "102"),
    (DISCOUNT_STANDARD, "Standard", "103"),
    (DISCOUNT_YEARLY_TURNOVER, "Yearly turnover", "104"),
];

pub fn discount_key_defs() -> Vec<Definition> {
    DISCOUNT_KEYS.iter().map(|(k, name, _)| Definition::key(k, name)).collect()
}

/// UNTDID 5189 code for a discount key.
pub fn discount_untdid_code(key: &Key) -> Option<&'static str> {
    DISCOUNT_KEYS.iter().find(|(k, _, _)| key == k).map(|(_, _, code)| *code)
}

fn check_discount_key(key: &Key) -> Result<(), String> {
    if key.is_empty() || DISCOUNT_KEYS.iter().any(|(k, _, _)| key.base() == *k) {
        Ok(())
    } else {
        Err("must be a valid value".into())
    }
}

/// Discount applied to the whole document, with its own taxes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Discount {
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
    /// Amount the percentage applies to; the document sum by default.
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

/// Discount on a single line. Amounts are positive and subtracted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineDiscount {
    #[serde(default, skip_serializing_if = "Key::is_empty")]
    pub key: Key,
    #[serde(default, skip_serializing_if = "Code::is_empty")]
    pub code: Code,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    /// Amount the percentage applies to; the line sum by default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<Percentage>,
    #[serde(default)]
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub ext: Extensions,
}

impl Discount {
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
        n.each(ObjectMut::Discount(self));
        self.taxes.normalize(n);
    }

    /// Work out the amount from `sum` or the base, at the currency's
    /// exponent.
    pub(crate) fn calculate(&mut self, index: usize, sum: Amount, cur_exp: u32) {
        self.index = index;
        self.amount = allowance_amount(self.percent, self.base, self.amount, sum).rescale(cur_exp);
    }
}

impl TaxableLine for Discount {
    fn taxes(&self) -> &tax::Set {
        &self.taxes
    }

    fn total(&self) -> Amount {
        -self.amount
    }
}

impl Validate for Discount {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        validate_struct()
            .field("key", &self.key, vec![by(check_discount_key)])
            .field("percent", &self.percent, vec![when(self.base.is_some(), vec![required()])])
            .field("amount", &self.amount, vec![required()])
            .field("taxes", &self.taxes, vec![nested(ctx)])
            .field("ext", &self.ext, vec![nested(ctx)])
            .with(ctx.validate(Object::Discount(self)))
            .finish()
    }
}

impl LineDiscount {
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

    pub fn normalize(&mut self, n: &Normalizers<'_>) {
        self.key = self.key.normalize();
        self.code = self.code.normalize();
        self.ext.clean();
        n.each(ObjectMut::LineDiscount(self));
    }

    pub(crate) fn calculate(&mut self, sum: Amount, cur_exp: u32) {
        self.amount = allowance_amount(self.percent, self.base, self.amount, sum).rescale(cur_exp);
    }
}

impl Validate for LineDiscount {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        validate_struct()
            .field("key", &self.key, vec![by(check_discount_key)])
            .field("percent", &self.percent, vec![when(self.base.is_some(), vec![required()])])
            .field("amount", &self.amount, vec![required()])
            .field("ext", &self.ext, vec![nested(ctx)])
            .with(ctx.validate(Object::LineDiscount(self)))
            .finish()
    }
}

/// Amount of a discount or charge: a percentage of the base or `sum`,
/// otherwise the fixed amount.
pub(crate) fn allowance_amount(
    percent: Option<Percentage>,
    base: Option<Amount>,
    fixed: Amount,
    sum: Amount,
) -> Amount {
    match percent {
        Some(p) => p.of(base.map(|b| b.rescale_up(sum.exp())).unwrap_or(sum)),
        None => fixed,
    }
}
