use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cbc::{Definition, Key};
use crate::currency::CurrencyCode;
use crate::num::{Amount, Percentage};
use crate::tax::{Context, Extensions, Normalizers, Object, ObjectMut};
use crate::validation::{Errors, Validate, by, nested, validate_struct};

pub const TERM_END_OF_MONTH: &str = "end-of-month";
pub const TERM_DUE_DATE: &str = "due-date";
pub const TERM_DEFERRED: &str = "deferred";
pub const TERM_PROXIMO: &str = "proximo";
pub const TERM_INSTANT: &str = "instant";
pub const TERM_ELECTIVE: &str = "elective";
pub const TERM_PENDING: &str = "pending";
pub const TERM_ADVANCED: &str = "advanced";
pub const TERM_DELIVERY: &str = "delivery";
pub const TERM_UNDEFINED: &str = "undefined";

const TERM_KEYS: &[&str] = &[
    TERM_END_OF_MONTH,
    TERM_DUE_DATE,
    TERM_DEFERRED,
    TERM_PROXIMO,
    TERM_INSTANT,
    TERM_ELECTIVE,
    TERM_PENDING,
    TERM_ADVANCED,
    TERM_DELIVERY,
    TERM_UNDEFINED,
];

/// When payment is expected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Terms {
    #[serde(default, skip_serializing_if = "Key::is_empty")]
    pub key: Key,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub due_dates: Vec<DueDate>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub ext: Extensions,
}

/// An instalment: an amount or share of the payable due on a date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DueDate {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(default)]
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<Percentage>,
    #[serde(default, skip_serializing_if = "CurrencyCode::is_empty")]
    pub currency: CurrencyCode,
}

pub fn term_key_defs() -> Vec<Definition> {
    TERM_KEYS.iter().map(|k| Definition::key(k, k)).collect()
}

impl Terms {
    pub fn normalize(&mut self, n: &Normalizers<'_>) {
        self.key = self.key.normalize();
        self.ext.clean();
        n.each(ObjectMut::PayTerms(self));
    }

    /// Work out instalment amounts from their percentages of `payable`.
    pub fn calculate_due_dates(&mut self, payable: Amount) {
        for dd in &mut self.due_dates {
            match dd.percent {
                Some(p) => dd.amount = p.of(payable),
                None => dd.amount = dd.amount.rescale(payable.exp()),
            }
        }
    }
}

impl Validate for Terms {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        validate_struct()
            .field(
                "key",
                &self.key,
                vec![by(|k: &Key| {
                    if k.is_empty() || TERM_KEYS.contains(&k.as_str()) {
                        Ok(())
                    } else {
                        Err("must be a valid value".into())
                    }
                })],
            )
            .field(
                "due_dates",
                &self.due_dates,
                vec![by(|dds: &Vec<DueDate>| {
                    let sorted = dds.windows(2).all(|w| w[0].date <= w[1].date);
                    if sorted { Ok(()) } else { Err("must be in chronological order".into()) }
                })],
            )
            .field("ext", &self.ext, vec![nested(ctx)])
            .with(ctx.validate(Object::PayTerms(self)))
            .finish()
    }
}
