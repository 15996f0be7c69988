use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cbc::Key;
use crate::currency::CurrencyCode;
use crate::num::{Amount, Percentage};
use crate::tax::{Context, Extensions, Normalizers, Object, ObjectMut};
use crate::validation::{Errors, Validate, by, nested, required, validate_struct};

use super::means::check_means_key;

/// A payment already made towards a document, such as a deposit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Advance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Payment means used.
    #[serde(default, skip_serializing_if = "Key::is_empty")]
    pub key: Key,
    #[serde(default, rename = "ref", skip_serializing_if = "String::is_empty")]
    pub reference: String,
    /// Paid from a public grant or subsidy.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub grant: bool,
    #[serde(alias = "desc")]
    pub description: String,
    /// Share of the payable amount; when set the amount is derived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<Percentage>,
    #[serde(default)]
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "CurrencyCode::is_empty")]
    pub currency: CurrencyCode,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub ext: Extensions,
}

impl Advance {
    pub fn new(description: &str, amount: Amount) -> Self {
        Self {
            description: description.to_string(),
            amount,
            ..Default::default()
        }
    }

    pub fn normalize(&mut self, n: &Normalizers<'_>) {
        self.key = self.key.normalize();
        self.description = self.description.trim().to_string();
        self.ext.clean();
        n.each(ObjectMut::PayAdvance(self));
    }

    /// Derive the amount from the percentage of `payable`, when set, and
    /// align the precision with it.
    pub fn calculate_from(&mut self, payable: Amount) {
        match self.percent {
            Some(p) => self.amount = p.of(payable),
            None => self.amount = self.amount.rescale(payable.exp()),
        }
    }
}

impl Validate for Advance {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        validate_struct()
            .field("key", &self.key, vec![by(check_means_key)])
            .field("description", &self.description, vec![required()])
            .field("amount", &self.amount, vec![required()])
            .field("ext", &self.ext, vec![nested(ctx)])
            .with(ctx.validate(Object::PayAdvance(self)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_of_payable() {
        let mut a = Advance::new("Deposit", Amount::zero(2));
        a.percent = Some("40%".parse().unwrap());
        a.calculate_from("1210.00".parse().unwrap());
        assert_eq!(a.amount.to_string(), "484.00");
    }

    #[test]
    fn fixed_amount_is_rescaled() {
        let mut a = Advance::new("Deposit", "100".parse().unwrap());
        a.calculate_from("1210.00".parse().unwrap());
        assert_eq!(a.amount.to_string(), "100.00");
    }

    #[test]
    fn desc_alias() {
        let a: Advance = serde_json::from_str(r#"{"desc":"Deposit","amount":"10.00"}"#).unwrap();
        assert_eq!(a.description, "Deposit");
    }
}
