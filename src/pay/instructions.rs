use serde::{Deserialize, Serialize};

use crate::cbc::{Code, Key};
use crate::tax::{Context, Extensions, Normalizers, Object, ObjectMut};
use crate::validation::{Errors, Validate, by, nested, required, validate_struct};

use super::means::check_means_key;

/// How the customer is expected to pay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Instructions {
    /// Payment means, e.g. `credit-transfer` or `card`.
    pub key: Key,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
    /// Remittance reference the payer should quote.
    #[serde(default, rename = "ref", skip_serializing_if = "Code::is_empty")]
    pub reference: Code,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub credit_transfer: Vec<CreditTransfer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<Card>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_debit: Option<DirectDebit>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub online: Vec<Online>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub ext: Extensions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreditTransfer {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub iban: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bic: String,
    /// Account number when no IBAN is available.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub number: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Card {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub first6: String,
    pub last4: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub holder: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectDebit {
    /// Mandate reference.
    #[serde(default, rename = "ref", skip_serializing_if = "String::is_empty")]
    pub reference: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub creditor: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub account: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Online {
    #[serde(default, skip_serializing_if = "Key::is_empty")]
    pub key: Key,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    pub url: String,
}

impl Instructions {
    pub fn new(key: &str) -> Self {
        Self {
            key: Key::from(key),
            ..Default::default()
        }
    }

    pub fn normalize(&mut self, n: &Normalizers<'_>) {
        self.key = self.key.normalize();
        self.reference = self.reference.normalize();
        for ct in &mut self.credit_transfer {
            ct.iban = ct.iban.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_uppercase();
            ct.bic = ct.bic.trim().to_uppercase();
        }
        self.ext.clean();
        n.each(ObjectMut::PayInstructions(self));
    }
}

impl Validate for Instructions {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        validate_struct()
            .field("key", &self.key, vec![required(), by(check_means_key)])
            .field(
                "online",
                &self.online,
                vec![by(|list: &Vec<Online>| {
                    match list.iter().position(|o| !o.url.starts_with("http://") && !o.url.starts_with("https://")) {
                        Some(i) => Err(format!("entry {i} must have a valid URL")),
                        None => Ok(()),
                    }
                })],
            )
            .field("ext", &self.ext, vec![nested(ctx)])
            .with(ctx.validate(Object::PayInstructions(self)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::engine;

    #[test]
    fn normalizes_iban() {
        let ctx = Context::empty(engine());
        let mut i = Instructions::new("Credit-Transfer");
        i.credit_transfer.push(CreditTransfer {
            iban: "es25 0188 2570 0186 9023 7811".into(),
            ..Default::default()
        });
        i.normalize(&ctx.normalizers());
        assert_eq!(i.key, "credit-transfer");
        assert_eq!(i.credit_transfer[0].iban, "ES2501882570018690237811");
        assert!(i.validate_with(&ctx).is_ok());
    }

    #[test]
    fn unknown_means_key() {
        let ctx = Context::empty(engine());
        let err = Instructions::new("barter").validate_with(&ctx).unwrap_err();
        assert_eq!(err.message("key"), Some("must be a valid value"));
    }
}
