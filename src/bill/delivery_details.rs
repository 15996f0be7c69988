use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::org::{Identity, Party};
use crate::tax::{Context, Normalizers};
use crate::validation::{Errors, Validate, nested, validate_struct};

use super::Period;

/// Where and when the goods of an invoice or order are delivered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeliveryDetails {
    /// Party receiving the goods, when not the customer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<Party>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identities: Vec<Identity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl DeliveryDetails {
    pub fn normalize(&mut self, n: &Normalizers<'_>) {
        if let Some(r) = &mut self.receiver {
            r.normalize(n);
        }
        for id in &mut self.identities {
            id.normalize(n);
        }
    }
}

impl Validate for DeliveryDetails {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        validate_struct()
            .field("receiver", &self.receiver, vec![nested(ctx)])
            .field("identities", &self.identities, vec![nested(ctx)])
            .field("period", &self.period, vec![nested(ctx)])
            .finish()
    }
}
