use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cbc::{Code, Key, Stamp};
use crate::currency::CurrencyCode;
use crate::num::Amount;
use crate::tax::{self, Context, Extensions, Normalizers, Object, ObjectMut};
use crate::validation::{Errors, Validate, nested, required, validate_struct};

/// A reference to another document, such as the invoice a credit note
/// corrects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    #[serde(default, rename = "type", skip_serializing_if = "Key::is_empty")]
    pub kind: Key,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Code::is_empty")]
    pub series: Code,
    pub code: Code,
    #[serde(default, skip_serializing_if = "CurrencyCode::is_empty")]
    pub currency: CurrencyCode,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stamps: Vec<Stamp>,
    /// Correction keys describing what changed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub corrections: Vec<Key>,
    #[serde(default, skip_serializing_if = "Key::is_empty")]
    pub correction_method: Key,
    /// Tax totals of the referenced document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<tax::Total>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payable: Option<Amount>,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub ext: Extensions,
}

impl DocumentRef {
    pub fn new(series: &str, code: &str) -> Self {
        Self {
            series: Code::from(series),
            code: Code::from(code),
            ..Default::default()
        }
    }

    pub fn normalize(&mut self, n: &Normalizers<'_>) {
        self.series = self.series.normalize();
        self.code = self.code.normalize();
        self.reason = self.reason.trim().to_string();
        self.ext.clean();
        n.each(ObjectMut::DocumentRef(self));
    }

    /// Align stored amounts with the document's currency precision.
    pub(crate) fn calculate(&mut self, zero: Amount) {
        if let Some(p) = &mut self.payable {
            *p = p.rescale(zero.exp());
        }
    }
}

impl Validate for DocumentRef {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        validate_struct()
            .field("code", &self.code, vec![required()])
            .field("ext", &self.ext, vec![nested(ctx)])
            .with(ctx.validate(Object::DocumentRef(self)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn json_shape() {
        let mut r = DocumentRef::new("TEST", "123");
        r.issue_date = NaiveDate::from_ymd_opt(2022, 6, 13);
        r.reason = "test refund".into();
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["series"], "TEST");
        assert_eq!(json["issue_date"], "2022-06-13");
        assert!(json.get("stamps").is_none());
    }

    #[test]
    fn normalize_cleans_codes() {
        let ctx = Context::empty(crate::engine::engine());
        let mut r = DocumentRef::new(" test ", "a-12.3");
        r.normalize(&ctx.normalizers());
        assert_eq!(r.series, "TEST");
        assert_eq!(r.code, "A-123");
    }
}
