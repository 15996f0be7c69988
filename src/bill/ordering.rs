use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cbc::Code;
use crate::org::{DocumentRef, Identity, Party};
use crate::tax::{Context, Normalizers};
use crate::validation::{Errors, Validate, by, nested, validate_struct};

/// Range of dates a document or delivery covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Period {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Validate for Period {
    fn validate_with(&self, _ctx: &Context<'_>) -> Result<(), Errors> {
        let start = self.start;
        validate_struct()
            .field(
                "end",
                &self.end,
                vec![by(move |end: &NaiveDate| {
                    if *end < start { Err("must be on or after start".into()) } else { Ok(()) }
                })],
            )
            .finish()
    }
}

/// References to the documents and parties involved in the order to
/// delivery process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Ordering {
    /// Buyer's internal routing code.
    #[serde(default, skip_serializing_if = "Code::is_empty")]
    pub code: Code,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identities: Vec<Identity>,
    /// Buyer's accounting cost code.
    #[serde(default, skip_serializing_if = "Code::is_empty")]
    pub cost: Code,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    /// Party paying, when not the customer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer: Option<Party>,
    /// Party liable for taxes, when not the supplier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller: Option<Party>,
    /// Third party issuing the document on behalf of the supplier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<Party>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<DocumentRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contracts: Vec<DocumentRef>,
    /// Purchase orders issued by the customer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub purchases: Vec<DocumentRef>,
    /// Sales orders issued by the supplier.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sales: Vec<DocumentRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub receiving: Vec<DocumentRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub despatch: Vec<DocumentRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tender: Vec<DocumentRef>,
}

impl Ordering {
    pub fn normalize(&mut self, n: &Normalizers<'_>) {
        self.code = self.code.normalize();
        self.cost = self.cost.normalize();
        for id in &mut self.identities {
            id.normalize(n);
        }
        for p in [&mut self.buyer, &mut self.seller, &mut self.issuer].into_iter().flatten() {
            p.normalize(n);
        }
        for r in self.refs_mut() {
            r.normalize(n);
        }
    }

    fn refs_mut(&mut self) -> impl Iterator<Item = &mut DocumentRef> {
        self.projects
            .iter_mut()
            .chain(self.contracts.iter_mut())
            .chain(self.purchases.iter_mut())
            .chain(self.sales.iter_mut())
            .chain(self.receiving.iter_mut())
            .chain(self.despatch.iter_mut())
            .chain(self.tender.iter_mut())
    }
}

impl Validate for Ordering {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        validate_struct()
            .field("identities", &self.identities, vec![nested(ctx)])
            .field("period", &self.period, vec![nested(ctx)])
            .field("buyer", &self.buyer, vec![nested(ctx)])
            .field("seller", &self.seller, vec![nested(ctx)])
            .field("issuer", &self.issuer, vec![nested(ctx)])
            .field("projects", &self.projects, vec![nested(ctx)])
            .field("contracts", &self.contracts, vec![nested(ctx)])
            .field("purchases", &self.purchases, vec![nested(ctx)])
            .field("sales", &self.sales, vec![nested(ctx)])
            .field("receiving", &self.receiving, vec![nested(ctx)])
            .field("despatch", &self.despatch, vec![nested(ctx)])
            .field("tender", &self.tender, vec![nested(ctx)])
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_references() {
        let ctx = Context::empty(crate::engine::engine());
        let mut o = Ordering {
            code: Code::from(" po-1 "),
            purchases: vec![DocumentRef::new("", "po 123")],
            ..Default::default()
        };
        o.normalize(&ctx.normalizers());
        assert_eq!(o.code, "PO-1");
        assert_eq!(o.purchases[0].code, "PO123");
    }

    #[test]
    fn period_order() {
        let ctx = Context::empty(crate::engine::engine());
        let p = Period {
            label: String::new(),
            start: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        let err = p.validate_with(&ctx).unwrap_err();
        assert_eq!(err.message("end"), Some("must be on or after start"));
    }
}
