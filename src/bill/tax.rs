use serde::{Deserialize, Serialize};

use crate::cbc::{Code, Key};
use crate::tax::{Context, Extensions, Normalizers, Object, ObjectMut, RoundingRule};
use crate::validation::{Errors, Validate, by, nested, validate_struct};

/// Document level tax options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tax {
    /// Category already included in item prices, usually `VAT`.
    #[serde(default, skip_serializing_if = "Code::is_empty")]
    pub prices_include: Code,
    /// Overrides the regime's rounding rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounding: Option<RoundingRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Key>,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub ext: Extensions,
}

impl Tax {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == &tag)
    }

    pub fn normalize(&mut self, n: &Normalizers<'_>) {
        self.prices_include = self.prices_include.normalize();
        for t in &mut self.tags {
            *t = t.normalize();
        }
        self.tags.dedup();
        self.ext.clean();
        n.each(ObjectMut::BillTax(self));
    }

    pub fn is_empty(&self) -> bool {
        self == &Tax::default()
    }
}

impl Validate for Tax {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        validate_struct()
            .field(
                "prices_include",
                &self.prices_include,
                vec![by(|c: &Code| {
                    let Some(regime) = ctx.regime() else { return Ok(()) };
                    match regime.category_def(c) {
                        None if !c.is_empty() => Err(format!("'{c}' not defined in regime")),
                        Some(cat) if cat.retained => Err("cannot include retained category".into()),
                        _ => Ok(()),
                    }
                })],
            )
            .field(
                "tags",
                &self.tags,
                vec![by(|tags: &Vec<Key>| match tags.iter().find(|t| ctx.tag_def(t).is_none()) {
                    Some(t) => Err(format!("'{t}' undefined")),
                    None => Ok(()),
                })],
            )
            .field("ext", &self.ext, vec![nested(ctx)])
            .with(ctx.validate(Object::BillTax(self)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_shape() {
        let t: Tax = serde_json::from_str(r#"{"prices_include":"VAT","rounding":"currency","tags":["simplified"]}"#)
            .unwrap();
        assert_eq!(t.prices_include, "VAT");
        assert_eq!(t.rounding, Some(RoundingRule::Currency));
        assert!(t.has_tag("simplified"));
        assert!(serde_json::from_str::<Tax>(r#"{"unknown":1}"#).is_err());
    }

    #[test]
    fn unknown_tag_is_invalid() {
        let ctx = Context::empty(crate::engine::engine());
        let t = Tax {
            tags: vec![Key::from("nonsense")],
            ..Default::default()
        };
        let err = t.validate_with(&ctx).unwrap_err();
        assert_eq!(err.message("tags"), Some("'nonsense' undefined"));
    }
}
