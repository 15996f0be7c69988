use serde::{Deserialize, Serialize};

use crate::tax::{Context, Extensions, Normalizers, Object, ObjectMut};
use crate::validation::{Errors, Validate, in_list, nested, required, validate_struct};

use super::{Code, Key};

pub const NOTE_GENERAL: &str = "general";
pub const NOTE_LEGAL: &str = "legal";
pub const NOTE_PAYMENT: &str = "payment";
pub const NOTE_REASON: &str = "reason";

/// Recognised note keys.
pub const NOTE_KEYS: &[&str] = &[
    "delivery",
    "general",
    "goods",
    "legal",
    "loading",
    "packaging",
    "payment",
    "payment-method",
    "payment-term",
    "reason",
    "shipping",
    "supplier",
    "tax",
];

/// Free text attached to a document, optionally classified by key, code
/// and source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Note {
    #[serde(default, skip_serializing_if = "Key::is_empty")]
    pub key: Key,
    #[serde(default, skip_serializing_if = "Code::is_empty")]
    pub code: Code,
    /// Source of the note, e.g. the regime or addon that added it.
    #[serde(default, skip_serializing_if = "Key::is_empty")]
    pub src: Key,
    pub text: String,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub ext: Extensions,
}

impl Note {
    pub fn new(key: &str, text: impl Into<String>) -> Self {
        Self {
            key: Key::from(key),
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_src(mut self, src: &str) -> Self {
        self.src = Key::from(src);
        self
    }

    pub fn with_code(mut self, code: impl Into<Code>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_ext(mut self, ext: Extensions) -> Self {
        self.ext = ext;
        self
    }

    /// Same key, source, code and text; extensions are not compared.
    pub fn same_as(&self, other: &Note) -> bool {
        self.key == other.key && self.src == other.src && self.code == other.code && self.text == other.text
    }

    pub fn normalize(&mut self, n: &Normalizers<'_>) {
        self.text = self.text.trim().to_string();
        self.ext.clean();
        n.each(ObjectMut::Note(self));
    }
}

impl Validate for Note {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        validate_struct()
            .field("key", &self.key, vec![in_list(NOTE_KEYS)])
            .field("text", &self.text, vec![required()])
            .field("ext", &self.ext, vec![nested(ctx)])
            .with(ctx.validate(Object::Note(self)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_as_ignores_ext() {
        let a = Note::new("legal", "Reverse charge").with_src("reverse-charge");
        let b = a.clone().with_ext(Extensions::from([("untdid-text-subject", "AAB")]));
        assert!(a.same_as(&b));
        assert!(!a.same_as(&Note::new("legal", "Other").with_src("reverse-charge")));
    }

    #[test]
    fn json_omits_empty() {
        let n = Note::new("general", "Thanks");
        assert_eq!(serde_json::to_string(&n).unwrap(), r#"{"key":"general","text":"Thanks"}"#);
    }
}
