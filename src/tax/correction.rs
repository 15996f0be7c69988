use crate::cbc::{Definition, Key, find_key};

/// How documents of one schema may be corrected under a regime or addon.
#[derive(Debug, Clone, Default)]
pub struct CorrectionDefinition {
    pub schema: &'static str,
    /// Document types a correction may produce.
    pub types: Vec<Key>,
    /// Extension keys that may be provided with the correction.
    pub extensions: Vec<Key>,
    pub reason_required: bool,
    /// Stamps that must be carried over to the preceding reference.
    pub stamps: Vec<Key>,
    /// Copy the tax totals of the original into the preceding reference.
    pub copy_tax: bool,
    /// What may be corrected, e.g. `line` or `issue-date`.
    pub corrections: Vec<Definition>,
    /// How the correction is made, e.g. `complete` or `partial`.
    pub methods: Vec<Definition>,
}

impl CorrectionDefinition {
    pub fn new(schema: &'static str) -> Self {
        Self {
            schema,
            ..Default::default()
        }
    }

    /// Union of both definitions for the same schema; `other` is ignored
    /// when the schema differs.
    pub fn merge(&self, other: &CorrectionDefinition) -> CorrectionDefinition {
        let mut out = self.clone();
        if self.schema != other.schema {
            return out;
        }
        extend_unique(&mut out.types, &other.types);
        extend_unique(&mut out.extensions, &other.extensions);
        extend_unique(&mut out.stamps, &other.stamps);
        for def in &other.corrections {
            if find_key(&out.corrections, &def.key).is_none() {
                out.corrections.push(def.clone());
            }
        }
        for def in &other.methods {
            if find_key(&out.methods, &def.key).is_none() {
                out.methods.push(def.clone());
            }
        }
        out.reason_required |= other.reason_required;
        out.copy_tax |= other.copy_tax;
        out
    }

    pub fn has_type(&self, key: &str) -> bool {
        self.types.iter().any(|t| t == &key)
    }

    pub fn has_extension(&self, key: &Key) -> bool {
        self.extensions.contains(key)
    }

    pub fn has_correction(&self, key: &Key) -> bool {
        find_key(&self.corrections, key).is_some()
    }

    pub fn has_method(&self, key: &Key) -> bool {
        find_key(&self.methods, key).is_some()
    }
}

fn extend_unique(list: &mut Vec<Key>, more: &[Key]) {
    for k in more {
        if !list.contains(k) {
            list.push(k.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_same_schema() {
        let mut a = CorrectionDefinition::new("bill/invoice");
        a.types = vec![Key::from("corrective")];
        a.corrections = vec![Definition::key("line", "Line")];
        let mut b = CorrectionDefinition::new("bill/invoice");
        b.types = vec![Key::from("corrective"), Key::from("credit-note")];
        b.reason_required = true;
        b.stamps = vec![Key::from("tbai-code")];
        let m = a.merge(&b);
        assert_eq!(m.types.len(), 2);
        assert!(m.has_type("credit-note"));
        assert!(m.reason_required);
        assert!(m.has_correction(&Key::from("line")));
        assert_eq!(m.stamps, vec![Key::from("tbai-code")]);
    }

    #[test]
    fn merge_other_schema_is_ignored() {
        let a = CorrectionDefinition::new("bill/invoice");
        let mut b = CorrectionDefinition::new("bill/order");
        b.reason_required = true;
        assert!(!a.merge(&b).reason_required);
    }
}
