//! Code lists shared between addons, published as extension definitions
//! so documents can carry their codes directly.

mod iso;
mod untdid;

pub use iso::{EXT_ISO_SCHEME_ID, ISO_SCHEMES, SchemeId, scheme_id};
pub use untdid::{
    DOCUMENT_TYPES, EXT_UNTDID_DOCUMENT_TYPE, EXT_UNTDID_REFERENCE, EXT_UNTDID_TAX_CATEGORY, EXT_UNTDID_TEXT_SUBJECT,
    REFERENCES, TAX_CATEGORIES, TEXT_SUBJECTS,
};

use crate::cbc::Definition;

/// Every catalogue as an extension definition.
pub fn extensions() -> Vec<Definition> {
    vec![
        untdid::document_type_def(),
        untdid::tax_category_def(),
        untdid::text_subject_def(),
        untdid::reference_def(),
        iso::scheme_id_def(),
    ]
}

/// `(code, name)` pairs as definition values.
fn code_values(list: &[(&str, &str)]) -> Vec<Definition> {
    list.iter().map(|(code, name)| Definition::code(code, name)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cbc::Code;

    #[test]
    fn keys_are_distinct() {
        let defs = extensions();
        for (i, d) in defs.iter().enumerate() {
            assert!(d.key.is_valid(), "{}", d.key);
            assert!(defs[..i].iter().all(|o| o.key != d.key));
        }
    }

    #[test]
    fn checks_codes() {
        let defs = extensions();
        let doc = &defs[0];
        assert!(doc.check(&Code::from("380")).is_ok());
        assert_eq!(doc.check(&Code::from("999")).unwrap_err(), "value '999' invalid");
    }
}
