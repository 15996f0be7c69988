//! France: VAT, SIREN/SIRET registration numbers and VAT codes built from
//! the SIREN.

mod identities;

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::cbc::{Code, I18nString};
use crate::num::Percentage;
use crate::schema::BILL_INVOICE;
use crate::tax::{
    CategoryDef, CorrectionDefinition, Identity, Object, ObjectMut, RateDef, RateValueDef, RegimeDef, RoundingRule,
};
use crate::validation::Errors;

pub use identities::{
    IDENTITY_KEY_SIREN, IDENTITY_KEY_SIRET, IDENTITY_TYPE_SIREN, IDENTITY_TYPE_SIRET, is_siren, is_siret,
};

pub fn new() -> RegimeDef {
    RegimeDef {
        country: "FR".into(),
        name: I18nString::en("France").with("fr", "France"),
        currency: "EUR".into(),
        time_zone: "Europe/Paris".into(),
        rounding: RoundingRule::Precise,
        corrections: vec![CorrectionDefinition {
            types: vec!["credit-note".into(), "corrective".into()],
            ..CorrectionDefinition::new(BILL_INVOICE)
        }],
        categories: categories(),
        normalizer: Some(normalize),
        validator: Some(validate),
        ..Default::default()
    }
}

fn normalize(obj: ObjectMut<'_>) {
    match obj {
        ObjectMut::TaxIdentity(id) => normalize_tax_identity(id),
        ObjectMut::Identity(id) => identities::normalize(id),
        _ => {}
    }
}

fn validate(obj: Object<'_>) -> Result<(), Errors> {
    match obj {
        Object::TaxIdentity(id) => validate_tax_identity(id),
        Object::Identity(id) => identities::validate(id),
        _ => Ok(()),
    }
}

/// Two digit key computed from the SIREN.
pub fn vat_key(siren: u64) -> u64 {
    (12 + 3 * (siren % 97)) % 97
}

/// A bare SIREN is expanded into the full VAT code.
fn normalize_tax_identity(id: &mut Identity) {
    let code = id.code.as_str();
    if code.len() != 9 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return;
    }
    if let Ok(siren) = code.parse::<u64>() {
        id.code = Code::from(format!("{:02}{code}", vat_key(siren)));
    }
}

fn tax_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9A-Z]{2}[0-9]{9}$").expect("valid tax code regex"))
}

/// Numeric keys must match the SIREN; alphabetic keys are accepted as
/// given.
fn validate_tax_identity(id: &Identity) -> Result<(), Errors> {
    let code = id.code.as_str();
    if code.is_empty() {
        return Ok(());
    }
    let mut errs = Errors::new();
    if !tax_code_regex().is_match(code) {
        errs.add("code", "invalid format");
    } else if let (Ok(key), Ok(siren)) = (code[..2].parse::<u64>(), code[2..].parse::<u64>()) {
        if key != vat_key(siren) {
            errs.add("code", "checksum mismatch");
        }
    }
    errs.into_result()
}

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

fn categories() -> Vec<CategoryDef> {
    let pct = |v| Percentage::new(v, 3);
    vec![
        CategoryDef::new("VAT", "TVA", "Taxe sur la Valeur Ajoutée").rates(vec![
            RateDef::new("zero", "Zero Rate").values(vec![RateValueDef::new(None, pct(0))]),
            RateDef::new("standard", "Standard Rate").values(vec![
                RateValueDef::new(date(2014, 1, 1), pct(200)),
                RateValueDef::new(date(2000, 4, 1), pct(196)),
            ]),
            RateDef::new("intermediate", "Intermediate Rate").values(vec![
                RateValueDef::new(date(2014, 1, 1), pct(100)),
                RateValueDef::new(date(2012, 1, 1), pct(70)),
            ]),
            RateDef::new("reduced", "Reduced Rate").values(vec![RateValueDef::new(None, pct(55))]),
            RateDef::new("super-reduced", "Super-Reduced Rate").values(vec![RateValueDef::new(None, pct(21))]),
        ]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cbc::Key;

    fn tax_error(code: &str) -> Option<String> {
        validate_tax_identity(&Identity::new("FR", code))
            .err()
            .and_then(|e| e.message("code").map(str::to_string))
    }

    #[test]
    fn vat_keys() {
        assert_eq!(vat_key(356000000), 39);
        assert_eq!(vat_key(732829320), 44);
    }

    #[test]
    fn siren_becomes_vat_code() {
        let mut id = Identity::new("FR", "356000000");
        normalize_tax_identity(&mut id);
        assert_eq!(id.code, "39356000000");
        let mut id = Identity::new("FR", "44732829320");
        normalize_tax_identity(&mut id);
        assert_eq!(id.code, "44732829320");
    }

    #[test]
    fn tax_codes() {
        assert_eq!(tax_error("39356000000"), None);
        assert_eq!(tax_error("AB356000000"), None);
        assert_eq!(tax_error("40356000000").as_deref(), Some("checksum mismatch"));
        assert_eq!(tax_error("3935600000").as_deref(), Some("invalid format"));
        assert_eq!(tax_error("39-356000000").as_deref(), Some("invalid format"));
    }

    #[test]
    fn vat_history() {
        let cats = categories();
        let std = cats[0].rate_def(&Key::from("standard")).unwrap();
        let on = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        let v = std.value(on(2024, 1, 1), &[], &Default::default()).unwrap();
        assert_eq!(v.percent.to_string(), "20.0%");
        let v = std.value(on(2013, 6, 1), &[], &Default::default()).unwrap();
        assert_eq!(v.percent.to_string(), "19.6%");
        let reduced = cats[0].rate_def(&Key::from("reduced")).unwrap();
        assert_eq!(reduced.value(on(2024, 1, 1), &[], &Default::default()).unwrap().percent.to_string(), "5.5%");
    }

    #[test]
    fn credit_notes_allowed() {
        let r = new();
        let cd = r.correction_definition(BILL_INVOICE).unwrap();
        assert!(cd.has_type("credit-note"));
        assert!(cd.has_type("corrective"));
    }
}
