//! SIREN and SIRET business registration numbers.

use crate::catalogues::{EXT_ISO_SCHEME_ID, SchemeId};
use crate::cbc::Code;
use crate::org::Identity;
use crate::validation::Errors;

pub const IDENTITY_KEY_SIREN: &str = "siren";
pub const IDENTITY_KEY_SIRET: &str = "siret";
pub const IDENTITY_TYPE_SIREN: &str = "SIREN";
pub const IDENTITY_TYPE_SIRET: &str = "SIRET";

/// SIREN given by key, type or ISO scheme.
pub fn is_siren(id: &Identity) -> bool {
    id.key == IDENTITY_KEY_SIREN
        || id.kind == IDENTITY_TYPE_SIREN
        || id.ext.is(EXT_ISO_SCHEME_ID, SchemeId::SIREN.code)
}

/// SIRET given by key, type or ISO scheme.
pub fn is_siret(id: &Identity) -> bool {
    id.key == IDENTITY_KEY_SIRET
        || id.kind == IDENTITY_TYPE_SIRET
        || id.ext.is(EXT_ISO_SCHEME_ID, SchemeId::SIRET.code)
}

/// Drop the country prefix and anything that isn't a digit.
pub(super) fn normalize(id: &mut Identity) {
    if !is_siren(id) && !is_siret(id) {
        return;
    }
    let code = id.code.as_str();
    let code = code.strip_prefix("FR").unwrap_or(code);
    id.code = Code::from(code.chars().filter(char::is_ascii_digit).collect::<String>());
}

pub(super) fn validate(id: &Identity) -> Result<(), Errors> {
    let len = if is_siren(id) {
        9
    } else if is_siret(id) {
        14
    } else {
        return Ok(());
    };
    let mut errs = Errors::new();
    let code = id.code.as_str();
    if code.is_empty() {
        errs.add("code", "cannot be blank");
    } else if code.len() != len || !code.bytes().all(|b| b.is_ascii_digit()) {
        errs.add("code", "invalid format");
    } else if !luhn(&code[..9]) {
        errs.add("code", "checksum mismatch");
    }
    errs.into_result()
}

/// Luhn check over a string of ASCII digits.
pub(super) fn luhn(digits: &str) -> bool {
    let sum: u32 = digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            match (i % 2 == 1, d * 2) {
                (true, v) if v > 9 => v - 9,
                (true, v) => v,
                (false, _) => d,
            }
        })
        .sum();
    sum % 10 == 0
}
