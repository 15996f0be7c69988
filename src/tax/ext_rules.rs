//! Validation rules over [`Extensions`].

use crate::validation::{Errors, FieldError, Rule};

use super::Extensions;

/// Every key in `keys` must be present.
pub fn require<'a>(keys: &'a [&'a str]) -> Rule<'a, Extensions> {
    Box::new(move |ext: &Extensions| {
        let mut errs = Errors::new();
        for key in keys {
            if !ext.has(key) {
                errs.add(*key, "required");
            }
        }
        errs.into_result().map_err(FieldError::Nested)
    })
}

/// When present, `key` must hold one of `codes`.
pub fn has_codes<'a>(key: &'a str, codes: &'a [&'a str]) -> Rule<'a, Extensions> {
    Box::new(move |ext: &Extensions| match ext.get(key) {
        Some(code) if !codes.contains(&code.as_str()) => {
            let mut errs = Errors::new();
            errs.add(key, format!("value '{code}' invalid"));
            Err(FieldError::Nested(errs))
        }
        _ => Ok(()),
    })
}

/// When present, `key` must not hold any of `codes`.
pub fn exclude_codes<'a>(key: &'a str, codes: &'a [&'a str]) -> Rule<'a, Extensions> {
    Box::new(move |ext: &Extensions| match ext.get(key) {
        Some(code) if codes.contains(&code.as_str()) => {
            let mut errs = Errors::new();
            errs.add(key, format!("value '{code}' not allowed"));
            Err(FieldError::Nested(errs))
        }
        _ => Ok(()),
    })
}

/// Only keys in `keys` may be present.
pub fn allow_only<'a>(keys: &'a [&'a str]) -> Rule<'a, Extensions> {
    Box::new(move |ext: &Extensions| {
        let mut errs = Errors::new();
        for key in ext.keys() {
            if !keys.contains(&key.as_str()) {
                errs.add(key.as_str(), "not allowed");
            }
        }
        errs.into_result().map_err(FieldError::Nested)
    })
}
