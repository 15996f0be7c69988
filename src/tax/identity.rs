use serde::{Deserialize, Serialize};

use crate::cbc::Code;
use crate::l10n::CountryCode;
use crate::validation::{Errors, Validate, by, required, validate_struct};

use super::{Context, Normalizers, Object, ObjectMut};

/// A tax identification number together with the country that issued it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Identity {
    pub country: CountryCode,
    #[serde(default, skip_serializing_if = "Code::is_empty")]
    pub code: Code,
}

impl Identity {
    pub fn new(country: &str, code: &str) -> Self {
        Self {
            country: CountryCode::new(country),
            code: Code::from(code),
        }
    }

    /// Clean the code and apply the issuing country's normalizer.
    pub fn normalize(&mut self, n: &Normalizers<'_>) {
        self.country = CountryCode::new(self.country.as_str());
        self.code = normalize_identity_code(&self.code, &self.country);
        n.each(ObjectMut::TaxIdentity(self));
    }
}

/// Uppercase, keep only letters and digits, and drop a leading country
/// prefix (`EL` is accepted for Greece).
pub fn normalize_identity_code(code: &Code, country: &CountryCode) -> Code {
    let mut clean: String = code
        .as_str()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    let prefixes: &[&str] = if country == &"GR" {
        &["GR", "EL"]
    } else {
        &[country.as_str()]
    };
    for prefix in prefixes {
        if !prefix.is_empty() && clean.len() > prefix.len() && clean.starts_with(prefix) {
            clean.drain(..prefix.len());
            break;
        }
    }
    Code::from(clean)
}

impl Validate for Identity {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        validate_struct()
            .field(
                "country",
                &self.country,
                vec![
                    required(),
                    by(|c: &CountryCode| if c.is_valid() { Ok(()) } else { Err("must be a valid value".into()) }),
                ],
            )
            .with(ctx.validate(Object::TaxIdentity(self)))
            .finish()
    }
}
