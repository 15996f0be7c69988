use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cbc::Code;
use crate::l10n::CountryCode;
use crate::tax::{self, Context, Extensions, Normalizers, Object, ObjectMut};
use crate::validation::{Errors, Validate, by, nested, validate_struct};

use super::{Identity, Inbox};

/// A supplier, customer or any other participant in a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Party {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Trading name when different from the legal name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alias: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<tax::Identity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identities: Vec<Identity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inboxes: Vec<Inbox>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<Address>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<Email>,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub ext: Extensions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Email {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    pub addr: String,
}

/// A postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Address {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub po_box: String,
    #[serde(default, rename = "num", skip_serializing_if = "String::is_empty")]
    pub number: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub street: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub street_extra: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub locality: String,
    /// Province, county or similar.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub region: String,
    #[serde(default, skip_serializing_if = "Code::is_empty")]
    pub state: Code,
    /// Post code.
    #[serde(default, skip_serializing_if = "Code::is_empty")]
    pub code: Code,
    #[serde(default, skip_serializing_if = "CountryCode::is_empty")]
    pub country: CountryCode,
}

impl Party {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_tax_id(mut self, id: tax::Identity) -> Self {
        self.tax_id = Some(id);
        self
    }

    /// Country of the tax ID, falling back to the first address.
    pub fn country(&self) -> Option<&CountryCode> {
        self.tax_id
            .as_ref()
            .map(|id| &id.country)
            .filter(|c| !c.is_empty())
            .or_else(|| self.addresses.first().map(|a| &a.country).filter(|c| !c.is_empty()))
    }

    pub fn normalize(&mut self, n: &Normalizers<'_>) {
        self.name = self.name.trim().to_string();
        self.alias = self.alias.trim().to_string();
        self.ext.clean();
        if let Some(id) = &mut self.tax_id {
            id.normalize(n);
        }
        n.each(ObjectMut::Party(self));
        for id in &mut self.identities {
            id.normalize(n);
        }
        for inbox in &mut self.inboxes {
            inbox.normalize(n);
        }
        for addr in &mut self.addresses {
            addr.normalize(n);
        }
        for email in &mut self.emails {
            email.addr = email.addr.trim().to_lowercase();
        }
    }
}

impl Address {
    pub fn normalize(&mut self, n: &Normalizers<'_>) {
        for field in [
            &mut self.po_box,
            &mut self.number,
            &mut self.street,
            &mut self.street_extra,
            &mut self.locality,
            &mut self.region,
        ] {
            *field = field.trim().to_string();
        }
        self.state = self.state.normalize();
        self.code = self.code.normalize();
        self.country = CountryCode::new(self.country.as_str());
        n.each(ObjectMut::Address(self));
    }
}

impl Validate for Party {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        validate_struct()
            .field("tax_id", &self.tax_id, vec![nested(ctx)])
            .field("identities", &self.identities, vec![nested(ctx)])
            .field("inboxes", &self.inboxes, vec![nested(ctx)])
            .field("addresses", &self.addresses, vec![nested(ctx)])
            .field("emails", &self.emails, vec![nested(ctx)])
            .field("ext", &self.ext, vec![nested(ctx)])
            .with(ctx.validate(Object::Party(self)))
            .finish()
    }
}

impl Validate for Email {
    fn validate_with(&self, _ctx: &Context<'_>) -> Result<(), Errors> {
        validate_struct()
            .field(
                "addr",
                &self.addr,
                vec![
                    crate::validation::required(),
                    by(|a: &String| {
                        if is_email(a) {
                            Ok(())
                        } else {
                            Err("must be a valid email address".into())
                        }
                    }),
                ],
            )
            .finish()
    }
}

impl Validate for Address {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        validate_struct()
            .field(
                "country",
                &self.country,
                vec![by(|c: &CountryCode| {
                    if c.is_empty() || c.is_valid() {
                        Ok(())
                    } else {
                        Err("must be a valid value".into())
                    }
                })],
            )
            .with(ctx.validate(Object::Address(self)))
            .finish()
    }
}

/// Loose address check: one `@` with text on both sides and a dot in the
/// domain.
pub(crate) fn is_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.contains('@') && domain.contains('.') && !s.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn country_prefers_tax_id() {
        let mut p = Party::new("Provide One S.L.").with_tax_id(tax::Identity::new("ES", "B98602642"));
        p.addresses.push(Address {
            country: CountryCode::new("FR"),
            ..Default::default()
        });
        assert_eq!(p.country().map(|c| c.as_str()), Some("ES"));
        p.tax_id = None;
        assert_eq!(p.country().map(|c| c.as_str()), Some("FR"));
    }

    #[test]
    fn email_check() {
        assert!(is_email("billing@example.com"));
        assert!(!is_email("billing@example"));
        assert!(!is_email("no at sign"));
    }

    #[test]
    fn address_json_uses_short_names() {
        let a: Address = serde_json::from_str(r#"{"num":"12","street":"Calle Mayor","region":"Álava","country":"ES"}"#).unwrap();
        assert_eq!(a.number, "12");
        assert_eq!(a.region, "Álava");
        let out = serde_json::to_value(&a).unwrap();
        assert_eq!(out["num"], "12");
        assert!(out.get("po_box").is_none());
    }
}
