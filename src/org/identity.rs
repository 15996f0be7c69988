use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cbc::{Code, Key};
use crate::l10n::CountryCode;
use crate::tax::{Context, Extensions, Normalizers, Object, ObjectMut};
use crate::validation::{Errors, Validate, by, nested, required, validate_struct};

use super::party::is_email;

pub const IDENTITY_SCOPE_LEGAL: &str = "legal";
pub const IDENTITY_SCOPE_TAX: &str = "tax";

/// A non-tax identification code such as a company registration number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Identity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(default, skip_serializing_if = "CountryCode::is_empty")]
    pub country: CountryCode,
    #[serde(default, skip_serializing_if = "Key::is_empty")]
    pub key: Key,
    #[serde(default, rename = "type", skip_serializing_if = "Code::is_empty")]
    pub kind: Code,
    /// What the identity is used for, e.g. `legal` or `tax`.
    #[serde(default, skip_serializing_if = "Key::is_empty")]
    pub scope: Key,
    pub code: Code,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub desc: String,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub ext: Extensions,
}

impl Identity {
    pub fn new(kind: &str, code: &str) -> Self {
        Self {
            kind: Code::from(kind),
            code: Code::from(code),
            ..Default::default()
        }
    }

    pub fn with_key(key: &str, code: &str) -> Self {
        Self {
            key: Key::from(key),
            code: Code::from(code),
            ..Default::default()
        }
    }

    pub fn scope(mut self, scope: &str) -> Self {
        self.scope = Key::from(scope);
        self
    }

    pub fn normalize(&mut self, n: &Normalizers<'_>) {
        self.code = self.code.normalize();
        self.kind = self.kind.normalize();
        self.ext.clean();
        n.each(ObjectMut::Identity(self));
    }
}

impl Validate for Identity {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        validate_struct()
            .field("code", &self.code, vec![required()])
            .field("ext", &self.ext, vec![nested(ctx)])
            .with(ctx.validate(Object::Identity(self)))
            .finish()
    }
}

/// First identity with the given type code.
pub fn identity_for_type<'a>(identities: &'a [Identity], kind: &str) -> Option<&'a Identity> {
    identities.iter().find(|id| id.kind == kind)
}

/// First identity with the given key.
pub fn identity_for_key<'a>(identities: &'a [Identity], key: &str) -> Option<&'a Identity> {
    identities.iter().find(|id| id.key == key)
}

/// Add `id`, replacing any existing identity of the same type or key.
pub fn add_identity(identities: &mut Vec<Identity>, id: Identity) {
    let existing = identities.iter_mut().find(|i| {
        (!id.kind.is_empty() && i.kind == id.kind) || (!id.key.is_empty() && i.key == id.key)
    });
    match existing {
        Some(slot) => *slot = id,
        None => identities.push(id),
    }
}

/// An electronic address where documents may be delivered, such as a
/// Peppol participant ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Inbox {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(default, skip_serializing_if = "Key::is_empty")]
    pub key: Key,
    /// ISO 6523 or similar scheme identifying the code's format.
    #[serde(default, skip_serializing_if = "Code::is_empty")]
    pub scheme: Code,
    #[serde(default, skip_serializing_if = "Code::is_empty")]
    pub code: Code,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub ext: Extensions,
}

impl Inbox {
    pub fn new(scheme: &str, code: &str) -> Self {
        Self {
            scheme: Code::from(scheme),
            code: Code::from(code),
            ..Default::default()
        }
    }

    /// Move a URL or email address written in the code field to its own
    /// field.
    pub fn normalize(&mut self, n: &Normalizers<'_>) {
        let raw = self.code.as_str().trim().to_string();
        if !raw.is_empty() {
            if raw.starts_with("http://") || raw.starts_with("https://") {
                if self.url.is_empty() {
                    self.url = raw;
                }
                self.code = Code::EMPTY;
            } else if is_email(&raw) {
                if self.email.is_empty() {
                    self.email = raw.to_lowercase();
                }
                self.code = Code::EMPTY;
            }
        }
        self.scheme = self.scheme.normalize();
        self.email = self.email.trim().to_string();
        self.url = self.url.trim().to_string();
        self.ext.clean();
        n.each(ObjectMut::Inbox(self));
    }
}

impl Validate for Inbox {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        let has_alt = !self.url.is_empty() || !self.email.is_empty();
        validate_struct()
            .field(
                "code",
                &self.code,
                vec![by(move |c: &Code| {
                    if c.is_empty() && !has_alt {
                        Err("cannot be blank without url or email".into())
                    } else {
                        Ok(())
                    }
                })],
            )
            .field(
                "email",
                &self.email,
                vec![by(|e: &String| {
                    if e.is_empty() || is_email(e) {
                        Ok(())
                    } else {
                        Err("must be a valid email address".into())
                    }
                })],
            )
            .field("ext", &self.ext, vec![nested(ctx)])
            .with(ctx.validate(Object::Inbox(self)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::engine;

    #[test]
    fn add_identity_replaces_same_type() {
        let mut ids = vec![Identity::new("SIREN", "356000000")];
        add_identity(&mut ids, Identity::new("SIREN", "732829320"));
        add_identity(&mut ids, Identity::new("SIRET", "73282932000074"));
        assert_eq!(ids.len(), 2);
        assert_eq!(identity_for_type(&ids, "SIREN").unwrap().code, "732829320");
        assert!(identity_for_key(&ids, "fr-siren").is_none());
    }

    #[test]
    fn inbox_moves_email_out_of_code() {
        let ctx = Context::empty(engine());
        let mut inbox = Inbox::new("", "Billing@Example.com");
        inbox.normalize(&ctx.normalizers());
        assert!(inbox.code.is_empty());
        assert_eq!(inbox.email, "billing@example.com");
        assert!(inbox.validate_with(&ctx).is_ok());

        let mut inbox = Inbox::new("", "https://example.com/inbox");
        inbox.normalize(&ctx.normalizers());
        assert_eq!(inbox.url, "https://example.com/inbox");
    }

    #[test]
    fn inbox_needs_some_address() {
        let ctx = Context::empty(engine());
        let err = Inbox::default().validate_with(&ctx).unwrap_err();
        assert_eq!(err.message("code"), Some("cannot be blank without url or email"));
    }

    #[test]
    fn identity_type_json_name() {
        let id: Identity = serde_json::from_str(r#"{"type":"SIREN","code":"356000000","scope":"legal"}"#).unwrap();
        assert_eq!(id.kind, "SIREN");
        assert_eq!(id.scope, IDENTITY_SCOPE_LEGAL);
    }
}
