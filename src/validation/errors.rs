use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;

use serde::Serialize;

/// The failure of one field: either a message or the errors of a nested
/// object or collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldError {
    Message(String),
    Nested(Errors),
}

impl FieldError {
    pub fn msg(text: impl Into<String>) -> Self {
        FieldError::Message(text.into())
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::Message(m) => f.write_str(m),
            FieldError::Nested(errs) => write!(f, "({errs})"),
        }
    }
}

impl From<Errors> for FieldError {
    fn from(errs: Errors) -> Self {
        FieldError::Nested(errs)
    }
}

/// Tree of validation errors keyed by field name or collection index.
///
/// Inserting into a field that already failed keeps the first message;
/// nested trees for the same field are merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Errors(BTreeMap<String, FieldError>);

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn insert(&mut self, field: impl Into<String>, err: FieldError) {
        match self.0.entry(field.into()) {
            Entry::Vacant(slot) => {
                slot.insert(err);
            }
            Entry::Occupied(mut slot) => {
                if let (FieldError::Nested(existing), FieldError::Nested(new)) = (slot.get_mut(), err) {
                    existing.merge(new);
                }
            }
        }
    }

    /// Record a message for `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.insert(field, FieldError::msg(message));
    }

    /// Record the errors of a nested object under `field`, if any.
    pub fn nest(&mut self, field: impl Into<String>, result: Result<(), Errors>) {
        if let Err(errs) = result {
            if !errs.is_empty() {
                self.insert(field, FieldError::Nested(errs));
            }
        }
    }

    pub fn merge(&mut self, other: Errors) {
        for (field, err) in other.0 {
            self.insert(field, err);
        }
    }

    /// Look up an error by dotted path, e.g. `lines.0.taxes`.
    pub fn get(&self, path: &str) -> Option<&FieldError> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.0.get(first)?;
        for part in parts {
            match current {
                FieldError::Nested(errs) => current = errs.0.get(part)?,
                FieldError::Message(_) => return None,
            }
        }
        Some(current)
    }

    /// Message at a dotted path, when that path holds a message.
    pub fn message(&self, path: &str) -> Option<&str> {
        match self.get(path)? {
            FieldError::Message(m) => Some(m),
            FieldError::Nested(_) => None,
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldError)> {
        self.0.iter()
    }

    pub fn into_result(self) -> Result<(), Errors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Every message with its dotted field path.
    pub fn flatten(&self) -> Vec<ValidationError> {
        let mut out = Vec::new();
        self.flatten_into("", &mut out);
        out
    }

    fn flatten_into(&self, prefix: &str, out: &mut Vec<ValidationError>) {
        for (field, err) in &self.0 {
            let path = if prefix.is_empty() {
                field.clone()
            } else {
                format!("{prefix}.{field}")
            };
            match err {
                FieldError::Message(m) => out.push(ValidationError::new(path, m.clone())),
                FieldError::Nested(errs) => errs.flatten_into(&path, out),
            }
        }
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, err)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {err}")?;
        }
        f.write_str(".")
    }
}

impl std::error::Error for Errors {}

/// A single validation error with field path and message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Dot-separated path to the invalid field (e.g. "supplier.tax_id.code").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
