use regex::Regex;
use serde::{Serialize, Serializer};
use tracing::warn;

use super::{Code, I18nString, Key};

/// Compiled regular expression that serializes as its source text.
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    /// Compile `src`; invalid patterns are logged and dropped.
    pub fn new(src: &str) -> Option<Self> {
        match Regex::new(src) {
            Ok(re) => Some(Self(re)),
            Err(err) => {
                warn!(pattern = src, error = %err, "ignoring invalid definition pattern");
                None
            }
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0.as_str())
    }
}

/// Describes a key or code together with the values it may take.
///
/// Used for tax categories, tags, extensions and catalogues alike: an
/// extension definition has a `key`, a list of `values` each identified by a
/// `code`, and optionally a `pattern` that free-form values must match.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Definition {
    #[serde(skip_serializing_if = "Key::is_empty")]
    pub key: Key,
    #[serde(skip_serializing_if = "Code::is_empty")]
    pub code: Code,
    pub name: I18nString,
    #[serde(skip_serializing_if = "I18nString::is_empty")]
    pub desc: I18nString,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Pattern>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Definition>,
}

impl Definition {
    /// Definition identified by key with an English name.
    pub fn key(key: &str, name: &str) -> Self {
        Self {
            key: Key::from(key),
            name: I18nString::en(name),
            ..Default::default()
        }
    }

    /// Definition identified by code with an English name.
    pub fn code(code: &str, name: &str) -> Self {
        Self {
            code: Code::from(code),
            name: I18nString::en(name),
            ..Default::default()
        }
    }

    pub fn name_in(mut self, lang: &str, text: &str) -> Self {
        self.name = self.name.with(lang, text);
        self
    }

    pub fn desc(mut self, text: &str) -> Self {
        self.desc = I18nString::en(text);
        self
    }

    pub fn pattern(mut self, src: &str) -> Self {
        self.pattern = Pattern::new(src);
        self
    }

    pub fn values(mut self, values: Vec<Definition>) -> Self {
        self.values = values;
        self
    }

    pub fn code_def(&self, code: &Code) -> Option<&Definition> {
        self.values.iter().find(|v| &v.code == code)
    }

    pub fn key_def(&self, key: &Key) -> Option<&Definition> {
        self.values.iter().find(|v| &v.key == key)
    }

    pub fn has_code(&self, code: &Code) -> bool {
        self.code_def(code).is_some()
    }

    /// Check a value against the listed codes or the pattern. Definitions
    /// with neither accept anything.
    pub fn check(&self, code: &Code) -> Result<(), String> {
        if !self.values.is_empty() {
            if self.has_code(code) {
                return Ok(());
            }
            return Err(format!("value '{code}' invalid"));
        }
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(code.as_str()) {
                return Err(format!("value '{code}' does not match pattern"));
            }
        }
        Ok(())
    }
}

/// Find a definition by key in a list.
pub(crate) fn find_key<'a>(defs: &'a [Definition], key: &Key) -> Option<&'a Definition> {
    defs.iter().find(|d| &d.key == key)
}
