use std::borrow::Borrow;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Lowercase identifier for a concept, e.g. `standard`, `credit-note` or
/// `es-tbai-region`. Keys may be combined with `+` to form sub-keys
/// (`standard+eqs`).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(String);

const SEPARATOR: char = '+';

impl Key {
    pub const EMPTY: Key = Key(String::new());

    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowercase with spaces and underscores turned into hyphens.
    pub fn normalize(&self) -> Key {
        Key(self
            .0
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '_' || c.is_whitespace() { '-' } else { c })
            .collect())
    }

    pub fn is_valid(&self) -> bool {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| {
            Regex::new(r"^(?:[a-z]|[a-z0-9][a-z0-9\-.+]*[a-z0-9])$").expect("valid key regex")
        });
        re.is_match(&self.0)
    }

    /// Combine with a sub-key: `standard` with `eqs` is `standard+eqs`.
    pub fn with(&self, sub: &Key) -> Key {
        if self.is_empty() {
            return sub.clone();
        }
        Key(format!("{}{}{}", self.0, SEPARATOR, sub.0))
    }

    /// True when `sub` is one of the `+` separated parts of this key.
    pub fn has(&self, sub: &Key) -> bool {
        self.0.split(SEPARATOR).any(|part| part == sub.0)
    }

    /// First part of a compound key.
    pub fn base(&self) -> Key {
        Key(self.0.split(SEPARATOR).next().unwrap_or_default().to_string())
    }

    pub fn in_list(&self, list: &[Key]) -> bool {
        list.contains(self)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Key {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for Key {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl PartialEq<&str> for Key {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl PartialEq<str> for Key {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_keys() {
        let k = Key::from("standard").with(&Key::from("eqs"));
        assert_eq!(k, "standard+eqs");
        assert!(k.has(&Key::from("eqs")));
        assert!(!k.has(&Key::from("eq")));
        assert_eq!(k.base(), "standard");
    }

    #[test]
    fn validity() {
        assert!(Key::from("es-tbai-region").is_valid());
        assert!(Key::from("untdid-document-type").is_valid());
        assert!(Key::from("a").is_valid());
        assert!(!Key::from("Standard").is_valid());
        assert!(!Key::from("-x").is_valid());
        assert_eq!(Key::from(" Credit_Note ").normalize(), "credit-note");
    }
}
