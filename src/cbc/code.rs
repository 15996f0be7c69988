use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// An uppercase identifier such as an invoice code, series or tax code.
///
/// Codes are stored exactly as given; [`Code::normalize`] is applied by the
/// calculators to fields that are expected to be clean.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Code(String);

impl Code {
    pub const EMPTY: Code = Code(String::new());

    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Uppercase and drop everything except `A-Z`, `0-9` and `-+_/`.
    pub fn normalize(&self) -> Code {
        Code(
            self.0
                .trim()
                .chars()
                .map(|c| c.to_ascii_uppercase())
                .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '-' | '+' | '_' | '/'))
                .collect(),
        )
    }

    /// Conforms to the normalized alphabet, starting and ending with an
    /// alphanumeric character.
    pub fn is_valid(&self) -> bool {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| {
            Regex::new(r"^[A-Z0-9]([A-Z0-9\-+_/ .]*[A-Z0-9])?$").expect("valid code regex")
        });
        re.is_match(&self.0)
    }

    pub fn in_list(&self, list: &[&str]) -> bool {
        list.contains(&self.0.as_str())
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Code {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl From<String> for Code {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl PartialEq<&str> for Code {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl PartialEq<str> for Code {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl AsRef<str> for Code {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_and_uppercases() {
        assert_eq!(Code::from(" fac-2024.001 ").normalize(), "FAC-2024001");
        assert_eq!(Code::from("a b/c").normalize(), "AB/C");
        assert_eq!(Code::from("").normalize(), "");
    }

    #[test]
    fn validity() {
        assert!(Code::from("B85905495").is_valid());
        assert!(Code::from("SAMPLE-001").is_valid());
        assert!(!Code::from("-ABC").is_valid());
        assert!(!Code::from("abc").is_valid());
    }
}
