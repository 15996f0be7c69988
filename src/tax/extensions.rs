use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cbc::{Code, Key};
use crate::validation::{Errors, Presence, Validate};

use super::Context;

/// Map of extension keys to codes, used by regimes and addons to attach
/// jurisdiction specific data to documents and their parts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Extensions(BTreeMap<Key, Code>);

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Builder form of [`Extensions::set`].
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    /// Overwrite `key`; an empty value removes it.
    pub fn set(&mut self, key: &str, value: impl Into<Code>) {
        let value = value.into();
        if value.is_empty() {
            self.0.remove(key);
        } else {
            self.0.insert(Key::from(key), value);
        }
    }

    /// Set `key` to `value` unless it already holds one of `candidates`.
    pub fn set_one_of(&mut self, key: &str, value: &str, candidates: &[&str]) {
        if let Some(current) = self.0.get(key) {
            if candidates.contains(&current.as_str()) {
                return;
            }
        }
        self.set(key, value);
    }

    pub fn delete(&mut self, key: &str) {
        self.0.remove(key);
    }

    pub fn get(&self, key: &str) -> Option<&Code> {
        self.0.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Value of `key` equals `code`.
    pub fn is(&self, key: &str, code: &str) -> bool {
        self.get(key).is_some_and(|c| c == code)
    }

    /// Every entry of `other` is present with the same value.
    pub fn contains(&self, other: &Extensions) -> bool {
        other.0.iter().all(|(k, v)| self.0.get(k) == Some(v))
    }

    /// New map with the entries of `other` laid over this one.
    pub fn merge(&self, other: &Extensions) -> Extensions {
        let mut out = self.clone();
        for (k, v) in &other.0 {
            out.0.insert(k.clone(), v.clone());
        }
        out
    }

    /// Drop entries with empty values.
    pub fn clean(&mut self) {
        self.0.retain(|_, v| !v.is_empty());
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.0.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Code> {
        self.0.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Code)> {
        self.0.iter()
    }
}

impl Presence for Extensions {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl Validate for Extensions {
    /// Each key must be declared by the active regime or an addon, and each
    /// value must satisfy its definition.
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        let mut errs = Errors::new();
        for (key, code) in &self.0 {
            match ctx.extension_def(key) {
                None => errs.add(key.as_str(), "undefined"),
                Some(def) => {
                    if let Err(msg) = def.check(code) {
                        errs.add(key.as_str(), msg);
                    }
                }
            }
        }
        errs.into_result()
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Extensions {
    fn from(pairs: [(&str, &str); N]) -> Self {
        let mut ext = Extensions::new();
        for (k, v) in pairs {
            ext.set(k, v);
        }
        ext
    }
}
