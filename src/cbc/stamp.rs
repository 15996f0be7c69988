use serde::{Deserialize, Serialize};

use super::Key;

/// A value issued by a third party, typically a tax agency, identified by
/// the provider key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamp {
    #[serde(rename = "prv")]
    pub provider: Key,
    #[serde(rename = "val")]
    pub value: String,
}

impl Stamp {
    pub fn new(provider: impl Into<Key>, value: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            value: value.into(),
        }
    }
}

/// Add or replace the stamp with the same provider.
pub fn add_stamp(stamps: &mut Vec<Stamp>, stamp: Stamp) {
    match stamps.iter_mut().find(|s| s.provider == stamp.provider) {
        Some(existing) => existing.value = stamp.value,
        None => stamps.push(stamp),
    }
}

pub fn stamp_for<'a>(stamps: &'a [Stamp], provider: &Key) -> Option<&'a Stamp> {
    stamps.iter().find(|s| &s.provider == provider)
}
