use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

const DEFAULT_LANG: &str = "en";

/// Text in several languages keyed by ISO 639-1 code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct I18nString(BTreeMap<String, String>);

impl I18nString {
    pub fn en(text: impl Into<String>) -> Self {
        Self::default().with(DEFAULT_LANG, text)
    }

    pub fn with(mut self, lang: &str, text: impl Into<String>) -> Self {
        self.0.insert(lang.to_string(), text.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Text in `lang`, falling back to English and then any language.
    pub fn in_lang(&self, lang: &str) -> &str {
        self.0
            .get(lang)
            .or_else(|| self.0.get(DEFAULT_LANG))
            .or_else(|| self.0.values().next())
            .map(String::as_str)
            .unwrap_or_default()
    }
}

impl std::fmt::Display for I18nString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.in_lang(DEFAULT_LANG))
    }
}
