use crate::cbc::{Definition, I18nString, Key, find_key};

use super::{CorrectionDefinition, Normalizer, ScenarioSet, Validator};

/// A horizontally composable set of rules, typically for an e-invoicing
/// format, that may be enabled on any document alongside its regime.
#[derive(Debug, Clone, Default)]
pub struct AddonDef {
    /// Versioned key such as `es-tbai-v1`.
    pub key: Key,
    /// Addons that must be active whenever this one is.
    pub requires: Vec<Key>,
    pub name: I18nString,
    pub extensions: Vec<Definition>,
    pub tags: Vec<Definition>,
    pub scenarios: Vec<ScenarioSet>,
    pub corrections: Vec<CorrectionDefinition>,
    pub normalizer: Option<Normalizer>,
    pub validator: Option<Validator>,
}

impl AddonDef {
    pub fn extension_def(&self, key: &Key) -> Option<&Definition> {
        find_key(&self.extensions, key)
    }

    pub fn tag_def(&self, key: &Key) -> Option<&Definition> {
        find_key(&self.tags, key)
    }

    pub fn scenario_set(&self, schema: &str) -> Option<&ScenarioSet> {
        self.scenarios.iter().find(|s| s.schema == schema)
    }

    pub fn correction_definition(&self, schema: &str) -> Option<&CorrectionDefinition> {
        self.corrections.iter().find(|c| c.schema == schema)
    }
}
