//! The registry of regimes, addons and catalogues that documents are
//! calculated and validated against.
//!
//! An [`Engine`] is built once and never changes afterwards. Most callers
//! use the process-wide instance returned by [`engine()`], which carries
//! every regime and addon compiled in through Cargo features. Custom
//! definitions can be registered with [`Engine::builder`]:
//!
//! ```
//! use gobl::engine::Engine;
//! use gobl::tax::RegimeDef;
//!
//! let mut xx = RegimeDef::default();
//! xx.country = "XX".into();
//! xx.currency = "EUR".into();
//!
//! let engine = Engine::builder().defaults().regime(xx).build().unwrap();
//! assert!(engine.regime_for_code(&"XX".into()).is_some());
//! ```

use std::sync::OnceLock;

use tracing::debug;

use crate::cbc::{Definition, Key, find_key};
use crate::error::GoblError;
use crate::l10n::CountryCode;
use crate::tax::{AddonDef, RegimeDef, default_tags};
use crate::{addons, catalogues, regimes};

/// Frozen set of regime, addon and catalogue definitions.
#[derive(Debug)]
pub struct Engine {
    regimes: Vec<RegimeDef>,
    addons: Vec<AddonDef>,
    tags: Vec<Definition>,
    catalogues: Vec<Definition>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Engine with every compiled-in regime and addon.
    pub fn new() -> Self {
        Self::from_parts(regimes::all(), addons::all())
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    fn from_parts(regimes: Vec<RegimeDef>, addons: Vec<AddonDef>) -> Self {
        debug!(regimes = regimes.len(), addons = addons.len(), "engine ready");
        Self {
            regimes,
            addons,
            tags: default_tags(),
            catalogues: catalogues::extensions(),
        }
    }

    pub fn regime_for_code(&self, code: &CountryCode) -> Option<&RegimeDef> {
        self.regimes.iter().find(|r| &r.country == code)
    }

    pub fn addon_for_key(&self, key: &Key) -> Option<&AddonDef> {
        self.addons.iter().find(|a| &a.key == key)
    }

    /// Tag understood by every regime.
    pub fn default_tag(&self, key: &Key) -> Option<&Definition> {
        find_key(&self.tags, key)
    }

    pub fn all_regime_defs(&self) -> &[RegimeDef] {
        &self.regimes
    }

    pub fn all_addon_defs(&self) -> &[AddonDef] {
        &self.addons
    }

    /// Catalogue extension such as `untdid-document-type`.
    pub fn catalogue_def(&self, key: &Key) -> Option<&Definition> {
        find_key(&self.catalogues, key)
    }

    /// Extension definition from any regime, addon or catalogue.
    pub fn extension_for_key(&self, key: &Key) -> Option<&Definition> {
        self.regimes
            .iter()
            .find_map(|r| r.extension_def(key))
            .or_else(|| self.addons.iter().find_map(|a| a.extension_def(key)))
            .or_else(|| self.catalogue_def(key))
    }
}

/// Collects definitions for an [`Engine`]. Conflicts are reported when
/// building.
#[derive(Debug, Default)]
pub struct EngineBuilder {
    regimes: Vec<RegimeDef>,
    addons: Vec<AddonDef>,
}

impl EngineBuilder {
    /// Add every compiled-in regime and addon.
    pub fn defaults(mut self) -> Self {
        self.regimes.extend(regimes::all());
        self.addons.extend(addons::all());
        self
    }

    pub fn regime(mut self, def: RegimeDef) -> Self {
        self.regimes.push(def);
        self
    }

    pub fn addon(mut self, def: AddonDef) -> Self {
        self.addons.push(def);
        self
    }

    pub fn build(self) -> Result<Engine, GoblError> {
        for (i, r) in self.regimes.iter().enumerate() {
            if r.country.is_empty() {
                return Err(GoblError::Registry("regime without country code".into()));
            }
            if self.regimes[..i].iter().any(|o| o.country == r.country) {
                return Err(GoblError::Registry(format!("regime '{}' already registered", r.country)));
            }
        }
        for (i, a) in self.addons.iter().enumerate() {
            if a.key.is_empty() {
                return Err(GoblError::Registry("addon without key".into()));
            }
            if self.addons[..i].iter().any(|o| o.key == a.key) {
                return Err(GoblError::Registry(format!("addon '{}' already registered", a.key)));
            }
        }
        for a in &self.addons {
            if let Some(req) = a.requires.iter().find(|k| !self.addons.iter().any(|o| &o.key == *k)) {
                return Err(GoblError::Registry(format!(
                    "addon '{}' requires '{req}' which is not registered",
                    a.key
                )));
            }
        }
        Ok(Engine::from_parts(self.regimes, self.addons))
    }
}

/// Process-wide engine with the compiled-in definitions, built on first use.
pub fn engine() -> &'static Engine {
    static ENGINE: OnceLock<Engine> = OnceLock::new();
    ENGINE.get_or_init(Engine::new)
}
