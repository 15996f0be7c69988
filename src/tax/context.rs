use chrono::{NaiveDate, NaiveTime, Timelike, Utc};
use tracing::warn;

use crate::cbc::{Definition, Key};
use crate::engine::Engine;
use crate::error::GoblError;
use crate::l10n::CountryCode;
use crate::validation::Errors;

use super::{AddonDef, CorrectionDefinition, Normalizers, Object, RegimeDef, RoundingRule, ScenarioSet};

/// The regime and addons active for one document.
#[derive(Debug, Clone)]
pub struct Context<'a> {
    engine: &'a Engine,
    regime: Option<&'a RegimeDef>,
    addons: Vec<&'a AddonDef>,
}

impl<'a> Context<'a> {
    /// Resolve the regime and addons by code and key. Addon requirements
    /// are added ahead of the addons that need them.
    pub fn new(engine: &'a Engine, regime: Option<&CountryCode>, addons: &[Key]) -> Result<Self, GoblError> {
        let regime = match regime.filter(|c| !c.is_empty()) {
            Some(code) => Some(
                engine
                    .regime_for_code(code)
                    .ok_or_else(|| GoblError::Registry(format!("regime '{code}' not registered")))?,
            ),
            None => None,
        };
        let mut resolved = Vec::new();
        let mut visiting = Vec::new();
        resolve_addons(engine, addons, addons, &mut resolved, &mut visiting)?;
        Ok(Self {
            engine,
            regime,
            addons: resolved,
        })
    }

    /// Context with no regime or addons.
    pub fn empty(engine: &'a Engine) -> Self {
        Self {
            engine,
            regime: None,
            addons: Vec::new(),
        }
    }

    pub fn engine(&self) -> &'a Engine {
        self.engine
    }

    pub fn regime(&self) -> Option<&'a RegimeDef> {
        self.regime
    }

    pub fn addons(&self) -> &[&'a AddonDef] {
        &self.addons
    }

    pub fn addon_keys(&self) -> Vec<Key> {
        self.addons.iter().map(|a| a.key.clone()).collect()
    }

    pub fn has_addon(&self, key: &str) -> bool {
        self.addons.iter().any(|a| a.key == key)
    }

    pub fn normalizers(&self) -> Normalizers<'a> {
        Normalizers::new(
            self.engine,
            self.regime.and_then(|r| r.normalizer),
            self.addons.iter().filter_map(|a| a.normalizer).collect(),
        )
    }

    /// Run the regime and addon validators over `obj`, collecting every
    /// error. Tax identities are checked by the regime of their own country.
    pub fn validate(&self, obj: Object<'_>) -> Result<(), Errors> {
        let regime = match obj {
            Object::TaxIdentity(id) if !id.country.is_empty() => self.engine.regime_for_code(&id.country),
            _ => self.regime,
        };
        let mut errs = Errors::new();
        let validators = regime
            .and_then(|r| r.validator)
            .into_iter()
            .chain(self.addons.iter().filter_map(|a| a.validator));
        for v in validators {
            if let Err(e) = v(obj) {
                errs.merge(e);
            }
        }
        errs.into_result()
    }

    /// Extension definition from the regime, any active addon or the
    /// shared catalogues.
    pub fn extension_def(&self, key: &Key) -> Option<&'a Definition> {
        self.regime
            .and_then(|r| r.extension_def(key))
            .or_else(|| self.addons.iter().find_map(|a| a.extension_def(key)))
            .or_else(|| self.engine.catalogue_def(key))
    }

    /// Tag definition from the regime, the addons or the defaults.
    pub fn tag_def(&self, key: &Key) -> Option<&'a Definition> {
        self.regime
            .and_then(|r| r.tag_def(key))
            .or_else(|| self.addons.iter().find_map(|a| a.tag_def(key)))
            .or_else(|| self.engine.default_tag(key))
    }

    pub fn scenario_sets(&self, schema: &str) -> Vec<&'a ScenarioSet> {
        self.regime
            .and_then(|r| r.scenario_set(schema))
            .into_iter()
            .chain(self.addons.iter().filter_map(|a| a.scenario_set(schema)))
            .collect()
    }

    /// Correction rules of the regime merged with those of the addons.
    pub fn correction_definition(&self, schema: &'static str) -> CorrectionDefinition {
        let base = CorrectionDefinition::new(schema);
        self.regime
            .and_then(|r| r.correction_definition(schema))
            .into_iter()
            .chain(self.addons.iter().filter_map(|a| a.correction_definition(schema)))
            .fold(base, |acc, cd| acc.merge(cd))
    }

    /// Default rounding rule of the regime.
    pub fn rounding(&self) -> RoundingRule {
        self.regime.map(|r| r.rounding).unwrap_or_default()
    }

    pub fn today(&self) -> NaiveDate {
        match self.regime {
            Some(r) => r.today(),
            None => Utc::now().date_naive(),
        }
    }

    /// Current time to the second, in the regime's time zone.
    pub fn now_time(&self) -> NaiveTime {
        match self.regime {
            Some(r) => r.now_time(),
            None => {
                let now = Utc::now().time();
                NaiveTime::from_num_seconds_from_midnight_opt(now.num_seconds_from_midnight(), 0).unwrap_or(now)
            }
        }
    }
}

fn resolve_addons<'a>(
    engine: &'a Engine,
    declared: &[Key],
    keys: &[Key],
    out: &mut Vec<&'a AddonDef>,
    visiting: &mut Vec<Key>,
) -> Result<(), GoblError> {
    for key in keys {
        if out.iter().any(|a| &a.key == key) || visiting.contains(key) {
            continue;
        }
        let def = engine
            .addon_for_key(key)
            .ok_or_else(|| GoblError::Registry(format!("addon '{key}' not registered")))?;
        visiting.push(key.clone());
        resolve_addons(engine, declared, &def.requires, out, visiting)?;
        visiting.pop();
        if !declared.contains(key) {
            warn!(addon = %key, "adding required addon");
        }
        out.push(def);
    }
    Ok(())
}
