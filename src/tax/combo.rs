use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::cbc::{Code, Key};
use crate::engine::Engine;
use crate::error::GoblError;
use crate::l10n::CountryCode;
use crate::num::Percentage;
use crate::validation::{Errors, Validate, by, empty, nested, required, validate_struct, when};

use super::{Context, Extensions, Normalizers, Object, ObjectMut, RATE_EXEMPT, RATE_ZERO, RegimeDef};

/// The tax applied to a line, discount or charge: a category, a rate key
/// resolved against the regime, and the resulting percentages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Combo {
    #[serde(rename = "cat")]
    pub category: Code,
    /// Country whose regime defines the rate, when different from the
    /// document's.
    #[serde(default, skip_serializing_if = "CountryCode::is_empty")]
    pub country: CountryCode,
    #[serde(default, skip_serializing_if = "Key::is_empty")]
    pub rate: Key,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<Percentage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surcharge: Option<Percentage>,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub ext: Extensions,
    #[serde(skip)]
    retained: bool,
}

/// What a combo needs to resolve its rate.
pub(crate) struct RateScope<'a> {
    pub engine: &'a Engine,
    pub regime: Option<&'a RegimeDef>,
    pub date: NaiveDate,
    pub tags: &'a [Key],
}

impl Combo {
    pub fn new(category: &str, rate: &str) -> Self {
        Self {
            category: Code::from(category),
            rate: Key::from(rate),
            ..Default::default()
        }
    }

    /// Combo with a fixed percentage and no rate key.
    pub fn with_percent(category: &str, percent: Percentage) -> Self {
        Self {
            category: Code::from(category),
            percent: Some(percent),
            ..Default::default()
        }
    }

    pub fn ext(mut self, ext: Extensions) -> Self {
        self.ext = ext;
        self
    }

    /// Set once the combo has been resolved against its category.
    pub fn is_retained(&self) -> bool {
        self.retained
    }

    pub fn normalize(&mut self, n: &Normalizers<'_>) {
        self.category = self.category.normalize();
        self.rate = self.rate.normalize();
        self.ext.clean();
        n.each(ObjectMut::Combo(self));
    }

    /// Resolve the percent and surcharge for the rate key on the scope's
    /// date. Combos without a rate key keep any percent they were given.
    pub(crate) fn prepare(&mut self, scope: &RateScope<'_>) -> Result<(), GoblError> {
        if scope.regime.is_some_and(|r| r.country == self.country) {
            self.country = CountryCode::default();
        }
        let regime = if self.country.is_empty() {
            scope.regime
        } else {
            scope.engine.regime_for_code(&self.country)
        };
        let Some(regime) = regime else {
            return Ok(());
        };
        let cat = regime
            .category_def(&self.category)
            .ok_or_else(|| GoblError::Tax(format!("'{}' not defined in regime", self.category)))?;
        self.retained = cat.retained;
        if self.rate.is_empty() {
            return Ok(());
        }
        let Some(rate) = cat.rate_def(&self.rate) else {
            return self.default_rate(&cat.code);
        };
        if rate.values.is_empty() {
            self.percent = None;
            self.surcharge = None;
            return Ok(());
        }
        let value = rate.value(scope.date, scope.tags, &self.ext).ok_or_else(|| {
            GoblError::Tax(format!(
                "rate value unavailable for '{}' in '{}' on '{}'",
                self.rate, self.category, scope.date
            ))
        })?;
        trace!(cat = %self.category, rate = %self.rate, percent = %value.percent, "resolved rate");
        self.percent = Some(value.percent);
        self.surcharge = value.surcharge;
        Ok(())
    }

    fn default_rate(&mut self, category: &Code) -> Result<(), GoblError> {
        if self.rate == RATE_ZERO {
            self.percent = Some(Percentage::new(0, 3));
            self.surcharge = None;
            Ok(())
        } else if self.rate == RATE_EXEMPT {
            self.percent = None;
            self.surcharge = None;
            Ok(())
        } else {
            Err(GoblError::Tax(format!(
                "'{}' rate not defined in category '{category}'",
                self.rate
            )))
        }
    }
}

impl Validate for Combo {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        let regime = if self.country.is_empty() {
            ctx.regime()
        } else {
            ctx.engine().regime_for_code(&self.country)
        };
        let cat = regime.and_then(|r| r.category_def(&self.category));
        validate_struct()
            .field(
                "cat",
                &self.category,
                vec![
                    required(),
                    when(
                        regime.is_some(),
                        vec![by(move |c: &Code| match cat {
                            Some(_) => Ok(()),
                            None => Err(format!("'{c}' not defined in regime")),
                        })],
                    ),
                ],
            )
            .field(
                "rate",
                &self.rate,
                vec![by(move |r: &Key| match cat {
                    Some(cat) if !r.is_empty() && cat.rate_def(r).is_none() && *r != RATE_ZERO && *r != RATE_EXEMPT => {
                        Err(format!("'{r}' rate not defined in category '{}'", cat.code))
                    }
                    _ => Ok(()),
                })],
            )
            .field(
                "surcharge",
                &self.surcharge,
                vec![when(self.percent.is_none(), vec![empty()])],
            )
            .field("ext", &self.ext, vec![nested(ctx)])
            .with(ctx.validate(Object::Combo(self)))
            .finish()
    }
}

/// The combos applied to one line; at most one per category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Set(Vec<Combo>);

impl Set {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn push(&mut self, combo: Combo) {
        self.0.push(combo);
    }

    pub fn get(&self, category: &Code) -> Option<&Combo> {
        self.0.iter().find(|c| &c.category == category)
    }

    pub fn get_mut(&mut self, category: &Code) -> Option<&mut Combo> {
        self.0.iter_mut().find(|c| &c.category == category)
    }

    /// Rate key used for `category`, if any.
    pub fn rate(&self, category: &Code) -> Option<&Key> {
        self.get(category).map(|c| &c.rate)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Combo> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Combo> {
        self.0.iter_mut()
    }

    pub fn normalize(&mut self, n: &Normalizers<'_>) {
        for combo in &mut self.0 {
            combo.normalize(n);
        }
    }

    pub(crate) fn prepare(&mut self, scope: &RateScope<'_>) -> Result<(), GoblError> {
        self.0.iter_mut().try_for_each(|c| c.prepare(scope))
    }
}

impl From<Vec<Combo>> for Set {
    fn from(combos: Vec<Combo>) -> Self {
        Self(combos)
    }
}

impl Validate for Set {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        let mut errs = Errors::new();
        for (i, combo) in self.0.iter().enumerate() {
            if self.0[..i].iter().any(|c| c.category == combo.category) {
                errs.add(i.to_string(), format!("category {} is duplicated", combo.category));
            }
            errs.nest(i.to_string(), combo.validate_with(ctx));
        }
        errs.into_result()
    }
}
