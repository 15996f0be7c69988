//! Tax definitions and calculations.
//!
//! Regimes describe the categories and rate histories of a jurisdiction,
//! addons add extensions and rules on top. A [`Context`] binds the ones a
//! document uses so its parts can be normalized and validated, and the
//! [`TotalCalculator`] turns taxable lines into a per-category breakdown.

mod addon;
mod category;
mod combo;
mod context;
mod correction;
pub mod ext_rules;
mod extensions;
mod identity;
mod object;
mod regime;
mod rounding;
mod scenario;
mod tags;
mod totals;

pub use addon::AddonDef;
pub use category::{CategoryDef, RateDef, RateValueDef};
pub use combo::{Combo, Set};
pub(crate) use combo::RateScope;
pub use context::Context;
pub use correction::CorrectionDefinition;
pub use extensions::Extensions;
pub use identity::{Identity, normalize_identity_code};
pub use object::{Normalizer, Normalizers, Object, ObjectMut, Validator};
pub use regime::RegimeDef;
pub use rounding::{EXTRA_PRECISION, RoundingRule};
pub use scenario::{Scenario, ScenarioSet, ScenarioSummary};
pub use tags::*;
pub use totals::{CategoryTotal, RateTotal, RateTotalSurcharge, TaxableLine, Total, TotalCalculator};

/// Value added tax, common to every regime.
pub const CATEGORY_VAT: &str = "VAT";

pub const RATE_GENERAL: &str = "general";
pub const RATE_STANDARD: &str = "standard";
pub const RATE_INTERMEDIATE: &str = "intermediate";
pub const RATE_REDUCED: &str = "reduced";
pub const RATE_SUPER_REDUCED: &str = "super-reduced";
pub const RATE_SPECIAL: &str = "special";
/// Zero percent; assumed when a category does not define it.
pub const RATE_ZERO: &str = "zero";
/// No tax applies; assumed when a category does not define it.
pub const RATE_EXEMPT: &str = "exempt";
