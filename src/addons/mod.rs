//! Addons compiled into the crate. Each one contributes extensions,
//! normalizers and validators on top of a regime.

#[cfg(feature = "es")]
pub mod es_tbai;
#[cfg(feature = "en16931")]
pub mod eu_en16931;
#[cfg(feature = "fr")]
pub mod fr_choruspro;
#[cfg(feature = "fr")]
pub mod fr_ctc;

use crate::tax::AddonDef;

/// Every addon enabled by crate features.
#[allow(clippy::vec_init_then_push)]
pub fn all() -> Vec<AddonDef> {
    #[allow(unused_mut)]
    let mut list = Vec::new();
    #[cfg(feature = "es")]
    list.push(es_tbai::new());
    #[cfg(feature = "en16931")]
    list.push(eu_en16931::new());
    #[cfg(feature = "fr")]
    list.push(fr_choruspro::new());
    #[cfg(feature = "fr")]
    list.push(fr_ctc::new());
    list
}
