//! Tax regimes compiled into the crate, one module per country.

#[cfg(feature = "es")]
pub mod es;
#[cfg(feature = "fr")]
pub mod fr;

use crate::tax::RegimeDef;

/// Every regime enabled by crate features.
#[allow(clippy::vec_init_then_push)]
pub fn all() -> Vec<RegimeDef> {
    #[allow(unused_mut)]
    let mut list = Vec::new();
    #[cfg(feature = "es")]
    list.push(es::new());
    #[cfg(feature = "fr")]
    list.push(fr::new());
    list
}
