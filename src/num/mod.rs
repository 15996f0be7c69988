//! Fixed-point amounts and percentages.
//!
//! All monetary values use [`rust_decimal::Decimal`] underneath; the decimal
//! scale doubles as the amount's exponent so `"10.00"` and `"10.0000"` keep
//! their precision through serialization. Floating point is never used.

mod amount;
mod percentage;

pub use amount::*;
pub use percentage::*;

use thiserror::Error;

/// Largest exponent an amount can carry.
pub const MAX_EXP: u32 = 28;

/// Error returned when parsing an amount or percentage from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Input is not a decimal number.
    #[error("invalid amount '{0}'")]
    Amount(String),
    /// Input is not a percentage such as `"21%"` or `"0.21"`.
    #[error("invalid percentage '{0}'")]
    Percentage(String),
}
