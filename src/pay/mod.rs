//! Payment instructions, terms and advances.

mod advance;
mod instructions;
mod means;
mod terms;

pub use advance::Advance;
pub use instructions::{Card, CreditTransfer, DirectDebit, Instructions, Online};
pub use means::*;
pub use terms::{
    DueDate, TERM_ADVANCED, TERM_DEFERRED, TERM_DELIVERY, TERM_DUE_DATE, TERM_ELECTIVE, TERM_END_OF_MONTH,
    TERM_INSTANT, TERM_PENDING, TERM_PROXIMO, TERM_UNDEFINED, Terms, term_key_defs,
};
