//! Common basic components shared by every document: codes, keys,
//! definitions with localised names, and stamps.

mod code;
mod definition;
mod i18n;
mod key;
mod note;
mod stamp;

pub use code::Code;
pub use definition::{Definition, Pattern};
pub(crate) use definition::find_key;
pub use i18n::I18nString;
pub use key::Key;
pub use note::{NOTE_GENERAL, NOTE_KEYS, NOTE_LEGAL, NOTE_PAYMENT, NOTE_REASON, Note};
pub use stamp::{Stamp, add_stamp, stamp_for};
