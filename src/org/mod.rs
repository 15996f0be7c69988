//! Organisational building blocks shared by every document: parties,
//! addresses, identities, inboxes, items and references to other
//! documents.

mod document_ref;
mod identity;
mod item;
mod party;
mod unit;

pub use document_ref::DocumentRef;
pub use identity::{
    IDENTITY_SCOPE_LEGAL, IDENTITY_SCOPE_TAX, Identity, Inbox, add_identity, identity_for_key, identity_for_type,
};
pub use item::{AltPrice, Item};
pub use party::{Address, Email, Party};
pub use unit::Unit;
