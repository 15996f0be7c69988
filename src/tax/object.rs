use crate::bill;
use crate::cbc::Note;
use crate::engine::Engine;
use crate::org;
use crate::pay;

use super::{Combo, Identity};

macro_rules! objects {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        /// Borrowed view of any part of a document, handed to validators.
        #[derive(Debug, Clone, Copy)]
        pub enum Object<'a> {
            $($variant(&'a $ty)),*
        }

        /// Mutable view of any part of a document, handed to normalizers.
        #[derive(Debug)]
        pub enum ObjectMut<'a> {
            $($variant(&'a mut $ty)),*
        }

        impl ObjectMut<'_> {
            /// Shorter-lived copy of the same view.
            pub fn reborrow(&mut self) -> ObjectMut<'_> {
                match self {
                    $(ObjectMut::$variant(x) => ObjectMut::$variant(&mut **x)),*
                }
            }
        }
    };
}

objects! {
    Invoice => bill::Invoice,
    Order => bill::Order,
    Delivery => bill::Delivery,
    Payment => bill::Payment,
    Receipt => bill::Receipt,
    BillTax => bill::Tax,
    Line => bill::Line,
    LineDiscount => bill::LineDiscount,
    LineCharge => bill::LineCharge,
    Discount => bill::Discount,
    Charge => bill::Charge,
    PaymentDetails => bill::PaymentDetails,
    Combo => Combo,
    TaxIdentity => Identity,
    Party => org::Party,
    Identity => org::Identity,
    Inbox => org::Inbox,
    Address => org::Address,
    Item => org::Item,
    DocumentRef => org::DocumentRef,
    Note => Note,
    PayInstructions => pay::Instructions,
    PayTerms => pay::Terms,
    PayAdvance => pay::Advance,
}

/// Normalizer contributed by a regime or addon.
pub type Normalizer = fn(ObjectMut<'_>);

/// Validator contributed by a regime or addon.
pub type Validator = fn(Object<'_>) -> Result<(), crate::validation::Errors>;

/// The normalizers of the active regime and addons, applied in that order
/// to every part of a document.
///
/// Tax identities are normalized by the regime of their own country rather
/// than the document's.
#[derive(Debug, Clone)]
pub struct Normalizers<'a> {
    engine: &'a Engine,
    regime: Option<Normalizer>,
    addons: Vec<Normalizer>,
}

impl<'a> Normalizers<'a> {
    pub(crate) fn new(engine: &'a Engine, regime: Option<Normalizer>, addons: Vec<Normalizer>) -> Self {
        Self { engine, regime, addons }
    }

    pub fn each(&self, mut obj: ObjectMut<'_>) {
        let regime = match &obj {
            ObjectMut::TaxIdentity(id) if !id.country.is_empty() => self
                .engine
                .regime_for_code(&id.country)
                .and_then(|r| r.normalizer),
            _ => self.regime,
        };
        for n in regime.iter().chain(self.addons.iter()) {
            n(obj.reborrow());
        }
    }
}
