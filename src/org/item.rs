use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cbc::{Code, Key};
use crate::currency::CurrencyCode;
use crate::l10n::CountryCode;
use crate::num::Amount;
use crate::tax::{Context, Extensions, Normalizers, Object, ObjectMut};
use crate::validation::{Errors, Validate, by, nested, required, validate_struct};

use super::{Identity, Unit};

/// The goods or services being sold on a line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Item {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    /// Seller's own reference.
    #[serde(default, rename = "ref", skip_serializing_if = "Code::is_empty")]
    pub reference: Code,
    /// Classification such as `goods` or `services`.
    #[serde(default, skip_serializing_if = "Key::is_empty")]
    pub key: Key,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identities: Vec<Identity>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub desc: String,
    /// Currency of `price` when different from the document's.
    #[serde(default, skip_serializing_if = "CurrencyCode::is_empty")]
    pub currency: CurrencyCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Amount>,
    /// Prices in other currencies.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alt_prices: Vec<AltPrice>,
    #[serde(default, skip_serializing_if = "Unit::is_empty")]
    pub unit: Unit,
    #[serde(default, skip_serializing_if = "CountryCode::is_empty")]
    pub origin: CountryCode,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub ext: Extensions,
}

/// The price of an item in another currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AltPrice {
    pub currency: CurrencyCode,
    pub value: Amount,
}

impl Item {
    pub fn new(name: &str, price: Amount) -> Self {
        Self {
            name: name.to_string(),
            price: Some(price),
            ..Default::default()
        }
    }

    /// Price in `currency`, taken from the main price or the alternatives.
    pub fn price_in(&self, currency: &CurrencyCode, document: &CurrencyCode) -> Option<Amount> {
        let own = if self.currency.is_empty() { document } else { &self.currency };
        if own == currency {
            return self.price;
        }
        self.alt_prices.iter().find(|p| &p.currency == currency).map(|p| p.value)
    }

    pub fn normalize(&mut self, n: &Normalizers<'_>) {
        self.name = self.name.trim().to_string();
        self.reference = self.reference.normalize();
        self.key = self.key.normalize();
        self.ext.clean();
        for id in &mut self.identities {
            id.normalize(n);
        }
        n.each(ObjectMut::Item(self));
    }
}

impl Validate for Item {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        validate_struct()
            .field("name", &self.name, vec![required()])
            .field("identities", &self.identities, vec![nested(ctx)])
            .field(
                "currency",
                &self.currency,
                vec![by(|c: &CurrencyCode| {
                    if c.is_empty() || c.def().is_some() {
                        Ok(())
                    } else {
                        Err("must be a valid value".into())
                    }
                })],
            )
            .field(
                "unit",
                &self.unit,
                vec![by(|u: &Unit| if u.is_valid() { Ok(()) } else { Err("must be a valid value".into()) })],
            )
            .field("ext", &self.ext, vec![nested(ctx)])
            .with(ctx.validate(Object::Item(self)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::engine;

    fn amt(s: &str) -> Amount {
        s.parse().unwrap()
    }

    #[test]
    fn price_in_other_currency() {
        let mut item = Item::new("Widget", amt("10.00"));
        item.currency = CurrencyCode::new("USD");
        item.alt_prices.push(AltPrice {
            currency: CurrencyCode::new("EUR"),
            value: amt("9.20"),
        });
        let eur = CurrencyCode::new("EUR");
        let usd = CurrencyCode::new("USD");
        assert_eq!(item.price_in(&eur, &eur), Some(amt("9.20")));
        assert_eq!(item.price_in(&usd, &eur), Some(amt("10.00")));
        assert_eq!(item.price_in(&CurrencyCode::new("GBP"), &eur), None);
    }

    #[test]
    fn name_required() {
        let ctx = crate::tax::Context::empty(engine());
        let err = Item::default().validate_with(&ctx).unwrap_err();
        assert_eq!(err.message("name"), Some("cannot be blank"));
    }

    #[test]
    fn json_ref_field() {
        let item: Item = serde_json::from_str(r#"{"ref":"SKU-1","name":"Widget","price":"10.00","unit":"h"}"#).unwrap();
        assert_eq!(item.reference, "SKU-1");
        assert_eq!(item.unit.unece(), Some("HUR"));
    }
}
