//! Schema identifiers and a document envelope that dispatches on them.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::bill::{Delivery, Invoice, Order, Payment, Receipt};
use crate::engine::{Engine, engine};
use crate::error::GoblError;
use crate::tax::Context;
use crate::validation::{Errors, Validate};

/// Base of every schema identifier.
pub const GOBL: &str = "https://gobl.org/draft-0/";

pub const BILL_INVOICE: &str = "bill/invoice";
pub const BILL_ORDER: &str = "bill/order";
pub const BILL_DELIVERY: &str = "bill/delivery";
pub const BILL_PAYMENT: &str = "bill/payment";
pub const BILL_RECEIPT: &str = "bill/receipt";

/// Full identifier for a short schema path such as `bill/invoice`.
pub fn id(path: &str) -> String {
    format!("{GOBL}{path}")
}

/// Short path of a full identifier; unknown prefixes are returned as is.
pub fn short(id: &str) -> &str {
    id.strip_prefix(GOBL).unwrap_or(id)
}

/// Any document that can be calculated and validated, identified by its
/// `$schema`.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Invoice(Box<Invoice>),
    Order(Box<Order>),
    Delivery(Box<Delivery>),
    Payment(Box<Payment>),
    Receipt(Box<Receipt>),
}

impl Document {
    pub fn from_json(data: &str) -> Result<Self, GoblError> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn to_json(&self) -> Result<String, GoblError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Short schema path of the document.
    pub fn schema(&self) -> &'static str {
        match self {
            Document::Invoice(_) => BILL_INVOICE,
            Document::Order(_) => BILL_ORDER,
            Document::Delivery(_) => BILL_DELIVERY,
            Document::Payment(_) => BILL_PAYMENT,
            Document::Receipt(_) => BILL_RECEIPT,
        }
    }

    pub fn calculate(&mut self) -> Result<(), GoblError> {
        self.calculate_with(engine())
    }

    pub fn calculate_with(&mut self, engine: &Engine) -> Result<(), GoblError> {
        match self {
            Document::Invoice(d) => d.calculate_with(engine),
            Document::Order(d) => d.calculate_with(engine),
            Document::Delivery(d) => d.calculate_with(engine),
            Document::Payment(d) => d.calculate_with(engine),
            Document::Receipt(d) => d.calculate_with(engine),
        }
    }

    pub fn validate(&self) -> Result<(), GoblError> {
        self.validate_using(engine())
    }

    pub fn validate_using(&self, engine: &Engine) -> Result<(), GoblError> {
        match self {
            Document::Invoice(d) => d.validate_using(engine),
            Document::Order(d) => d.validate_using(engine),
            Document::Delivery(d) => d.validate_using(engine),
            Document::Payment(d) => d.validate_using(engine),
            Document::Receipt(d) => d.validate_using(engine),
        }
    }
}

impl Validate for Document {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        match self {
            Document::Invoice(d) => d.validate_with(ctx),
            Document::Order(d) => d.validate_with(ctx),
            Document::Delivery(d) => d.validate_with(ctx),
            Document::Payment(d) => d.validate_with(ctx),
            Document::Receipt(d) => d.validate_with(ctx),
        }
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Document::Invoice(d) => d.serialize(serializer),
            Document::Order(d) => d.serialize(serializer),
            Document::Delivery(d) => d.serialize(serializer),
            Document::Payment(d) => d.serialize(serializer),
            Document::Receipt(d) => d.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let schema = value
            .get("$schema")
            .and_then(|s| s.as_str())
            .ok_or_else(|| de::Error::missing_field("$schema"))?;
        let doc = match short(schema) {
            BILL_INVOICE => serde_json::from_value(value).map(Document::Invoice),
            BILL_ORDER => serde_json::from_value(value).map(Document::Order),
            BILL_DELIVERY => serde_json::from_value(value).map(Document::Delivery),
            BILL_PAYMENT => serde_json::from_value(value).map(Document::Payment),
            BILL_RECEIPT => serde_json::from_value(value).map(Document::Receipt),
            other => return Err(de::Error::custom(format!("unknown schema '{other}'"))),
        };
        doc.map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_paths() {
        assert_eq!(id(BILL_INVOICE), "https://gobl.org/draft-0/bill/invoice");
        assert_eq!(short("https://gobl.org/draft-0/bill/order"), BILL_ORDER);
        assert_eq!(short("bill/receipt"), BILL_RECEIPT);
    }

    #[test]
    fn unknown_schema() {
        let err = Document::from_json(r#"{"$schema":"https://gobl.org/draft-0/note/message"}"#).unwrap_err();
        assert!(err.to_string().contains("unknown schema 'note/message'"));
        assert!(Document::from_json(r#"{"code":"X"}"#).is_err());
    }
}
