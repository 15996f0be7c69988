//! # gobl
//!
//! Business documents with tax regimes and addons: invoices, orders,
//! deliveries, payments and receipts that calculate their own totals,
//! normalize themselves against the rules of a country, and validate the
//! result.
//!
//! All monetary values use [`rust_decimal::Decimal`] underneath, never
//! floating point. Amounts keep the precision they were given with and are
//! rounded to the currency only where totals require it.
//!
//! ## Quick Start
//!
//! ```rust
//! use gobl::bill::{InvoiceBuilder, LineBuilder};
//! use gobl::org::Party;
//! use gobl::tax::Identity;
//!
//! let inv = InvoiceBuilder::new("SAMPLE", "001")
//!     .currency("EUR")
//!     .supplier(Party::new("Provide One S.L.").with_tax_id(Identity::new("ES", "B98602642")))
//!     .add_line(LineBuilder::new("Development services", "10", "100.00").tax("VAT", "standard").build())
//!     .build_unchecked()
//!     .unwrap();
//!
//! let totals = inv.totals.unwrap();
//! assert_eq!(totals.tax.to_string(), "210.00");
//! assert_eq!(totals.payable.to_string(), "1210.00");
//! ```
//!
//! Documents arriving as JSON are dispatched on their `$schema`:
//!
//! ```rust
//! use gobl::schema::Document;
//!
//! let mut doc = Document::from_json(r#"{
//!     "$schema": "https://gobl.org/draft-0/bill/invoice",
//!     "series": "SAMPLE",
//!     "code": "002",
//!     "currency": "EUR",
//!     "supplier": {"name": "Provide One S.L.", "tax_id": {"country": "ES", "code": "B98602642"}},
//!     "lines": [{"quantity": "1", "item": {"name": "Hosting", "price": "50.00"}, "taxes": [{"cat": "VAT", "rate": "standard"}]}]
//! }"#).unwrap();
//! doc.calculate().unwrap();
//! assert_eq!(doc.schema(), "bill/invoice");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `es` (default) | Spanish regime and the TicketBAI addon |
//! | `fr` (default) | French regime, Chorus Pro and CTC addons |
//! | `en16931` | EN 16931 semantic model addon, pulled in by `fr` |
//! | `all` | Everything |

pub mod addons;
pub mod bill;
pub mod catalogues;
pub mod cbc;
pub mod currency;
pub mod engine;
pub mod error;
pub mod l10n;
pub mod num;
pub mod org;
pub mod pay;
pub mod regimes;
pub mod schema;
pub mod tax;
pub mod validation;

pub use engine::{Engine, engine};
pub use error::GoblError;
pub use schema::Document;
