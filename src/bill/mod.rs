//! Billing documents and the calculations they share.
//!
//! [`Invoice`], [`Order`] and [`Delivery`] are priced with lines, discounts
//! and charges, and run through the same calculator. [`Payment`] and
//! [`Receipt`] settle other documents and only sum their own lines.

mod builder;
mod calculator;
mod charge;
mod convert;
mod correct;
mod delivery;
mod delivery_details;
mod discount;
mod invoice;
mod line;
mod order;
mod ordering;
mod payment;
mod payment_details;
mod receipt;
mod tax;
mod totals;

pub use builder::{InvoiceBuilder, LineBuilder};
pub use charge::*;
pub use correct::CorrectionOptions;
pub use delivery::{Delivery, DeliveryType, Tracking};
pub use delivery_details::DeliveryDetails;
pub use discount::*;
pub use invoice::{Invoice, InvoiceType};
pub use line::{Line, SubLine};
pub use order::{Order, OrderType};
pub use ordering::{Ordering, Period};
pub use payment::{Payment, PaymentLine, PaymentType};
pub use payment_details::PaymentDetails;
pub use receipt::{Receipt, ReceiptLine, ReceiptType};
pub use tax::Tax;
pub use totals::Totals;
