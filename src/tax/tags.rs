use crate::cbc::{Definition, Key};
use crate::error::GoblError;

use super::Context;

pub const TAG_SIMPLIFIED: &str = "simplified";
pub const TAG_REVERSE_CHARGE: &str = "reverse-charge";
pub const TAG_CUSTOMER_RATES: &str = "customer-rates";
pub const TAG_SELF_BILLED: &str = "self-billed";
pub const TAG_PARTIAL: &str = "partial";
pub const TAG_BYPASS: &str = "bypass";

/// Tags understood by every regime.
pub fn default_tags() -> Vec<Definition> {
    vec![
        Definition::key(TAG_SIMPLIFIED, "Simplified invoice")
            .name_in("es", "Factura simplificada")
            .desc("Invoice issued without full customer details."),
        Definition::key(TAG_REVERSE_CHARGE, "Reverse charge")
            .name_in("es", "Inversión del sujeto pasivo")
            .desc("The customer is responsible for declaring the tax."),
        Definition::key(TAG_CUSTOMER_RATES, "Customer rates")
            .desc("Apply the tax rates of the customer's country, as for EU digital goods."),
        Definition::key(TAG_SELF_BILLED, "Self-billed")
            .name_in("es", "Facturación por el destinatario")
            .desc("Invoice issued by the customer on behalf of the supplier."),
        Definition::key(TAG_PARTIAL, "Partial").desc("Partial or advance invoice."),
        Definition::key(TAG_BYPASS, "Bypass").desc("Skip addon specific processing for this document."),
    ]
}

/// Every tag must be defined by the regime, an active addon or the defaults.
pub fn check_tags(ctx: &Context<'_>, tags: &[Key]) -> Result<(), GoblError> {
    match tags.iter().find(|t| ctx.tag_def(t).is_none()) {
        Some(tag) => Err(GoblError::Tax(format!("invalid tag '{tag}'"))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tag_keys() {
        let keys: Vec<String> = default_tags().iter().map(|d| d.key.to_string()).collect();
        assert!(keys.contains(&"customer-rates".to_string()));
        assert!(keys.iter().all(|k| crate::cbc::Key::from(k.as_str()).is_valid()));
    }
}
