use serde::{Deserialize, Serialize};

use crate::num::Amount;
use crate::tax;

/// Amounts calculated for a whole document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Totals {
    /// Sum of line totals.
    pub sum: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charge: Option<Amount>,
    /// Tax already included in prices, removed from the sum.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_included: Option<Amount>,
    /// Net amount before taxes.
    pub total: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxes: Option<tax::Total>,
    pub tax: Amount,
    pub total_with_tax: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retained_tax: Option<Amount>,
    /// Adjustment added to the payable amount, usually to match a total
    /// calculated elsewhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounding: Option<Amount>,
    pub payable: Amount,
    #[serde(default, rename = "advance", skip_serializing_if = "Option::is_none")]
    pub advances: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<Amount>,
}

impl Totals {
    /// Payable amount still outstanding: `due` when advances were made.
    pub fn outstanding(&self) -> Amount {
        self.due.unwrap_or(self.payable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_field_name() {
        let t = Totals {
            payable: "10.00".parse().unwrap(),
            advances: Some("4.00".parse().unwrap()),
            due: Some("6.00".parse().unwrap()),
            ..Default::default()
        };
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["advance"], "4.00");
        assert!(json.get("discount").is_none());
        assert_eq!(t.outstanding().to_string(), "6.00");
    }
}
