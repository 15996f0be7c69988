use crate::cbc::{Definition, Key};

pub const MEANS_ANY: &str = "any";
pub const MEANS_CARD: &str = "card";
pub const MEANS_CREDIT_TRANSFER: &str = "credit-transfer";
pub const MEANS_DEBIT_TRANSFER: &str = "debit-transfer";
pub const MEANS_CASH: &str = "cash";
pub const MEANS_CHEQUE: &str = "cheque";
pub const MEANS_BANK_DRAFT: &str = "bank-draft";
pub const MEANS_DIRECT_DEBIT: &str = "direct-debit";
pub const MEANS_ONLINE: &str = "online";
pub const MEANS_PROMISSORY_NOTE: &str = "promissory-note";
pub const MEANS_NETTING: &str = "netting";
pub const MEANS_OTHER: &str = "other";

/// Payment means keys with their UNTDID 4461 code.
static MEANS: &[(&str, &str, &str)] = &[
    (MEANS_ANY, "Any", "1"),
    (MEANS_CARD, "Card", "48"),
    (MEANS_CREDIT_TRANSFER, "Credit Transfer", "30"),
    (MEANS_DEBIT_TRANSFER, "Debit Transfer", "31"),
    (MEANS_CASH, "Cash", "10"),
    (MEANS_CHEQUE, "Cheque", "20"),
    (MEANS_BANK_DRAFT, "Draft", "21"),
    (MEANS_DIRECT_DEBIT, "Direct Debit", "49"),
    (MEANS_ONLINE, "Online", "68"),
    (MEANS_PROMISSORY_NOTE, "Promissory Note", "60"),
    (MEANS_NETTING, "Netting", "97"),
    (MEANS_OTHER, "Other", "ZZZ"),
];

pub fn means_key_defs() -> Vec<Definition> {
    MEANS.iter().map(|(key, name, _)| Definition::key(key, name)).collect()
}

/// Base of the key (before any `+` sub-key) is a known payment means.
pub fn is_means_key(key: &Key) -> bool {
    let base = key.base();
    MEANS.iter().any(|(k, _, _)| base == *k)
}

/// UNTDID 4461 code for the base of a payment means key.
pub fn means_untdid_code(key: &Key) -> Option<&'static str> {
    let base = key.base();
    MEANS.iter().find(|(k, _, _)| base == *k).map(|(_, _, code)| *code)
}

pub(crate) fn check_means_key(key: &Key) -> Result<(), String> {
    if key.is_empty() || is_means_key(key) {
        Ok(())
    } else {
        Err("must be a valid value".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_keys_use_base() {
        assert!(is_means_key(&Key::from("credit-transfer+sepa")));
        assert_eq!(means_untdid_code(&Key::from("online")), Some("68"));
        assert!(!is_means_key(&Key::from("barter")));
        assert_eq!(means_key_defs().len(), 12);
    }
}
