//! UN/EDIFACT code lists (UNTDID).

use crate::cbc::Definition;

use super::code_values;

/// UNTDID 1001 document name code.
pub const EXT_UNTDID_DOCUMENT_TYPE: &str = "untdid-document-type";
/// UNTDID 5305 duty or tax or fee category code.
pub const EXT_UNTDID_TAX_CATEGORY: &str = "untdid-tax-category";
/// UNTDID 4451 text subject code qualifier, used on notes.
pub const EXT_UNTDID_TEXT_SUBJECT: &str = "untdid-text-subject";
/// Qualifier of a reference code.
pub const EXT_UNTDID_REFERENCE: &str = "untdid-reference";

/// Document types used for invoices and payments, including the French
/// extensions to the EN 16931 list. Sorted numerically.
pub const DOCUMENT_TYPES: &[(&str, &str)] = &[
    ("71", "Request for payment"),
    ("80", "Debit note related to goods or services"),
    ("81", "Credit note related to goods or services"),
    ("82", "Metered services invoice"),
    ("83", "Credit note related to financial adjustments"),
    ("84", "Debit note related to financial adjustments"),
    ("102", "Tax notification"),
    ("130", "Invoicing data sheet"),
    ("202", "Direct payment valuation"),
    ("203", "Provisional payment valuation"),
    ("204", "Payment valuation"),
    ("211", "Interim application for payment"),
    ("218", "Final payment request based on completion of work"),
    ("219", "Payment request for completed units"),
    ("261", "Self billed credit note"),
    ("262", "Consolidated credit note - goods and services"),
    ("295", "Price variation invoice"),
    ("296", "Credit note for price variation"),
    ("308", "Delcredere credit note"),
    ("325", "Proforma invoice"),
    ("326", "Partial invoice"),
    ("380", "Standard invoice"),
    ("381", "Credit note"),
    ("382", "Commission note"),
    ("383", "Debit note"),
    ("384", "Corrected invoice"),
    ("385", "Consolidated invoice"),
    ("386", "Prepayment invoice"),
    ("387", "Hire invoice"),
    ("388", "Tax invoice"),
    ("389", "Self-billed invoice"),
    ("390", "Delcredere invoice"),
    ("393", "Factored invoice"),
    ("394", "Lease invoice"),
    ("395", "Consignment invoice"),
    ("396", "Factored credit note"),
    ("420", "Optical Character Reading (OCR) payment credit note"),
    ("456", "Debit advice"),
    ("457", "Reversal of debit"),
    ("458", "Reversal of credit"),
    ("471", "Prepaid amount invoice"),
    ("472", "Self-billed prepaid amount invoice"),
    ("473", "Stand-alone credit note"),
    ("500", "Self-billed advance payment invoice"),
    ("501", "Self-billed factored invoice"),
    ("502", "Self-billed corrective invoice"),
    ("503", "Self-billed credit note for claim"),
    ("527", "Self billed debit note"),
    ("532", "Forwarder's credit note"),
    ("553", "Forwarder's invoice discrepancy report"),
    ("575", "Insurer's invoice"),
    ("623", "Forwarder's invoice"),
    ("633", "Port charges documents"),
    ("751", "Invoice information for accounting purposes"),
    ("780", "Freight invoice"),
    ("817", "Claim notification"),
    ("870", "Consular invoice"),
    ("875", "Partial construction invoice"),
    ("876", "Partial final construction invoice"),
    ("877", "Final construction invoice"),
    ("935", "Customs invoice"),
];

/// Sorted alphabetically.
pub const TAX_CATEGORIES: &[(&str, &str)] = &[
    ("A", "Mixed tax rate"),
    ("AA", "Lower rate"),
    ("AB", "Exempt for resale"),
    ("AC", "Value Added Tax (VAT) not now due for payment"),
    ("AD", "Value Added Tax (VAT) due from a previous invoice"),
    ("AE", "VAT Reverse Charge"),
    ("B", "Transferred (VAT)"),
    ("C", "Duty paid by supplier"),
    ("D", "Value Added Tax (VAT) margin scheme - travel agents"),
    ("E", "Exempt from tax"),
    ("F", "Value Added Tax (VAT) margin scheme - second-hand goods"),
    ("G", "Free export item, tax not charged"),
    ("H", "Higher rate"),
    ("I", "Value Added Tax (VAT) margin scheme - works of art"),
    ("J", "Value Added Tax (VAT) margin scheme - collector's items and antiques"),
    ("K", "VAT exempt for EEA intra-community supply of goods and services"),
    ("L", "Canary Islands general indirect tax"),
    ("M", "Tax for production, services and importation in Ceuta and Melilla"),
    ("O", "Services outside scope of tax"),
    ("S", "Standard rate"),
    ("Z", "Zero rated goods"),
];

/// The text subjects used on invoice notes. Sorted alphabetically.
pub const TEXT_SUBJECTS: &[(&str, &str)] = &[
    ("AAB", "Terms of payments"),
    ("AAI", "General information"),
    ("AAK", "Price conditions"),
    ("ABL", "Government information"),
    ("ACB", "Additional information"),
    ("ADU", "Note"),
    ("AFL", "Contract reference"),
    ("AWW", "Order reference"),
    ("BAR", "Treatment of the invoice"),
    ("CUS", "Customs declaration information"),
    ("PMD", "Payment detail/remittance information"),
    ("PMT", "Payment information"),
    ("REG", "Regulatory information"),
    ("SUR", "Supplier remarks"),
    ("TXD", "Tax declaration"),
];

/// The reference qualifiers used on invoices and payments. Sorted by code.
pub const REFERENCES: &[(&str, &str)] = &[
    ("AAA", "Order acknowledgement document identifier"),
    ("AAB", "Proforma invoice document identifier"),
    ("AAG", "Offer number"),
    ("ABT", "Goods declaration document identifier, Customs"),
    ("AEP", "Project number"),
    ("AFL", "Associated invoices"),
    ("ALO", "Receiving advice number"),
    ("AOU", "Cost account"),
    ("AWW", "Buyer's fund number"),
    ("BC", "Buyer's contract number"),
    ("CT", "Contract number"),
    ("DQ", "Delivery note number"),
    ("IV", "Invoice document identifier"),
    ("LC", "Letter of credit number"),
    ("ON", "Order document identifier, buyer assigned"),
    ("PD", "Promotion deal number"),
    ("PP", "Purchase order change number"),
    ("VN", "Order number (vendor)"),
];

pub(super) fn document_type_def() -> Definition {
    Definition::key(EXT_UNTDID_DOCUMENT_TYPE, "UNTDID 1001 Document Type")
        .desc("Code describing the type of document, based on the EN 16931 code list.")
        .values(code_values(DOCUMENT_TYPES))
}

pub(super) fn tax_category_def() -> Definition {
    Definition::key(EXT_UNTDID_TAX_CATEGORY, "UNTDID 5305 Tax Category")
        .desc("Duty, tax or fee category applied to a line or tax combination.")
        .values(code_values(TAX_CATEGORIES))
}

pub(super) fn text_subject_def() -> Definition {
    Definition::key(EXT_UNTDID_TEXT_SUBJECT, "UNTDID 4451 Text Subject")
        .desc("Qualifies the subject of a free text note.")
        .values(code_values(TEXT_SUBJECTS))
}

pub(super) fn reference_def() -> Definition {
    Definition::key(EXT_UNTDID_REFERENCE, "UNTDID 1153 Reference Code Qualifier")
        .desc("Qualifies the kind of reference an identity or document reference holds.")
        .values(code_values(REFERENCES))
}
