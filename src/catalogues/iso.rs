//! ISO/IEC 6523 International Code Designators, used to qualify identity
//! and electronic address codes.

use serde::Serialize;

use crate::cbc::Definition;

use super::code_values;

/// ISO 6523 scheme of an identity or inbox code.
pub const EXT_ISO_SCHEME_ID: &str = "iso-scheme-id";

/// One registered code designator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchemeId {
    /// Four digit designator, e.g. "0088".
    pub code: &'static str,
    pub name: &'static str,
}

impl SchemeId {
    /// French SIREN.
    pub const SIREN: Self = Self {
        code: "0002",
        name: "System Information et Repertoire des Entreprise et des Etablissements: SIRENE",
    };
    /// French SIRET.
    pub const SIRET: Self = Self {
        code: "0009",
        name: "SIRET-CODE",
    };
    /// GS1 GLN.
    pub const GLN: Self = Self {
        code: "0088",
        name: "Global Location Number",
    };
    /// Private identifier of a French party.
    pub const FR_PRIVATE: Self = Self {
        code: "0224",
        name: "FR Private identifier",
    };
    /// SIREN based electronic address.
    pub const FR_SIREN_ADDRESS: Self = Self {
        code: "0225",
        name: "FRCTC ELECTRONIC ADDRESS",
    };
    /// Single VAT taxable person under French law.
    pub const FR_STC: Self = Self {
        code: "0231",
        name: "FR Single Taxable Company identifier",
    };
}

/// Registered designators, sorted by code.
pub const ISO_SCHEMES: &[(&str, &str)] = &[
    ("0002", "System Information et Repertoire des Entreprise et des Etablissements: SIRENE"),
    ("0007", "Organisationsnummer (Swedish legal entities)"),
    ("0009", "SIRET-CODE"),
    ("0037", "LY-tunnus (Finnish business ID)"),
    ("0060", "Data Universal Numbering System (D-U-N-S Number)"),
    ("0088", "Global Location Number"),
    ("0096", "DANISH CHAMBER OF COMMERCE Scheme"),
    ("0106", "Association of Chambers of Commerce and Industry in the Netherlands"),
    ("0130", "Directorates of the European Commission"),
    ("0135", "SIA Object Identifiers"),
    ("0142", "SECETI Object Identifiers"),
    ("0184", "DIGSTORG"),
    ("0190", "Dutch Originator's Identification Number"),
    ("0192", "Enhetsregisteret ved Bronnoysundregisterne"),
    ("0195", "Singapore UEN identifier"),
    ("0196", "Kennitala - Iceland legal id for individuals and legal entities"),
    ("0198", "ERSTORG"),
    ("0204", "Leitweg-ID"),
    ("0208", "Numero d'entreprise / ondernemingsnummer / Unternehmensnummer"),
    ("0209", "GS1 identification keys"),
    ("0210", "CODICE FISCALE"),
    ("0211", "PARTITA IVA"),
    ("0212", "Finnish Organization Identifier"),
    ("0213", "Finnish Organization Value Add Tax Identifier"),
    ("0221", "The registered number of the qualified invoice issuer"),
    ("0224", "FR Private identifier"),
    ("0225", "FRCTC ELECTRONIC ADDRESS"),
    ("0230", "National e-Invoicing Framework"),
    ("0231", "FR Single Taxable Company identifier"),
];

/// Look up a designator by code.
pub fn scheme_id(code: &str) -> Option<SchemeId> {
    ISO_SCHEMES
        .binary_search_by(|(c, _)| (*c).cmp(code))
        .ok()
        .map(|i| SchemeId {
            code: ISO_SCHEMES[i].0,
            name: ISO_SCHEMES[i].1,
        })
}

pub(super) fn scheme_id_def() -> Definition {
    Definition::key(EXT_ISO_SCHEME_ID, "ISO/IEC 6523 Identifier scheme code")
        .desc("Code designator of the scheme an identity or electronic address belongs to.")
        .values(code_values(ISO_SCHEMES))
}
