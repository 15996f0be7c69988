//! Chorus Pro, the French public sector invoicing portal.

use crate::bill::{Invoice, PaymentDetails, Tax, Totals};
use crate::cbc::{Definition, I18nString};
use crate::org::{Identity, Party};
use crate::regimes::fr::{IDENTITY_TYPE_SIREN, IDENTITY_TYPE_SIRET, is_siren, is_siret};
use crate::tax::{AddonDef, Object, ObjectMut, ext_rules};
use crate::validation::{Errors, FieldError, Rule, by, required, validate_struct};

use super::eu_en16931;

pub const KEY: &str = "fr-choruspro-v1";

/// General information framework the document is submitted under.
pub const EXT_FRAMEWORK: &str = "fr-choruspro-framework";
/// How a party without a SIRET is identified.
pub const EXT_SCHEME: &str = "fr-choruspro-scheme";

pub const FRAMEWORK_SUPPLIER: &str = "A1";
/// Invoices that have already been paid.
pub const FRAMEWORK_PAID: &str = "A2";

const FRAMEWORKS: &[(&str, &str)] = &[
    ("A1", "Submission by a supplier of an invoice"),
    ("A2", "Submission by a supplier of an invoice already paid"),
    ("A3", "Submission by a supplier of a Memorandum on Justice Costs"),
    ("A4", "Submission by a supplier of a draft monthly statement"),
    ("A5", "Submission by a supplier of an account statement"),
    ("A6", "Work invoice document sent to a financial service"),
    ("A7", "Submission by a supplier of a draft final statement"),
    ("A8", "Submission by a supplier of a general and definitive statement"),
    ("A9", "Submission by a subcontractor of an invoice"),
    ("A10", "Submission by a subcontractor of a draft monthly statement"),
    ("A12", "Submission by a joint contractor of an invoice"),
    ("A13", "Submission by a joint contractor of a draft monthly statement"),
    ("A14", "Submission by a joint contractor of a draft final statement"),
    ("A15", "Submission by a project manager of an account statement"),
    ("A16", "Submission by a project manager of a validated account statement"),
    ("A17", "Submission by a project manager of a draft general statement"),
    ("A18", "Submission by a project manager of a general statement"),
    ("A19", "Submission by a contracting authority of a validated account statement"),
    ("A20", "Submission by a contracting authority of a general statement"),
    ("A21", "Submission by a beneficiary of an ICT reimbursement request"),
    (
        "A22",
        "Submission by a supplier or an authorised representative of a draft general statement as part of a tacit procedure",
    ),
    (
        "A23",
        "Submission by a supplier or an authorised representative of a tacit general and final statement",
    ),
    ("A24", "Submission by an authorised representative of a tacit general and final statement"),
    (
        "A25",
        "Submission by an authorised representative of a general and final statement as part of a tacit procedure",
    ),
];

const SCHEMES: &[(&str, &str)] = &[
    ("1", "Third party with SIRET"),
    ("2", "European structure outside France"),
    ("3", "Structure outside the EU"),
    ("4", "RIDET"),
    ("5", "Tahiti Number"),
    ("6", "Other"),
];

pub fn new() -> AddonDef {
    AddonDef {
        key: KEY.into(),
        requires: vec![eu_en16931::KEY.into()],
        name: I18nString::en("Chorus Pro").with("fr", "Chorus Pro"),
        extensions: extensions(),
        normalizer: Some(normalize),
        validator: Some(validate),
        ..Default::default()
    }
}

fn definitions(list: &[(&str, &str)]) -> Vec<Definition> {
    list.iter().map(|(code, name)| Definition::code(code, name)).collect()
}

fn extensions() -> Vec<Definition> {
    vec![
        Definition::key(EXT_FRAMEWORK, "General Information Framework")
            .name_in("fr", "Cadre de Facturation")
            .desc("Context of the entity submitting the document. Defaults to \"A1\" when not provided.")
            .values(definitions(FRAMEWORKS)),
        Definition::key(EXT_SCHEME, "Scheme")
            .name_in("fr", "Type d'identifiant")
            .values(definitions(SCHEMES)),
    ]
}

fn normalize(obj: ObjectMut<'_>) {
    if let ObjectMut::Invoice(inv) = obj {
        let tax = inv.tax.get_or_insert_with(Tax::default);
        if !tax.ext.has(EXT_FRAMEWORK) {
            tax.ext.set(EXT_FRAMEWORK, FRAMEWORK_SUPPLIER);
        }
        add_registration(&mut inv.supplier);
        if let Some(customer) = inv.customer.as_mut() {
            add_registration(customer);
        }
    }
}

/// Derive a SIREN or SIRET identity from the tax ID when the party has
/// neither. VAT codes carry a two character key ahead of the SIREN.
fn add_registration(party: &mut Party) {
    if party.identities.iter().any(|id| is_siren(id) || is_siret(id)) {
        return;
    }
    let Some(tax_id) = &party.tax_id else { return };
    let code = tax_id.code.as_str();
    let id = match code.len() {
        11 => Identity::new(IDENTITY_TYPE_SIREN, &code[2..]),
        9 => Identity::new(IDENTITY_TYPE_SIREN, code),
        14 => Identity::new(IDENTITY_TYPE_SIRET, code),
        _ => return,
    };
    party.identities.push(id);
}

fn validate(obj: Object<'_>) -> Result<(), Errors> {
    match obj {
        Object::Invoice(inv) => validate_invoice(inv),
        _ => Ok(()),
    }
}

fn validate_invoice(inv: &Invoice) -> Result<(), Errors> {
    let paid = inv.tax.as_ref().is_some_and(|t| t.ext.is(EXT_FRAMEWORK, FRAMEWORK_PAID));
    validate_struct()
        .field("tax", &inv.tax, vec![required(), invoice_tax()])
        .field("payment", &inv.payment, vec![required(), payment()])
        .field("supplier", &inv.supplier, vec![supplier_registration()])
        .field("customer", &inv.customer, vec![required(), customer_registration()])
        .field("totals", &inv.totals, vec![by(move |t: &Option<Totals>| match t {
            Some(t) if paid && !t.outstanding().is_zero() => {
                Err(format!("must be paid in full for framework '{FRAMEWORK_PAID}'"))
            }
            _ => Ok(()),
        })])
        .finish()
}

fn invoice_tax() -> Rule<'static, Option<Tax>> {
    Box::new(|tax: &Option<Tax>| {
        let Some(tax) = tax else { return Ok(()) };
        validate_struct()
            .field("ext", &tax.ext, vec![ext_rules::require(&[EXT_FRAMEWORK])])
            .finish()
            .map_err(FieldError::Nested)
    })
}

fn payment() -> Rule<'static, Option<PaymentDetails>> {
    Box::new(|pd: &Option<PaymentDetails>| {
        let Some(pd) = pd else { return Ok(()) };
        validate_struct()
            .field("instructions", &pd.instructions, vec![required()])
            .finish()
            .map_err(FieldError::Nested)
    })
}

fn supplier_registration() -> Rule<'static, Party> {
    Box::new(|p: &Party| registration(p).map_err(FieldError::Nested))
}

fn customer_registration() -> Rule<'static, Option<Party>> {
    Box::new(|p: &Option<Party>| match p {
        Some(p) => registration(p).map_err(FieldError::Nested),
        None => Ok(()),
    })
}

fn registration(party: &Party) -> Result<(), Errors> {
    validate_struct()
        .field(
            "identities",
            &party.identities,
            vec![
                required(),
                by(|ids: &Vec<Identity>| {
                    if ids.iter().any(|id| is_siren(id) || is_siret(id)) {
                        Ok(())
                    } else {
                        Err("at least one identity must be SIREN or SIRET".to_string())
                    }
                }),
            ],
        )
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cbc::Code;
    use crate::num::Amount;
    use crate::pay::Instructions;

    fn party(code: &str) -> Party {
        Party::new("Test").with_tax_id(crate::tax::Identity::new("FR", code))
    }

    fn first_identity(p: &Party) -> Option<(String, String)> {
        p.identities.first().map(|id| (id.kind.to_string(), id.code.to_string()))
    }

    #[test]
    fn registration_from_tax_id() {
        let mut p = party("44732829320");
        add_registration(&mut p);
        assert_eq!(first_identity(&p), Some(("SIREN".into(), "732829320".into())));

        let mut p = party("391838042");
        add_registration(&mut p);
        assert_eq!(first_identity(&p), Some(("SIREN".into(), "391838042".into())));

        let mut p = party("39183804212345");
        add_registration(&mut p);
        assert_eq!(first_identity(&p), Some(("SIRET".into(), "39183804212345".into())));

        let mut p = party("1234");
        add_registration(&mut p);
        assert!(p.identities.is_empty());
    }

    #[test]
    fn existing_registration_kept() {
        let mut p = party("44732829320");
        p.identities.push(Identity::new(IDENTITY_TYPE_SIRET, "39183804212345"));
        add_registration(&mut p);
        assert_eq!(p.identities.len(), 1);
    }

    #[test]
    fn default_framework() {
        let mut inv = Invoice::default();
        normalize(ObjectMut::Invoice(&mut inv));
        assert_eq!(inv.tax.as_ref().unwrap().ext.get(EXT_FRAMEWORK).unwrap(), "A1");

        inv.tax.as_mut().unwrap().ext.set(EXT_FRAMEWORK, "A3");
        normalize(ObjectMut::Invoice(&mut inv));
        assert_eq!(inv.tax.as_ref().unwrap().ext.get(EXT_FRAMEWORK).unwrap(), "A3");
    }

    #[test]
    fn invoice_rules() {
        let mut inv = Invoice::default();
        let errs = validate_invoice(&inv).unwrap_err();
        assert_eq!(errs.message("tax"), Some("cannot be blank"));
        assert_eq!(errs.message("payment"), Some("cannot be blank"));
        assert_eq!(errs.message("customer"), Some("cannot be blank"));
        assert_eq!(errs.message("supplier.identities"), Some("cannot be blank"));

        inv.supplier.identities.push(Identity::new("RCS", "123"));
        inv.customer = Some(party("391838042"));
        normalize(ObjectMut::Invoice(&mut inv));
        inv.payment = Some(PaymentDetails::default());
        let errs = validate_invoice(&inv).unwrap_err();
        assert_eq!(
            errs.message("supplier.identities"),
            Some("at least one identity must be SIREN or SIRET")
        );
        assert!(!errs.contains("customer"));
        assert_eq!(errs.message("payment.instructions"), Some("cannot be blank"));
    }

    #[test]
    fn paid_framework() {
        let mut inv = Invoice::default();
        inv.supplier.identities.push(Identity::new(IDENTITY_TYPE_SIREN, "732829320"));
        inv.customer = Some(party("391838042"));
        inv.payment = Some(PaymentDetails {
            instructions: Some(Instructions::default()),
            ..Default::default()
        });
        normalize(ObjectMut::Invoice(&mut inv));
        inv.tax.as_mut().unwrap().ext.set(EXT_FRAMEWORK, FRAMEWORK_PAID);
        inv.totals = Some(Totals {
            payable: Amount::new(12000, 2),
            ..Default::default()
        });
        let errs = validate_invoice(&inv).unwrap_err();
        assert_eq!(errs.message("totals"), Some("must be paid in full for framework 'A2'"));

        inv.totals.as_mut().unwrap().due = Some(Amount::new(0, 2));
        assert!(validate_invoice(&inv).is_ok());
    }

    #[test]
    fn framework_codes() {
        let defs = extensions();
        assert!(defs[0].has_code(&Code::from("A25")));
        assert!(!defs[0].has_code(&Code::from("A11")));
        assert!(defs[1].has_code(&Code::from("6")));
    }
}
