//! EN 16931-1:2017, the European semantic model for electronic invoices.
//!
//! Maps the document onto the code lists the norm is expressed in: the
//! UNTDID 1001 document type, UNTDID 5305 tax categories on every combo,
//! UNTDID 5189/7161 codes on discounts and charges and ISO 6523 schemes on
//! French registration numbers. The business rules checked here are the
//! ones that can be decided on the document model alone.

use std::collections::HashSet;

use tracing::trace;

use crate::bill::{
    Charge, Discount, Invoice, InvoiceType, LineCharge, LineDiscount, PaymentDetails, Tax, Totals,
    charge_untdid_code, discount_untdid_code,
};
use crate::catalogues::{EXT_ISO_SCHEME_ID, EXT_UNTDID_DOCUMENT_TYPE, EXT_UNTDID_TAX_CATEGORY, SchemeId};
use crate::cbc::{Code, I18nString};
use crate::org::{Identity, Party};
use crate::tax::{self, AddonDef, CATEGORY_VAT, Combo, Object, ObjectMut, RATE_EXEMPT, RATE_ZERO, ext_rules};
use crate::validation::{Errors, FieldError, Rule, by, each, required, required_msg, validate_struct, when};

pub const KEY: &str = "eu-en16931-v2017";

pub const TAX_CATEGORY_STANDARD: &str = "S";
pub const TAX_CATEGORY_ZERO: &str = "Z";
pub const TAX_CATEGORY_EXEMPT: &str = "E";
pub const TAX_CATEGORY_REVERSE_CHARGE: &str = "AE";
pub const TAX_CATEGORY_INTRA_COMMUNITY: &str = "K";
pub const TAX_CATEGORY_EXPORT: &str = "G";
pub const TAX_CATEGORY_OUTSIDE_SCOPE: &str = "O";
pub const TAX_CATEGORY_IGIC: &str = "L";
pub const TAX_CATEGORY_IPSI: &str = "M";

/// VAT categories the norm accepts.
const VAT_CATEGORIES: &[&str] = &[
    TAX_CATEGORY_STANDARD,
    TAX_CATEGORY_ZERO,
    TAX_CATEGORY_EXEMPT,
    TAX_CATEGORY_REVERSE_CHARGE,
    TAX_CATEGORY_INTRA_COMMUNITY,
    TAX_CATEGORY_EXPORT,
    TAX_CATEGORY_OUTSIDE_SCOPE,
];

/// Categories without tax, which may appear at most once per invoice.
const EXEMPT_CATEGORIES: &[&str] = &[
    TAX_CATEGORY_EXEMPT,
    TAX_CATEGORY_REVERSE_CHARGE,
    TAX_CATEGORY_INTRA_COMMUNITY,
    TAX_CATEGORY_EXPORT,
    TAX_CATEGORY_OUTSIDE_SCOPE,
];

const CATEGORY_IGIC: &str = "IGIC";
const CATEGORY_IPSI: &str = "IPSI";

/// Identity types with the ISO 6523 scheme each one is published under.
const IDENTITY_SCHEMES: &[(&str, SchemeId)] = &[("SIREN", SchemeId::SIREN), ("SIRET", SchemeId::SIRET)];

pub fn new() -> AddonDef {
    AddonDef {
        key: KEY.into(),
        name: I18nString::en("EN 16931-1:2017"),
        normalizer: Some(normalize),
        validator: Some(validate),
        ..Default::default()
    }
}

fn normalize(obj: ObjectMut<'_>) {
    match obj {
        ObjectMut::Invoice(inv) => normalize_invoice(inv),
        ObjectMut::Combo(combo) => normalize_combo(combo),
        ObjectMut::Discount(d) => fill_code(&mut d.code, discount_untdid_code(&d.key)),
        ObjectMut::LineDiscount(d) => fill_code(&mut d.code, discount_untdid_code(&d.key)),
        ObjectMut::Charge(c) => fill_code(&mut c.code, charge_untdid_code(&c.key)),
        ObjectMut::LineCharge(c) => fill_code(&mut c.code, charge_untdid_code(&c.key)),
        ObjectMut::Identity(id) => normalize_identity(id),
        _ => {}
    }
}

/// Document codes derived from an invoice type, which follow the type when
/// it changes. Any other code was chosen by the issuer and is kept.
fn is_derived_type(code: &Code) -> bool {
    code.in_list(&["380", "325", "326", "384", "381", "383", "389"])
}

fn normalize_invoice(inv: &mut Invoice) {
    let code = inv.kind.untdid_code();
    let tax = inv.tax.get_or_insert_with(Tax::default);
    match tax.ext.get(EXT_UNTDID_DOCUMENT_TYPE) {
        Some(current) if !is_derived_type(current) || current == code => {}
        _ => tax.ext.set(EXT_UNTDID_DOCUMENT_TYPE, code),
    }
}

fn normalize_combo(combo: &mut Combo) {
    let current = combo.ext.get(EXT_UNTDID_TAX_CATEGORY).cloned();
    let keep = |list: &[&str]| current.as_ref().filter(|c| c.in_list(list)).cloned();
    let code: Code = match combo.category.as_str() {
        CATEGORY_VAT => {
            let rate = combo.rate.base();
            if rate.is_empty() {
                keep(VAT_CATEGORIES).unwrap_or_else(|| TAX_CATEGORY_STANDARD.into())
            } else if rate == RATE_ZERO {
                TAX_CATEGORY_ZERO.into()
            } else if rate == RATE_EXEMPT {
                keep(EXEMPT_CATEGORIES).unwrap_or_else(|| TAX_CATEGORY_EXEMPT.into())
            } else {
                TAX_CATEGORY_STANDARD.into()
            }
        }
        CATEGORY_IGIC => TAX_CATEGORY_IGIC.into(),
        CATEGORY_IPSI => TAX_CATEGORY_IPSI.into(),
        _ => TAX_CATEGORY_OUTSIDE_SCOPE.into(),
    };
    trace!(category = %combo.category, rate = %combo.rate, code = %code, "untdid tax category");
    combo.ext.set(EXT_UNTDID_TAX_CATEGORY, code);
}

fn fill_code(code: &mut Code, untdid: Option<&'static str>) {
    if let (true, Some(c)) = (code.is_empty(), untdid) {
        *code = Code::from(c);
    }
}

/// Keep the identity type and its ISO scheme in step, whichever was given.
fn normalize_identity(id: &mut Identity) {
    for (kind, scheme) in IDENTITY_SCHEMES {
        if id.kind == *kind && !id.ext.has(EXT_ISO_SCHEME_ID) {
            id.ext.set(EXT_ISO_SCHEME_ID, scheme.code);
        } else if id.kind.is_empty() && id.ext.is(EXT_ISO_SCHEME_ID, scheme.code) {
            id.kind = Code::from(*kind);
        }
    }
}

fn validate(obj: Object<'_>) -> Result<(), Errors> {
    match obj {
        Object::Invoice(inv) => validate_invoice(inv),
        Object::Combo(combo) => validate_combo(combo),
        Object::Discount(d) => validate_discount(d),
        Object::LineDiscount(d) => validate_line_discount(d),
        Object::Charge(c) => validate_charge(c),
        Object::LineCharge(c) => validate_line_charge(c),
        _ => Ok(()),
    }
}

/// Amount still to be paid, from `due` when set or else `payable`.
fn is_due(inv: &Invoice) -> bool {
    inv.totals.as_ref().is_some_and(|t| match t.due {
        Some(due) => !due.is_zero(),
        None => !t.payable.is_zero(),
    })
}

fn validate_invoice(inv: &Invoice) -> Result<(), Errors> {
    let needs_payment = is_due(inv) && inv.kind == InvoiceType::Standard;
    validate_struct()
        .field("tax", &inv.tax, vec![required(), invoice_tax()])
        // BR-16
        .field("lines", &inv.lines, vec![required()])
        // BR-8
        .field("supplier", &inv.supplier, vec![by(party_addresses)])
        // BR-10
        .field(
            "customer",
            &inv.customer,
            vec![by(|p: &Option<Party>| p.as_ref().map_or(Ok(()), party_addresses))],
        )
        .field(
            "payment",
            &inv.payment,
            vec![when(
                needs_payment,
                vec![
                    required_msg("payment details are required when amount is due (BR-CO-25)"),
                    payment_terms(),
                ],
            )],
        )
        .field("totals", &inv.totals, vec![totals_taxes()])
        .finish()
}

fn invoice_tax() -> Rule<'static, Option<Tax>> {
    Box::new(|tax: &Option<Tax>| {
        let Some(tax) = tax else { return Ok(()) };
        validate_struct()
            .field("ext", &tax.ext, vec![ext_rules::require(&[EXT_UNTDID_DOCUMENT_TYPE])])
            .finish()
            .map_err(FieldError::Nested)
    })
}

fn party_addresses(p: &Party) -> Result<(), String> {
    if p.addresses.is_empty() {
        Err("addresses are required".to_string())
    } else {
        Ok(())
    }
}

fn payment_terms() -> Rule<'static, Option<PaymentDetails>> {
    Box::new(|pd: &Option<PaymentDetails>| {
        let Some(pd) = pd else { return Ok(()) };
        validate_struct()
            .field(
                "terms",
                &pd.terms,
                vec![required_msg("payment terms are required when amount is due (BR-CO-25)")],
            )
            .finish()
            .map_err(FieldError::Nested)
    })
}

fn totals_taxes() -> Rule<'static, Option<Totals>> {
    Box::new(|totals: &Option<Totals>| {
        let Some(taxes) = totals.as_ref().and_then(|t| t.taxes.as_ref()) else {
            return Ok(());
        };
        let mut errs = Errors::new();
        errs.nest(
            "taxes",
            validate_struct()
                .field("categories", &taxes.categories, vec![each(vec![by(check_category_rates)])])
                .finish(),
        );
        errs.into_result().map_err(FieldError::Nested)
    })
}

/// Tax free categories group a single rate each, and outside scope stands
/// alone.
fn check_category_rates(cat: &tax::CategoryTotal) -> Result<(), String> {
    let mut seen = HashSet::new();
    for rate in &cat.rates {
        let Some(code) = rate.ext.get(EXT_UNTDID_TAX_CATEGORY) else {
            continue;
        };
        if !code.in_list(EXEMPT_CATEGORIES) {
            continue;
        }
        if !seen.insert(code.as_str()) {
            return Err(format!("UNTDID tax category {code} appears more than once (BR-{code}-01)"));
        }
    }
    if seen.contains(TAX_CATEGORY_OUTSIDE_SCOPE) && seen.len() > 1 {
        return Err("outside scope (O) cannot be combined with other VAT categories (BR-O-11)".to_string());
    }
    Ok(())
}

fn validate_combo(combo: &Combo) -> Result<(), Errors> {
    let codes: &[&str] = match combo.category.as_str() {
        CATEGORY_VAT => VAT_CATEGORIES,
        CATEGORY_IGIC => &[TAX_CATEGORY_IGIC],
        CATEGORY_IPSI => &[TAX_CATEGORY_IPSI],
        _ => &[TAX_CATEGORY_OUTSIDE_SCOPE],
    };
    validate_struct()
        .field(
            "ext",
            &combo.ext,
            vec![
                ext_rules::require(&[EXT_UNTDID_TAX_CATEGORY]),
                ext_rules::has_codes(EXT_UNTDID_TAX_CATEGORY, codes),
            ],
        )
        .finish()
}

/// A reason or a UNTDID code must say what the amount is for.
fn reason_or_code(reason: &str, code: &Code, msg: &'static str) -> Result<(), Errors> {
    let missing = code.is_empty();
    validate_struct()
        .field("reason", &reason.to_string(), vec![when(missing, vec![required_msg(msg)])])
        .finish()
}

fn validate_discount(d: &Discount) -> Result<(), Errors> {
    reason_or_code(&d.reason, &d.code, "either a reason or an allowance code is required (BR-33)")
}

fn validate_charge(c: &Charge) -> Result<(), Errors> {
    reason_or_code(&c.reason, &c.code, "either a reason or a charge code is required (BR-36)")
}

fn validate_line_discount(d: &LineDiscount) -> Result<(), Errors> {
    reason_or_code(&d.reason, &d.code, "either a reason or an allowance code is required (BR-41)")
}

fn validate_line_charge(c: &LineCharge) -> Result<(), Errors> {
    reason_or_code(&c.reason, &c.code, "either a reason or a charge code is required (BR-44)")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bill::Line;
    use crate::num::Amount;
    use crate::org::{Address, Item};
    use crate::tax::{CategoryTotal, RateTotal, Total};

    fn combo_code(mut combo: Combo) -> String {
        normalize_combo(&mut combo);
        combo.ext.get(EXT_UNTDID_TAX_CATEGORY).map(|c| c.to_string()).unwrap_or_default()
    }

    #[test]
    fn document_type_follows_invoice_type() {
        let mut inv = Invoice::default();
        normalize_invoice(&mut inv);
        assert_eq!(inv.tax.as_ref().unwrap().ext.get(EXT_UNTDID_DOCUMENT_TYPE).unwrap(), "380");

        inv.kind = InvoiceType::CreditNote;
        normalize_invoice(&mut inv);
        assert_eq!(inv.tax.as_ref().unwrap().ext.get(EXT_UNTDID_DOCUMENT_TYPE).unwrap(), "381");

        inv.tax.as_mut().unwrap().ext.set(EXT_UNTDID_DOCUMENT_TYPE, "262");
        normalize_invoice(&mut inv);
        assert_eq!(inv.tax.as_ref().unwrap().ext.get(EXT_UNTDID_DOCUMENT_TYPE).unwrap(), "262");
    }

    #[test]
    fn vat_categories() {
        assert_eq!(combo_code(Combo::new("VAT", "standard")), "S");
        assert_eq!(combo_code(Combo::new("VAT", "reduced+eqs")), "S");
        assert_eq!(combo_code(Combo::new("VAT", "zero")), "Z");
        assert_eq!(combo_code(Combo::new("VAT", "exempt")), "E");
        let ext = tax::Extensions::from([(EXT_UNTDID_TAX_CATEGORY, "AE")]);
        assert_eq!(combo_code(Combo::new("VAT", "exempt").ext(ext.clone())), "AE");
        assert_eq!(combo_code(Combo::new("VAT", "").ext(ext)), "AE");
        assert_eq!(combo_code(Combo::new("VAT", "")), "S");
    }

    #[test]
    fn other_categories() {
        assert_eq!(combo_code(Combo::new("IGIC", "standard")), "L");
        assert_eq!(combo_code(Combo::new("IPSI", "")), "M");
        assert_eq!(combo_code(Combo::new("IRPF", "pro")), "O");
    }

    #[test]
    fn combo_codes_checked() {
        let mut combo = Combo::new("VAT", "standard");
        assert!(validate_combo(&combo).is_err());
        normalize_combo(&mut combo);
        assert!(validate_combo(&combo).is_ok());
        combo.ext.set(EXT_UNTDID_TAX_CATEGORY, "L");
        let errs = validate_combo(&combo).unwrap_err();
        assert_eq!(errs.message("ext.untdid-tax-category"), Some("value 'L' invalid"));
    }

    #[test]
    fn discount_and_charge_codes() {
        let mut d = Discount::new("", Amount::new(1000, 2));
        d.key = "sample".into();
        normalize(ObjectMut::Discount(&mut d));
        assert_eq!(d.code, "67");
        assert!(validate_discount(&d).is_ok());

        let mut c = Charge::new("", Amount::new(500, 2));
        c.key = "delivery".into();
        normalize(ObjectMut::Charge(&mut c));
        assert_eq!(c.code, "DL");

        let c = LineCharge::default();
        let errs = validate_line_charge(&c).unwrap_err();
        assert!(errs.message("reason").unwrap().contains("BR-44"));
        let d = LineDiscount {
            reason: "Loyalty".into(),
            ..Default::default()
        };
        assert!(validate_line_discount(&d).is_ok());
    }

    #[test]
    fn identity_schemes() {
        let mut id = Identity::new("SIREN", "356000000");
        normalize_identity(&mut id);
        assert!(id.ext.is(EXT_ISO_SCHEME_ID, "0002"));

        let mut id = Identity::new("", "35600000012345");
        id.ext.set(EXT_ISO_SCHEME_ID, "0009");
        normalize_identity(&mut id);
        assert_eq!(id.kind, "SIRET");
    }

    #[test]
    fn invoice_requirements() {
        let mut inv = Invoice::default();
        inv.customer = Some(Party::new("Buyer"));
        let errs = validate_invoice(&inv).unwrap_err();
        assert_eq!(errs.message("tax"), Some("cannot be blank"));
        assert_eq!(errs.message("lines"), Some("cannot be blank"));
        assert_eq!(errs.message("supplier"), Some("addresses are required"));
        assert_eq!(errs.message("customer"), Some("addresses are required"));

        normalize_invoice(&mut inv);
        inv.lines.push(Line::new(Amount::new(1, 0), Item::new("Thing", Amount::new(1000, 2))));
        inv.supplier.addresses.push(Address::default());
        inv.customer = None;
        inv.totals = Some(Totals {
            payable: Amount::new(1000, 2),
            ..Default::default()
        });
        let errs = validate_invoice(&inv).unwrap_err();
        assert_eq!(
            errs.message("payment"),
            Some("payment details are required when amount is due (BR-CO-25)")
        );

        inv.payment = Some(PaymentDetails::default());
        let errs = validate_invoice(&inv).unwrap_err();
        assert_eq!(
            errs.message("payment.terms"),
            Some("payment terms are required when amount is due (BR-CO-25)")
        );

        inv.totals.as_mut().unwrap().due = Some(Amount::new(0, 2));
        assert!(validate_invoice(&inv).is_ok());
    }

    #[test]
    fn exempt_categories_once() {
        let rate = |code: &str| RateTotal {
            ext: tax::Extensions::from([(EXT_UNTDID_TAX_CATEGORY, code)]),
            ..Default::default()
        };
        let cat = |rates| CategoryTotal {
            code: "VAT".into(),
            rates,
            ..Default::default()
        };
        assert!(check_category_rates(&cat(vec![rate("S"), rate("S"), rate("E")])).is_ok());
        assert_eq!(
            check_category_rates(&cat(vec![rate("E"), rate("E")])).unwrap_err(),
            "UNTDID tax category E appears more than once (BR-E-01)"
        );
        assert!(check_category_rates(&cat(vec![rate("O"), rate("AE")])).unwrap_err().contains("BR-O-11"));

        let totals = Some(Totals {
            taxes: Some(Total {
                categories: vec![cat(vec![rate("K"), rate("K")])],
                ..Default::default()
            }),
            ..Default::default()
        });
        assert!(totals_taxes()(&totals).is_err());
    }
}
