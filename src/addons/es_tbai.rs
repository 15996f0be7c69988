//! TicketBAI, the invoice reporting system of the Basque Country provinces.

use crate::bill::{Invoice, Line, Tax};
use crate::cbc::{Definition, I18nString, NOTE_GENERAL, Note};
use crate::org::{DocumentRef, Party};
use crate::regimes::es::STAMP_TBAI_CODE;
use crate::schema::BILL_INVOICE;
use crate::tax::{AddonDef, CATEGORY_VAT, Combo, CorrectionDefinition, Object, ObjectMut, RATE_EXEMPT, ext_rules};
use crate::validation::{Errors, FieldError, Rule, by, each, required, validate_struct, when};

pub const KEY: &str = "es-tbai-v1";

pub const EXT_REGION: &str = "es-tbai-region";
pub const EXT_PRODUCT: &str = "es-tbai-product";
pub const EXT_EXEMPTION: &str = "es-tbai-exemption";
pub const EXT_CORRECTION: &str = "es-tbai-correction";

pub fn new() -> AddonDef {
    AddonDef {
        key: KEY.into(),
        name: I18nString::en("Spain TicketBAI"),
        extensions: extensions(),
        corrections: vec![CorrectionDefinition {
            extensions: vec![EXT_CORRECTION.into()],
            stamps: vec![STAMP_TBAI_CODE.into()],
            ..CorrectionDefinition::new(BILL_INVOICE)
        }],
        normalizer: Some(normalize),
        validator: Some(validate),
        ..Default::default()
    }
}

fn extensions() -> Vec<Definition> {
    vec![
        Definition::key(EXT_REGION, "TicketBAI Region Code")
            .desc("Province where the supplier is registered, which decides where invoices are reported.")
            .values(vec![
                Definition::code("VI", "Araba"),
                Definition::code("BI", "Bizkaia"),
                Definition::code("SS", "Gipuzkoa"),
            ]),
        Definition::key(EXT_PRODUCT, "TicketBAI Product Key").values(vec![
            Definition::code("goods", "Delivery of goods"),
            Definition::code("services", "Provision of services"),
            Definition::code(
                "resale",
                "Resale of goods without modification by vendor in the simplified regime",
            ),
        ]),
        Definition::key(EXT_EXEMPTION, "TicketBAI Exemption code").values(vec![
            Definition::code("E1", "Exempt: pursuant to Article 20 of the Foral VAT Law"),
            Definition::code("E2", "Exempt: pursuant to Article 21 of the Foral VAT Law"),
            Definition::code("E3", "Exempt: pursuant to Article 22 of the Foral VAT Law"),
            Definition::code("E4", "Exempt: pursuant to Articles 23 and 24 of the Foral VAT Law"),
            Definition::code("E5", "Exempt: pursuant to Article 25 of the Foral VAT law"),
            Definition::code("E6", "Exempt: pursuant to other reasons"),
            Definition::code("OT", "Not subject: pursuant to Article 7 of the VAT Law - other cases of non-subject"),
            Definition::code("RL", "Not subject: pursuant to localization rules"),
            Definition::code(
                "VT",
                "Not subject: sales made on behalf of third parties (amount not computable for VAT or IRPF purposes)",
            ),
            Definition::code(
                "IE",
                "Not subject in the TAI due to localization rules, but foreign tax, IPS/IGIC or VAT from another EU member state is passed on",
            ),
            Definition::code("S1", "Subject and not exempt: without reverse charge"),
            Definition::code("S2", "Subject and not exempt: with reverse charge"),
        ]),
        Definition::key(EXT_CORRECTION, "TicketBAI Rectification Type Code").values(vec![
            Definition::code(
                "R1",
                "Rectified invoice: error based on law and Article 80 One, Two and Six of the Provincial Tax Law of VAT",
            ),
            Definition::code(
                "R2",
                "Rectified invoice: error based on law and Article 80 Three of the Provincial Tax Law of VAT",
            ),
            Definition::code(
                "R3",
                "Rectified invoice: error based on law and Article 80 Four of the Provincial Tax Law of VAT",
            ),
            Definition::code("R4", "Rectified invoice: Other"),
            Definition::code("R5", "Rectified invoice: simplified invoices"),
        ]),
    ]
}

fn normalize(obj: ObjectMut<'_>) {
    match obj {
        ObjectMut::Invoice(inv) => normalize_invoice(inv),
        ObjectMut::Line(line) => normalize_line(line),
        _ => {}
    }
}

/// Province code for the many ways a Basque region gets written.
fn region_code(region: &str) -> Option<&'static str> {
    match region.trim().to_lowercase().as_str() {
        "alava" | "álava" | "araba" | "vi" => Some("VI"),
        "bizkaia" | "vizcaya" | "bi" => Some("BI"),
        "gipuzkoa" | "guipuzcoa" | "guipúzcoa" | "ss" => Some("SS"),
        _ => None,
    }
}

fn normalize_invoice(inv: &mut Invoice) {
    if inv.tax.as_ref().is_some_and(|t| t.ext.has(EXT_REGION)) {
        return;
    }
    let Some(code) = inv.supplier.addresses.first().and_then(|a| region_code(&a.region)) else {
        return;
    };
    inv.tax.get_or_insert_with(Tax::default).ext.set(EXT_REGION, code);
}

fn normalize_line(line: &mut Line) {
    let Some(item) = &line.item else { return };
    let goods = item.key == "goods";
    let Some(vat) = line.taxes.get_mut(&CATEGORY_VAT.into()) else {
        return;
    };
    if goods {
        vat.ext.set_one_of(EXT_PRODUCT, "goods", &["goods", "resale"]);
    } else if item.key.is_empty() || item.key == "services" {
        vat.ext.set(EXT_PRODUCT, "services");
    }
}

fn validate(obj: Object<'_>) -> Result<(), Errors> {
    match obj {
        Object::Invoice(inv) => validate_invoice(inv),
        Object::Combo(combo) => validate_combo(combo),
        _ => Ok(()),
    }
}

fn validate_invoice(inv: &Invoice) -> Result<(), Errors> {
    validate_struct()
        .field("tax", &inv.tax, vec![required(), invoice_tax()])
        .field("customer", &inv.customer, vec![customer()])
        .field(
            "preceding",
            &inv.preceding,
            vec![when(inv.kind.is_correction(), vec![required()]), each(vec![preceding()])],
        )
        .field("notes", &inv.notes, vec![has_general_note()])
        .finish()
}

fn invoice_tax() -> Rule<'static, Option<Tax>> {
    Box::new(|tax: &Option<Tax>| {
        let Some(tax) = tax else { return Ok(()) };
        validate_struct()
            .field("ext", &tax.ext, vec![ext_rules::require(&[EXT_REGION])])
            .finish()
            .map_err(FieldError::Nested)
    })
}

/// Customers need a tax ID for at least the country; Spanish ones also
/// need the code.
fn customer() -> Rule<'static, Option<Party>> {
    Box::new(|p: &Option<Party>| {
        let Some(p) = p else { return Ok(()) };
        let spanish = p.tax_id.as_ref().is_some_and(|id| id.country == "ES");
        validate_struct()
            .field(
                "tax_id",
                &p.tax_id,
                vec![
                    required(),
                    when(
                        spanish,
                        vec![by(|id: &Option<crate::tax::Identity>| match id {
                            Some(id) if id.code.is_empty() => Err("code is required".to_string()),
                            _ => Ok(()),
                        })],
                    ),
                ],
            )
            .finish()
            .map_err(FieldError::Nested)
    })
}

fn preceding() -> Rule<'static, DocumentRef> {
    Box::new(|p: &DocumentRef| {
        validate_struct()
            .field("issue_date", &p.issue_date, vec![required()])
            .field("ext", &p.ext, vec![ext_rules::require(&[EXT_CORRECTION])])
            .finish()
            .map_err(FieldError::Nested)
    })
}

fn has_general_note() -> Rule<'static, Vec<Note>> {
    by(|notes: &Vec<Note>| {
        if notes.iter().any(|n| n.key == NOTE_GENERAL) {
            Ok(())
        } else {
            Err(format!("with key '{NOTE_GENERAL}' missing"))
        }
    })
}

fn validate_combo(combo: &Combo) -> Result<(), Errors> {
    let exempt = combo.category == CATEGORY_VAT && combo.rate == RATE_EXEMPT;
    validate_struct()
        .field("ext", &combo.ext, vec![when(exempt, vec![ext_rules::require(&[EXT_EXEMPTION])])])
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::org::{Address, Item};

    fn invoice() -> Invoice {
        let mut inv = Invoice::default();
        inv.supplier.addresses.push(Address {
            region: "Álava".into(),
            ..Default::default()
        });
        inv
    }

    #[test]
    fn region_from_address() {
        let mut inv = invoice();
        normalize_invoice(&mut inv);
        assert_eq!(inv.tax.unwrap().ext.get(EXT_REGION).unwrap(), "VI");

        let mut inv = invoice();
        inv.supplier.addresses[0].region = "Guipúzcoa".into();
        normalize_invoice(&mut inv);
        assert_eq!(inv.tax.unwrap().ext.get(EXT_REGION).unwrap(), "SS");

        let mut inv = invoice();
        inv.supplier.addresses[0].region = "Madrid".into();
        normalize_invoice(&mut inv);
        assert!(inv.tax.is_none());
    }

    #[test]
    fn region_kept_when_set() {
        let mut inv = invoice();
        let mut tax = Tax::default();
        tax.ext.set(EXT_REGION, "BI");
        inv.tax = Some(tax);
        normalize_invoice(&mut inv);
        assert_eq!(inv.tax.unwrap().ext.get(EXT_REGION).unwrap(), "BI");
    }

    #[test]
    fn product_from_item_key() {
        let mut item = Item::new("Widget", "10.00".parse().unwrap());
        item.key = "goods".into();
        let mut line = Line::new("1".parse().unwrap(), item).with_tax(Combo::new("VAT", "standard"));
        normalize_line(&mut line);
        assert_eq!(line.taxes.get(&"VAT".into()).unwrap().ext.get(EXT_PRODUCT).unwrap(), "goods");

        let item = Item::new("Advice", "10.00".parse().unwrap());
        let mut line = Line::new("1".parse().unwrap(), item).with_tax(Combo::new("VAT", "standard"));
        normalize_line(&mut line);
        assert_eq!(line.taxes.get(&"VAT".into()).unwrap().ext.get(EXT_PRODUCT).unwrap(), "services");
    }

    #[test]
    fn exempt_combo_needs_a_reason() {
        let mut combo = Combo::new("VAT", "exempt");
        let err = validate_combo(&combo).unwrap_err();
        assert_eq!(err.message("ext.es-tbai-exemption"), Some("required"));
        combo.ext.set(EXT_EXEMPTION, "E2");
        assert!(validate_combo(&combo).is_ok());
        assert!(validate_combo(&Combo::new("VAT", "standard")).is_ok());
    }

    #[test]
    fn invoice_rules() {
        let mut inv = invoice();
        inv.kind = crate::bill::InvoiceType::Corrective;
        inv.customer = Some(Party::new("Cliente"));
        let errs = validate_invoice(&inv).unwrap_err();
        assert_eq!(errs.message("tax"), Some("cannot be blank"));
        assert_eq!(errs.message("customer.tax_id"), Some("cannot be blank"));
        assert_eq!(errs.message("preceding"), Some("cannot be blank"));
        assert_eq!(errs.message("notes"), Some("with key 'general' missing"));

        normalize_invoice(&mut inv);
        inv.customer = Some(Party::new("Cliente").with_tax_id(crate::tax::Identity::new("ES", "")));
        inv.preceding.push(DocumentRef::new("", "001"));
        inv.notes.push(Note::new(NOTE_GENERAL, "Factura"));
        let errs = validate_invoice(&inv).unwrap_err();
        assert!(errs.message("tax").is_none());
        assert_eq!(errs.message("customer.tax_id"), Some("code is required"));
        assert_eq!(errs.message("preceding.0.issue_date"), Some("cannot be blank"));
        assert_eq!(errs.message("preceding.0.ext.es-tbai-correction"), Some("required"));
    }

    #[test]
    fn region_names() {
        assert_eq!(region_code(" Bizkaia "), Some("BI"));
        assert_eq!(region_code("VIZCAYA"), Some("BI"));
        assert_eq!(region_code("araba"), Some("VI"));
        assert_eq!(region_code("Navarra"), None);
    }
}
