//! Spain: VAT with equivalence surcharges, the Canary Islands IGIC, the
//! Ceuta and Melilla IPSI, and retained IRPF.

mod tax_identity;

use chrono::NaiveDate;

use crate::cbc::{Definition, I18nString, NOTE_LEGAL, Note};
use crate::num::Percentage;
use crate::org::Party;
use crate::schema::BILL_INVOICE;
use crate::tax::{
    CategoryDef, CorrectionDefinition, Identity, Object, ObjectMut, RateDef, RateValueDef, RegimeDef, RoundingRule,
    Scenario, ScenarioSet, TAG_REVERSE_CHARGE, TAG_SELF_BILLED,
};
use crate::validation::{Errors, FieldError, Rule, required, validate_struct};

pub use tax_identity::{TaxCodeType, tax_code_type};

pub const CATEGORY_IGIC: &str = "IGIC";
pub const CATEGORY_IPSI: &str = "IPSI";
pub const CATEGORY_IRPF: &str = "IRPF";

/// Rate key suffix for the equivalence surcharge, as in `standard+eqs`.
pub const RATE_EQUIVALENCE: &str = "eqs";
pub const RATE_PRO: &str = "pro";
pub const RATE_PRO_START: &str = "pro-start";
pub const RATE_CAPITAL: &str = "capital";
pub const RATE_MODULES: &str = "modules";

pub const TAG_COPY: &str = "copy";
pub const TAG_SUMMARY: &str = "summary";
pub const TAG_SIMPLIFIED_SCHEME: &str = "simplified-scheme";
pub const TAG_CUSTOMER_ISSUED: &str = "customer-issued";
pub const TAG_TRAVEL_AGENCY: &str = "travel-agency";
pub const TAG_SECOND_HAND_GOODS: &str = "second-hand-goods";
pub const TAG_ART: &str = "art";
pub const TAG_ANTIQUES: &str = "antiques";
pub const TAG_CASH_BASIS: &str = "cash-basis";

/// Stamps issued by the Basque TicketBAI service.
pub const STAMP_TBAI_CODE: &str = "tbai-code";
pub const STAMP_TBAI_QR: &str = "tbai-qr";

pub fn new() -> RegimeDef {
    RegimeDef {
        country: "ES".into(),
        name: I18nString::en("Spain").with("es", "España"),
        currency: "EUR".into(),
        time_zone: "Europe/Madrid".into(),
        rounding: RoundingRule::Precise,
        tags: tags(),
        scenarios: vec![invoice_scenarios()],
        corrections: vec![corrections()],
        categories: categories(),
        normalizer: Some(normalize),
        validator: Some(validate),
        ..Default::default()
    }
}

fn normalize(obj: ObjectMut<'_>) {
    if let ObjectMut::TaxIdentity(id) = obj {
        tax_identity::normalize(id);
    }
}

fn validate(obj: Object<'_>) -> Result<(), Errors> {
    match obj {
        Object::TaxIdentity(id) => tax_identity::validate(id),
        Object::Invoice(inv) => validate_struct()
            .field("supplier", &inv.supplier, vec![supplier_tax_id()])
            .field("customer", &inv.customer, vec![customer_tax_id()])
            .finish(),
        _ => Ok(()),
    }
}

fn tax_id_code_required() -> Rule<'static, Option<Identity>> {
    Box::new(|id: &Option<Identity>| match id {
        Some(id) if id.code.is_empty() => {
            let mut errs = Errors::new();
            errs.add("code", "cannot be blank");
            Err(FieldError::Nested(errs))
        }
        _ => Ok(()),
    })
}

/// Suppliers must always be identified with a tax code.
fn supplier_tax_id() -> Rule<'static, Party> {
    Box::new(|p: &Party| {
        validate_struct()
            .field("tax_id", &p.tax_id, vec![required(), tax_id_code_required()])
            .finish()
            .map_err(FieldError::Nested)
    })
}

/// Spanish customers that give a tax ID must include its code.
fn customer_tax_id() -> Rule<'static, Option<Party>> {
    Box::new(|p: &Option<Party>| {
        let Some(p) = p else { return Ok(()) };
        let spanish = p.tax_id.as_ref().is_some_and(|id| id.country == "ES");
        if !spanish {
            return Ok(());
        }
        validate_struct()
            .field("tax_id", &p.tax_id, vec![tax_id_code_required()])
            .finish()
            .map_err(FieldError::Nested)
    })
}

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

fn pct(v: i64) -> Percentage {
    Percentage::new(v, 3)
}

fn categories() -> Vec<CategoryDef> {
    vec![
        CategoryDef::new("VAT", "IVA", "Impuesto sobre el Valor Añadido").rates(vec![
            RateDef::new("zero", "Zero Rate").values(vec![RateValueDef::new(None, pct(0))]),
            RateDef::new("standard", "Standard Rate").values(vec![
                RateValueDef::new(date(2012, 9, 1), pct(210)),
                RateValueDef::new(date(2010, 7, 1), pct(180)),
                RateValueDef::new(date(1995, 1, 1), pct(160)),
                RateValueDef::new(date(1993, 1, 1), pct(150)),
            ]),
            RateDef::new("standard+eqs", "Standard Rate + Equivalence Surcharge").values(vec![
                RateValueDef::new(date(2012, 9, 1), pct(210)).surcharge(pct(52)),
                RateValueDef::new(date(2010, 7, 1), pct(180)).surcharge(pct(40)),
            ]),
            RateDef::new("reduced", "Reduced Rate").values(vec![
                RateValueDef::new(date(2012, 9, 1), pct(100)),
                RateValueDef::new(date(2010, 7, 1), pct(80)),
                RateValueDef::new(date(1995, 1, 1), pct(70)),
                RateValueDef::new(date(1993, 1, 1), pct(60)),
            ]),
            RateDef::new("reduced+eqs", "Reduced Rate + Equivalence Surcharge").values(vec![
                RateValueDef::new(date(2012, 9, 1), pct(100)).surcharge(pct(14)),
                RateValueDef::new(date(2010, 7, 1), pct(80)).surcharge(pct(10)),
            ]),
            RateDef::new("super-reduced", "Super-Reduced Rate").values(vec![
                RateValueDef::new(date(1995, 1, 1), pct(40)),
                RateValueDef::new(date(1993, 1, 1), pct(30)),
            ]),
            RateDef::new("super-reduced+eqs", "Super-Reduced Rate + Equivalence Surcharge")
                .values(vec![RateValueDef::new(date(1995, 1, 1), pct(40)).surcharge(pct(5))]),
        ]),
        CategoryDef::new(CATEGORY_IGIC, "IGIC", "Impuesto General Indirecto Canario").rates(vec![
            RateDef::new("zero", "Zero Rate").values(vec![RateValueDef::new(None, pct(0))]),
            RateDef::new("standard", "Standard Rate").values(vec![RateValueDef::new(None, pct(70))]),
            RateDef::new("reduced", "Reduced Rate").values(vec![RateValueDef::new(None, pct(30))]),
        ]),
        CategoryDef::new(
            CATEGORY_IPSI,
            "IPSI",
            "Impuesto sobre la Producción, los Servicios y la Importación",
        ),
        CategoryDef::new(CATEGORY_IRPF, "IRPF", "Impuesto sobre la Renta de las Personas Físicas")
            .retained()
            .rates(vec![
                RateDef::new(RATE_PRO, "Professional Rate").values(vec![
                    RateValueDef::new(date(2015, 7, 12), pct(150)),
                    RateValueDef::new(date(2015, 1, 1), pct(190)),
                    RateValueDef::new(date(2012, 9, 1), pct(210)),
                    RateValueDef::new(date(2007, 1, 1), pct(150)),
                ]),
                RateDef::new(RATE_PRO_START, "Professional Starting Rate")
                    .values(vec![RateValueDef::new(date(2007, 1, 1), pct(70))]),
                RateDef::new(RATE_CAPITAL, "Rental or Interest")
                    .values(vec![RateValueDef::new(date(2007, 1, 1), pct(190))]),
                RateDef::new(RATE_MODULES, "Modules Rate").values(vec![RateValueDef::new(date(2007, 1, 1), pct(10))]),
            ]),
    ]
}

fn tags() -> Vec<Definition> {
    vec![
        Definition::key(TAG_COPY, "Copy").name_in("es", "Copia"),
        Definition::key(TAG_SUMMARY, "Summary").name_in("es", "Recapitulativa"),
        Definition::key(TAG_SIMPLIFIED_SCHEME, "Simplified tax scheme").name_in("es", "Contribuyente en régimen simplificado"),
        Definition::key(TAG_CUSTOMER_ISSUED, "Customer issued invoice").name_in("es", "Facturación por el destinatario"),
        Definition::key(TAG_TRAVEL_AGENCY, "Special scheme for travel agencies")
            .name_in("es", "Régimen especial de las agencias de viajes"),
        Definition::key(TAG_SECOND_HAND_GOODS, "Special scheme for second-hand goods")
            .name_in("es", "Régimen especial de los bienes usados"),
        Definition::key(TAG_ART, "Special scheme of works of art").name_in("es", "Régimen especial de los objetos de arte"),
        Definition::key(TAG_ANTIQUES, "Special scheme of antiques and collectables")
            .name_in("es", "Régimen especial de las antigüedades y objetos de colección"),
        Definition::key(TAG_CASH_BASIS, "Special scheme on cash basis").name_in("es", "Régimen especial del criterio de caja"),
    ]
}

fn legal(tag: &str, text: &str) -> Scenario {
    Scenario::new(text)
        .tags(&[tag])
        .note(Note::new(NOTE_LEGAL, text).with_src(tag))
}

fn invoice_scenarios() -> ScenarioSet {
    ScenarioSet {
        schema: BILL_INVOICE,
        list: vec![
            legal(TAG_REVERSE_CHARGE, "Reverse Charge / Inversión del sujeto pasivo."),
            legal(TAG_SIMPLIFIED_SCHEME, "Factura expedida por contibuyente en régimen simplificado."),
            legal(TAG_SELF_BILLED, "Facturación por el destinatario."),
            legal(TAG_TRAVEL_AGENCY, "Régimen especial de las agencias de viajes."),
            legal(TAG_SECOND_HAND_GOODS, "Régimen especial de los bienes usados."),
            legal(TAG_ART, "Régimen especial de los objetos de arte."),
            legal(TAG_ANTIQUES, "Régimen especial de las antigüedades y objetos de colección."),
            legal(TAG_CASH_BASIS, "Régimen especial del criterio de caja."),
        ],
    }
}

/// Correction reasons with their FacturaE codes.
const CORRECTION_KEYS: &[(&str, &str, &str)] = &[
    ("code", "01", "Invoice code"),
    ("series", "02", "Invoice series"),
    ("issue-date", "03", "Issue date"),
    ("supplier-name", "04", "Name and surnames/Corporate name - Issuer (Sender)"),
    ("customer-name", "05", "Name and surnames/Corporate name - Receiver"),
    ("supplier-tax-id", "06", "Issuer's Tax Identification Number"),
    ("customer-tax-id", "07", "Receiver's Tax Identification Number"),
    ("supplier-addr", "08", "Issuer's address"),
    ("customer-addr", "09", "Receiver's address"),
    ("line", "10", "Item line"),
    ("tax-rate", "11", "Applicable Tax Rate"),
    ("tax-amount", "12", "Applicable Tax Amount"),
    ("period", "13", "Applicable Date/Period"),
    ("type", "14", "Invoice Class"),
    ("legal-details", "15", "Legal literals"),
    ("tax-base", "16", "Taxable Base"),
    ("tax", "80", "Calculation of tax outputs"),
    ("tax-retained", "81", "Calculation of tax inputs"),
    ("refund", "82", "Taxable Base modified due to return of packages and packaging materials"),
    ("discount", "83", "Taxable Base modified due to discounts and rebates"),
    ("judicial", "84", "Taxable Base modified due to firm court ruling or administrative decision"),
    ("insolvency", "85", "Taxable Base modified due to unpaid outputs where there is a judgement opening insolvency proceedings"),
];

const CORRECTION_METHODS: &[(&str, &str, &str)] = &[
    ("complete", "01", "Complete"),
    ("partial", "02", "Corrected items only"),
    ("discount", "03", "Bulk deal in a given period"),
    ("authorized", "04", "Authorized by the Tax Agency"),
];

fn facturae_defs(list: &[(&str, &str, &str)]) -> Vec<Definition> {
    list.iter()
        .map(|(key, code, name)| {
            let mut d = Definition::key(key, name);
            d.code = (*code).into();
            d
        })
        .collect()
}

/// Spanish invoices are corrected by issuing a corrective invoice.
fn corrections() -> CorrectionDefinition {
    CorrectionDefinition {
        types: vec!["corrective".into()],
        corrections: facturae_defs(CORRECTION_KEYS),
        methods: facturae_defs(CORRECTION_METHODS),
        ..CorrectionDefinition::new(BILL_INVOICE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cbc::Key;
    use crate::engine::Engine;
    use crate::tax::Context;

    fn rate(key: &str, on: (i32, u32, u32)) -> Option<String> {
        let cat = categories().into_iter().find(|c| c.code == "VAT")?;
        let d = NaiveDate::from_ymd_opt(on.0, on.1, on.2)?;
        let v = cat.rate_def(&Key::from(key))?.value(d, &[], &Default::default())?;
        Some(format!("{}{}", v.percent, v.surcharge.map(|s| format!("+{s}")).unwrap_or_default()))
    }

    #[test]
    fn vat_history() {
        assert_eq!(rate("standard", (2022, 6, 13)).unwrap(), "21.0%");
        assert_eq!(rate("standard", (2011, 1, 1)).unwrap(), "18.0%");
        assert_eq!(rate("standard", (1994, 1, 1)).unwrap(), "15.0%");
        assert!(rate("standard", (1980, 1, 1)).is_none());
        assert_eq!(rate("reduced", (2024, 1, 1)).unwrap(), "10.0%");
        assert_eq!(rate("standard+eqs", (2024, 1, 1)).unwrap(), "21.0%+5.2%");
        assert_eq!(rate("super-reduced+eqs", (2024, 1, 1)).unwrap(), "4.0%+0.5%");
    }

    #[test]
    fn irpf_is_retained() {
        let cats = categories();
        let irpf = cats.iter().find(|c| c.code == CATEGORY_IRPF).unwrap();
        assert!(irpf.retained);
        let pro = irpf.rate_def(&Key::from(RATE_PRO)).unwrap();
        let v = pro.value(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), &[], &Default::default()).unwrap();
        assert_eq!(v.percent.to_string(), "15.0%");
    }

    #[test]
    fn tags_and_corrections() {
        let e = Engine::new();
        let ctx = Context::new(&e, Some(&"ES".into()), &[]).unwrap();
        assert!(ctx.tag_def(&Key::from(TAG_CASH_BASIS)).is_some());
        assert!(ctx.tag_def(&Key::from("reverse-charge")).is_some());
        let cd = ctx.correction_definition(BILL_INVOICE);
        assert!(cd.has_type("corrective"));
        assert!(cd.has_method(&Key::from("complete")));
        assert!(cd.has_correction(&Key::from("line")));
        assert_eq!(cd.corrections.iter().find(|d| d.key == "insolvency").unwrap().code, "85");
    }

    #[test]
    fn legal_note_scenario() {
        let set = invoice_scenarios();
        let s = set.summary_for(&Key::from("standard"), &[Key::from(TAG_TRAVEL_AGENCY)], &[]);
        assert_eq!(s.notes.len(), 1);
        assert_eq!(s.notes[0].text, "Régimen especial de las agencias de viajes.");
        assert_eq!(s.notes[0].src, TAG_TRAVEL_AGENCY);
    }

    #[test]
    fn supplier_needs_tax_code() {
        let mut inv = crate::bill::Invoice::default();
        let errs = validate(Object::Invoice(&inv)).unwrap_err();
        assert_eq!(errs.message("supplier.tax_id"), Some("cannot be blank"));
        inv.supplier.tax_id = Some(Identity::new("ES", ""));
        let errs = validate(Object::Invoice(&inv)).unwrap_err();
        assert_eq!(errs.message("supplier.tax_id.code"), Some("cannot be blank"));
        inv.supplier.tax_id = Some(Identity::new("ES", "B98602642"));
        inv.customer = Some(Party::new("Foreign Co").with_tax_id(Identity::new("DE", "")));
        assert!(validate(Object::Invoice(&inv)).is_ok());
        inv.customer = Some(Party::new("Local").with_tax_id(Identity::new("ES", "")));
        let errs = validate(Object::Invoice(&inv)).unwrap_err();
        assert_eq!(errs.message("customer.tax_id.code"), Some("cannot be blank"));
    }
}
