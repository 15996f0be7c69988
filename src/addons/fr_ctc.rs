//! French CTC Flow 2, the B2B e-invoicing reform rules layered on top of
//! EN 16931.
//!
//! Whether an invoice is B2B is read from its `BAR` note, and most
//! document specific rules key off the UNTDID document type and the
//! billing mode extension.

use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::bill::{DeliveryDetails, Invoice, Ordering, PaymentDetails, Tax, Totals};
use crate::catalogues::{
    EXT_ISO_SCHEME_ID, EXT_UNTDID_DOCUMENT_TYPE, EXT_UNTDID_REFERENCE, EXT_UNTDID_TEXT_SUBJECT, SchemeId,
};
use crate::cbc::{Code, Definition, I18nString, Note};
use crate::num::Amount;
use crate::org::{DocumentRef, IDENTITY_SCOPE_LEGAL, Identity, Inbox, Party};
use crate::regimes::fr::{IDENTITY_TYPE_SIREN, is_siren, is_siret};
use crate::tax::{AddonDef, Object, ObjectMut, RoundingRule, ext_rules};
use crate::validation::{
    Errors, FieldError, Rule, by, each, length, matches, num_equals, required, required_msg, validate_struct, when,
};

use super::eu_en16931;

pub const KEY: &str = "fr-ctc-v1";

/// Billing framework of the invoice.
pub const EXT_BILLING_MODE: &str = "fr-ctc-billing-mode";

const BILLING_MODES: &[(&str, &str, &str)] = &[
    ("B1", "Goods - Deposit invoice", "Biens - Facture de dépôt"),
    ("B2", "Goods - Already paid invoice", "Biens - Facture déjà payée"),
    ("B4", "Goods - Final invoice (after down payment)", "Biens - Facture définitive (après acompte)"),
    ("B7", "Goods - E-reporting (VAT already collected)", "Biens - E-reporting (TVA déjà collectée)"),
    ("S1", "Services - Deposit invoice", "Services - Facture de dépôt"),
    ("S2", "Services - Already paid invoice", "Services - Facture déjà payée"),
    ("S4", "Services - Final invoice (after down payment)", "Services - Facture définitive (après acompte)"),
    ("S5", "Services - Subcontractor invoice", "Services - Facture de sous-traitance"),
    ("S6", "Services - Co-contractor invoice", "Services - Facture de cotraitance"),
    ("S7", "Services - E-reporting (VAT already collected)", "Services - E-reporting (TVA déjà collectée)"),
    ("M1", "Mixed - Deposit invoice", "Mixte - Facture de dépôt"),
    ("M2", "Mixed - Already paid invoice", "Mixte - Facture déjà payée"),
    ("M4", "Mixed - Final invoice (after down payment)", "Mixte - Facture définitive (après acompte)"),
];

/// Already paid modes.
const FINAL_MODES: &[&str] = &["B2", "S2", "M2"];
/// Final invoices after a down payment.
const FACTORED_MODES: &[&str] = &["B4", "S4", "M4"];

/// BR-FR-04
const DOCUMENT_TYPES: &[&str] = &[
    "380", "389", "393", "501", "386", "500", "384", "471", "472", "473", "261", "262", "381", "396", "502", "503",
];
const SELF_BILLED_TYPES: &[&str] = &["389", "501", "500", "471", "473", "261", "502"];
const CORRECTIVE_TYPES: &[&str] = &["384", "471", "472", "473"];
const CREDIT_NOTE_TYPES: &[&str] = &["261", "381", "396", "502", "503"];
const ADVANCE_TYPES: &[&str] = &["386", "500", "503"];
const CONSOLIDATED_CREDIT_NOTE: &str = "262";

const BAR_TREATMENTS: &[&str] = &["B2B", "B2BINT", "B2C", "OUTOFSCOPE", "ARCHIVEONLY"];
const REQUIRED_NOTES: &[&str] = &["PMT", "PMD", "AAB"];
const UNIQUE_NOTES: &[&str] = &["PMT", "PMD", "AAB", "TXD", "BAR"];
const STC_NOTE_TEXT: &str = "MEMBRE_ASSUJETTI_UNIQUE";

const IDENTITY_KEY_PRIVATE: &str = "private-id";
const INBOX_KEY_PEPPOL: &str = "peppol";

pub fn new() -> AddonDef {
    AddonDef {
        key: KEY.into(),
        requires: vec![eu_en16931::KEY.into()],
        name: I18nString::en("France CTC Flow 2").with("fr", "France CTC Flux 2"),
        extensions: vec![
            Definition::key(EXT_BILLING_MODE, "Billing Mode")
                .name_in("fr", "Cadre de Facturation")
                .desc(
                    "Nature of the goods or services and the payment context. The prefix gives the \
                     nature (B goods, S services, M mixed) and the digit the payment type.",
                )
                .values(
                    BILLING_MODES
                        .iter()
                        .map(|(code, en, fr)| Definition::code(code, en).name_in("fr", fr))
                        .collect(),
                ),
        ],
        normalizer: Some(normalize),
        validator: Some(validate),
        ..Default::default()
    }
}

fn invoice_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9\-+_/]{1,35}$").expect("valid invoice code regex"))
}

fn address_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9+\-_/]+$").expect("valid address regex"))
}

fn normalize(obj: ObjectMut<'_>) {
    match obj {
        ObjectMut::Invoice(inv) => {
            inv.tax.get_or_insert_with(Tax::default).rounding = Some(RoundingRule::Currency);
        }
        ObjectMut::Party(party) => {
            normalize_identities(party);
            normalize_inboxes(party);
        }
        ObjectMut::Identity(id) => {
            if id.key == IDENTITY_KEY_PRIVATE {
                id.ext.set(EXT_ISO_SCHEME_ID, SchemeId::FR_PRIVATE.code);
            }
        }
        _ => {}
    }
}

/// A SIRET implies its SIREN, which becomes the legal identity unless
/// another one already is.
fn normalize_identities(party: &mut Party) {
    if party.identities.is_empty() {
        return;
    }
    if !party.identities.iter().any(is_siren) {
        let siren = party
            .identities
            .iter()
            .find(|id| is_siret(id) && id.code.as_str().len() == 14)
            .map(|id| Identity::new(IDENTITY_TYPE_SIREN, &id.code.as_str()[..9]));
        if let Some(siren) = siren {
            party.identities.push(siren);
        }
    }
    if party.identities.iter().any(|id| id.scope == IDENTITY_SCOPE_LEGAL) {
        return;
    }
    if let Some(siren) = party.identities.iter_mut().find(|id| is_siren(id)) {
        siren.scope = IDENTITY_SCOPE_LEGAL.into();
    }
}

fn normalize_inboxes(party: &mut Party) {
    if party.inboxes.iter().any(|i| i.key == INBOX_KEY_PEPPOL) {
        return;
    }
    if let Some(inbox) = party.inboxes.iter_mut().find(|i| i.scheme == SchemeId::FR_SIREN_ADDRESS.code) {
        inbox.key = INBOX_KEY_PEPPOL.into();
    }
}

fn validate(obj: Object<'_>) -> Result<(), Errors> {
    match obj {
        Object::Invoice(inv) => validate_invoice(inv),
        Object::Party(party) => validate_party(party),
        Object::Inbox(inbox) => validate_inbox(inbox),
        _ => Ok(()),
    }
}

fn doc_type(inv: &Invoice) -> Option<&Code> {
    inv.tax.as_ref().and_then(|t| t.ext.get(EXT_UNTDID_DOCUMENT_TYPE))
}

fn doc_type_in(inv: &Invoice, list: &[&str]) -> bool {
    doc_type(inv).is_some_and(|c| c.in_list(list))
}

fn billing_mode_in(inv: &Invoice, list: &[&str]) -> bool {
    inv.tax
        .as_ref()
        .and_then(|t| t.ext.get(EXT_BILLING_MODE))
        .is_some_and(|c| c.in_list(list))
}

fn note_subject(note: &Note) -> Option<&Code> {
    note.ext.get(EXT_UNTDID_TEXT_SUBJECT)
}

fn is_b2b(inv: &Invoice) -> bool {
    inv.notes
        .iter()
        .any(|n| note_subject(n).is_some_and(|c| c == "BAR") && n.text == "B2B")
}

/// Party registered under the single taxable company scheme.
fn is_stc(party: &Party) -> bool {
    party.identities.iter().any(|id| id.ext.is(EXT_ISO_SCHEME_ID, SchemeId::FR_STC.code))
}

fn party_siren(party: &Party) -> Option<&str> {
    party
        .identities
        .iter()
        .find(|id| id.kind == IDENTITY_TYPE_SIREN || id.ext.is(EXT_ISO_SCHEME_ID, SchemeId::SIREN.code))
        .map(|id| id.code.as_str())
}

fn validate_invoice(inv: &Invoice) -> Result<(), Errors> {
    let b2b = is_b2b(inv);
    let self_billed = doc_type_in(inv, SELF_BILLED_TYPES);
    let corrective = doc_type_in(inv, CORRECTIVE_TYPES);
    let credit_note = doc_type_in(inv, CREDIT_NOTE_TYPES);
    let consolidated = doc_type_in(inv, &[CONSOLIDATED_CREDIT_NOTE]);
    let advance = doc_type_in(inv, ADVANCE_TYPES);
    let final_invoice = billing_mode_in(inv, FINAL_MODES);
    let stc = is_stc(&inv.supplier);

    validate_struct()
        .field("code", &inv.code, vec![document_code(&inv.series)])
        .field(
            "preceding",
            &inv.preceding,
            vec![
                each(vec![preceding_code()]),
                when(
                    corrective,
                    vec![by(|p: &Vec<DocumentRef>| {
                        if p.len() == 1 {
                            Ok(())
                        } else {
                            Err("corrective invoices must have exactly one preceding invoice reference (BR-FR-CO-04)"
                                .to_string())
                        }
                    })],
                ),
                when(
                    credit_note,
                    vec![required_msg(
                        "credit notes must have at least one preceding invoice reference (BR-FR-CO-05)",
                    )],
                ),
            ],
        )
        .field("tax", &inv.tax, vec![required(), invoice_tax()])
        .field("supplier", &inv.supplier, vec![supplier(b2b && !self_billed)])
        .field("customer", &inv.customer, vec![customer(b2b, b2b && self_billed)])
        .field(
            "ordering",
            &inv.ordering,
            vec![
                ordering_references(),
                when(
                    stc,
                    vec![
                        required_msg("ordering with seller is required when supplier is under STC scheme (BR-FR-CO-15)"),
                        ordering_seller(),
                    ],
                ),
                when(
                    consolidated,
                    vec![
                        required_msg("ordering with contracts is required for consolidated credit notes (BR-FR-CO-03)"),
                        ordering_contracts(),
                    ],
                ),
            ],
        )
        .field(
            "payment",
            &inv.payment,
            vec![
                when(!advance && !final_invoice, vec![due_dates_after(inv.issue_date)]),
                when(
                    final_invoice,
                    vec![
                        required_msg("payment details are required for final invoices (BR-FR-CO-09)"),
                        final_payment(),
                    ],
                ),
            ],
        )
        .field(
            "delivery",
            &inv.delivery,
            vec![when(
                consolidated,
                vec![
                    required_msg("delivery details are required for consolidated credit notes (BR-FR-CO-03)"),
                    delivery_period(),
                ],
            )],
        )
        .field("totals", &inv.totals, vec![when(final_invoice, vec![final_totals()])])
        .field(
            "notes",
            &inv.notes,
            vec![
                required_msg("notes are required for French CTC invoices (BR-FR-05)"),
                by(check_notes),
                when(stc, vec![by(check_stc_note)]),
            ],
        )
        .finish()
}

/// BR-FR-01/02: the full identifier is the series and code joined.
fn document_code<'a>(series: &'a Code) -> Rule<'a, Code> {
    by(move |code: &Code| {
        if code.is_empty() {
            return Ok(());
        }
        let id = if series.is_empty() {
            code.to_string()
        } else {
            format!("{series}-{code}")
        };
        if invoice_code_regex().is_match(&id) {
            Ok(())
        } else {
            Err("must be 1-35 characters, alphanumeric plus -+_/ (BR-FR-01/02), including the series".to_string())
        }
    })
}

fn preceding_code() -> Rule<'static, DocumentRef> {
    Box::new(|p: &DocumentRef| {
        validate_struct()
            .field("code", &p.code, vec![document_code(&p.series)])
            .finish()
            .map_err(FieldError::Nested)
    })
}

fn invoice_tax() -> Rule<'static, Option<Tax>> {
    Box::new(|tax: &Option<Tax>| {
        let Some(tax) = tax else { return Ok(()) };
        let factored = tax.ext.get(EXT_BILLING_MODE).is_some_and(|c| c.in_list(FACTORED_MODES));
        validate_struct()
            .field(
                "ext",
                &tax.ext,
                vec![
                    ext_rules::has_codes(EXT_UNTDID_DOCUMENT_TYPE, DOCUMENT_TYPES),
                    ext_rules::require(&[EXT_BILLING_MODE]),
                    // BR-FR-CO-08
                    when(factored, vec![ext_rules::exclude_codes(EXT_UNTDID_DOCUMENT_TYPE, ADVANCE_TYPES)]),
                ],
            )
            .finish()
            .map_err(FieldError::Nested)
    })
}

/// BR-FR-10/11: a SIREN in the ISO scheme with legal scope.
fn has_legal_siren(ids: &Vec<Identity>) -> Result<(), String> {
    let found = ids
        .iter()
        .any(|id| id.ext.is(EXT_ISO_SCHEME_ID, SchemeId::SIREN.code) && id.scope == IDENTITY_SCOPE_LEGAL);
    if found {
        Ok(())
    } else {
        Err("SIREN identity required for French parties with scheme 0002 and scope legal (BR-FR-10/11)".to_string())
    }
}

/// BR-FR-21/22: the electronic address must be the party's SIREN.
fn siren_inbox(party: &Party) -> Result<(), String> {
    let Some(siren) = party_siren(party) else {
        return Ok(());
    };
    let mut found = false;
    for inbox in party.inboxes.iter().filter(|i| i.scheme == SchemeId::FR_SIREN_ADDRESS.code) {
        found = true;
        if !inbox.code.as_str().starts_with(siren) {
            return Err("party endpoint ID scheme inbox (0225) must start with SIREN (BR-FR-21/22)".to_string());
        }
    }
    if found {
        Ok(())
    } else {
        Err("party must have endpoint ID with scheme 0225 (SIREN) (BR-FR-21/22)".to_string())
    }
}

fn supplier(needs_siren_inbox: bool) -> Rule<'static, Party> {
    Box::new(move |p: &Party| {
        let inbox_check = siren_inbox(p);
        validate_struct()
            .field(
                "inboxes",
                &p.inboxes,
                vec![
                    required_msg("seller electronic address required for French B2B invoices (BR-FR-13)"),
                    when(needs_siren_inbox, vec![by(move |_: &Vec<Inbox>| inbox_check.clone())]),
                ],
            )
            .field("identities", &p.identities, vec![by(has_legal_siren)])
            .finish()
            .map_err(FieldError::Nested)
    })
}

fn customer(b2b: bool, needs_siren_inbox: bool) -> Rule<'static, Option<Party>> {
    Box::new(move |p: &Option<Party>| {
        let Some(p) = p else { return Ok(()) };
        let inbox_check = siren_inbox(p);
        validate_struct()
            .field(
                "inboxes",
                &p.inboxes,
                vec![
                    required_msg("buyer electronic address required for French B2B invoices (BR-FR-13)"),
                    when(needs_siren_inbox, vec![by(move |_: &Vec<Inbox>| inbox_check.clone())]),
                ],
            )
            // BR-FR-14
            .field("identities", &p.identities, vec![when(b2b, vec![by(has_legal_siren)])])
            .finish()
            .map_err(FieldError::Nested)
    })
}

/// BR-FR-29/30: at most one ordering identity per `AFL` and `AWW`
/// reference qualifier.
fn ordering_references() -> Rule<'static, Option<Ordering>> {
    Box::new(|o: &Option<Ordering>| {
        let Some(o) = o else { return Ok(()) };
        let mut errs = Errors::new();
        for qualifier in ["AFL", "AWW"] {
            let count = o
                .identities
                .iter()
                .filter(|id| id.ext.get(EXT_UNTDID_REFERENCE).is_some_and(|c| c == qualifier))
                .count();
            if count > 1 {
                errs.add(
                    "identities",
                    format!("only one ordering identity with UNTDID reference '{qualifier}' is allowed (BR-FR-30)"),
                );
            }
        }
        errs.into_result().map_err(FieldError::Nested)
    })
}

/// BR-FR-29 and BR-FR-CO-15: STC suppliers name the seller with its tax code.
fn ordering_seller() -> Rule<'static, Option<Ordering>> {
    Box::new(|o: &Option<Ordering>| {
        let Some(o) = o else { return Ok(()) };
        let seller_ok = match &o.seller {
            None => Err("seller is required when supplier is under STC scheme (BR-FR-CO-15)"),
            Some(s) => match &s.tax_id {
                None => Err("tax ID is required when supplier is under STC scheme (BR-FR-CO-15)"),
                Some(id) if id.code.is_empty() => {
                    Err("code is required when supplier is under STC scheme (BR-FR-CO-15)")
                }
                Some(_) => Ok(()),
            },
        };
        let mut errs = Errors::new();
        if let Err(msg) = seller_ok {
            errs.add("seller", msg);
        }
        errs.into_result().map_err(FieldError::Nested)
    })
}

fn ordering_contracts() -> Rule<'static, Option<Ordering>> {
    Box::new(|o: &Option<Ordering>| {
        let Some(o) = o else { return Ok(()) };
        validate_struct()
            .field(
                "contracts",
                &o.contracts,
                vec![required_msg(
                    "at least one contract reference is required in ordering details for consolidated credit notes (BR-FR-CO-03)",
                )],
            )
            .finish()
            .map_err(FieldError::Nested)
    })
}

fn delivery_period() -> Rule<'static, Option<DeliveryDetails>> {
    Box::new(|d: &Option<DeliveryDetails>| {
        let Some(d) = d else { return Ok(()) };
        validate_struct()
            .field(
                "period",
                &d.period,
                vec![required_msg("delivery period is required for consolidated credit notes (BR-FR-CO-03)")],
            )
            .finish()
            .map_err(FieldError::Nested)
    })
}

/// BR-FR-CO-07: due dates may not precede the issue date.
fn due_dates_after(issue_date: Option<NaiveDate>) -> Rule<'static, Option<PaymentDetails>> {
    Box::new(move |pd: &Option<PaymentDetails>| {
        let (Some(issued), Some(terms)) = (issue_date, pd.as_ref().and_then(|pd| pd.terms.as_ref())) else {
            return Ok(());
        };
        let mut dates = Errors::new();
        for (i, dd) in terms.due_dates.iter().enumerate() {
            if dd.date < issued {
                let mut e = Errors::new();
                e.add("date", format!("must be on or after the issue date {issued} (BR-FR-CO-07)"));
                dates.nest(i.to_string(), Err(e));
            }
        }
        let mut errs = Errors::new();
        let mut t = Errors::new();
        t.nest("due_dates", dates.into_result());
        errs.nest("terms", t.into_result());
        errs.into_result().map_err(FieldError::Nested)
    })
}

/// BR-FR-CO-09: already paid invoices still state when payment was due.
fn final_payment() -> Rule<'static, Option<PaymentDetails>> {
    Box::new(|pd: &Option<PaymentDetails>| {
        let Some(pd) = pd else { return Ok(()) };
        let mut errs = Errors::new();
        match &pd.terms {
            None => errs.add("terms", "payment terms required for final invoices (BR-FR-CO-09)"),
            Some(t) if t.due_dates.is_empty() => {
                let mut e = Errors::new();
                e.add("due_dates", "at least one due date required for final invoices (BR-FR-CO-09)");
                errs.nest("terms", Err(e));
            }
            Some(_) => {}
        }
        errs.into_result().map_err(FieldError::Nested)
    })
}

/// BR-FR-CO-09: advances cover the whole amount and nothing is left to pay.
fn final_totals() -> Rule<'static, Option<Totals>> {
    Box::new(|t: &Option<Totals>| {
        let Some(t) = t else { return Ok(()) };
        let zero = Amount::zero(t.payable.exp());
        validate_struct()
            .field(
                "advance",
                &t.advances,
                vec![
                    required_msg("advance amount is required for already-paid invoices (BR-FR-CO-09)"),
                    num_equals(t.total_with_tax),
                ],
            )
            .field("due", &t.due, vec![num_equals(zero)])
            .field("payable", &t.payable, vec![when(t.due.is_none(), vec![num_equals(zero)])])
            .finish()
            .map_err(FieldError::Nested)
    })
}

/// BR-FR-05, BR-FR-06 and BR-FR-30 over note text subjects.
fn check_notes(notes: &Vec<Note>) -> Result<(), String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for code in notes.iter().filter_map(note_subject) {
        *counts.entry(code.as_str()).or_default() += 1;
    }
    let count = |code: &str| counts.get(code).copied().unwrap_or_default();

    let missing: Vec<&str> = REQUIRED_NOTES.iter().copied().filter(|c| count(c) == 0).collect();
    if !missing.is_empty() {
        return Err(format!("missing required note codes: {} (BR-FR-05)", missing.join(", ")));
    }
    let dups: Vec<&str> = UNIQUE_NOTES.iter().copied().filter(|c| count(c) > 1).collect();
    if !dups.is_empty() {
        return Err(format!("duplicate note codes found: {} (BR-FR-06/BR-FR-30)", dups.join(", ")));
    }
    let bad_bar = notes.iter().any(|n| {
        note_subject(n).is_some_and(|c| c == "BAR") && !n.text.is_empty() && !BAR_TREATMENTS.contains(&n.text.as_str())
    });
    if bad_bar {
        return Err(format!("BAR note text must be one of: {}", BAR_TREATMENTS.join(", ")));
    }
    Ok(())
}

/// BR-FR-CO-14
fn check_stc_note(notes: &Vec<Note>) -> Result<(), String> {
    if notes.iter().any(|n| note_subject(n).is_some_and(|c| c == "TXD") && n.text == STC_NOTE_TEXT) {
        Ok(())
    } else {
        Err(format!(
            "for sellers with STC scheme (0231), a note with code 'TXD' and text '{STC_NOTE_TEXT}' is required (BR-FR-CO-14)"
        ))
    }
}

fn validate_party(party: &Party) -> Result<(), Errors> {
    validate_struct()
        .field("identities", &party.identities, vec![by(siret_matches_siren), by(identity_schemes)])
        .finish()
}

/// BR-FR-09/10
fn siret_matches_siren(ids: &Vec<Identity>) -> Result<(), String> {
    let siret = ids.iter().rev().find(|id| is_siret(id)).map(|id| id.code.as_str());
    let siren = ids.iter().rev().find(|id| is_siren(id)).map(|id| id.code.as_str());
    match (siret, siren) {
        (Some(siret), Some(siren)) if siret.len() == 14 && siren.len() == 9 && !siret.starts_with(siren) => {
            Err("SIRET must start with the same 9 digits as SIREN (BR-FR-09/10)".to_string())
        }
        _ => Ok(()),
    }
}

/// BR-FR-CO-10 with the private identifier format of BR-FR-24/26.
fn identity_schemes(ids: &Vec<Identity>) -> Result<(), String> {
    let mut seen = Vec::new();
    for id in ids {
        let Some(scheme) = id.ext.get(EXT_ISO_SCHEME_ID) else {
            return Err("all identities must have an ISO scheme ID defined in extensions BR-FR-CO-10".to_string());
        };
        if seen.contains(&scheme) {
            return Err(format!(
                "duplicate identities with ISO scheme ID '{scheme}' are not allowed (BR-FR-CO-10)"
            ));
        }
        seen.push(scheme);
        let code = id.code.as_str();
        if scheme != SchemeId::FR_PRIVATE.code || code.is_empty() {
            continue;
        }
        if code.len() > 100 {
            return Err(
                "identity with ISO scheme ID 0224 (private-id) must not exceed 100 characters (BR-FR-26)".to_string(),
            );
        }
        if !address_regex().is_match(code) {
            return Err("identity with ISO scheme ID 0224 (private-id) must contain only alphanumeric characters and +, -, _, / (BR-FR-24)".to_string());
        }
    }
    Ok(())
}

fn validate_inbox(inbox: &Inbox) -> Result<(), Errors> {
    let siren_address = inbox.scheme == SchemeId::FR_SIREN_ADDRESS.code;
    let code = inbox.code.to_string();
    validate_struct()
        .field("code", &code, vec![when(siren_address, vec![length(0, 125), matches(address_regex())])])
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pay::{DueDate, Terms};

    fn subject_note(code: &str, text: &str) -> Note {
        let mut n = Note::new("", text);
        n.ext.set(EXT_UNTDID_TEXT_SUBJECT, code);
        n
    }

    fn siren(code: &str) -> Identity {
        let mut id = Identity::new(IDENTITY_TYPE_SIREN, code).scope(IDENTITY_SCOPE_LEGAL);
        id.ext.set(EXT_ISO_SCHEME_ID, SchemeId::SIREN.code);
        id
    }

    fn b2b_invoice() -> Invoice {
        let mut inv = Invoice::default();
        inv.code = "FAC-001".into();
        let mut tax = Tax::default();
        tax.ext.set(EXT_UNTDID_DOCUMENT_TYPE, "380");
        tax.ext.set(EXT_BILLING_MODE, "S1");
        inv.tax = Some(tax);
        inv.supplier.identities.push(siren("356000000"));
        inv.supplier.inboxes.push(Inbox::new("0225", "356000000"));
        let mut customer = Party::new("Client");
        customer.identities.push(siren("732829320"));
        customer.inboxes.push(Inbox::new("0225", "732829320_ACHATS"));
        inv.customer = Some(customer);
        inv.notes = vec![
            subject_note("PMT", "Indemnité forfaitaire pour frais de recouvrement: 40 EUR"),
            subject_note("PMD", "Pénalités de retard: 3 fois le taux d'intérêt légal"),
            subject_note("AAB", "Pas d'escompte"),
            subject_note("BAR", "B2B"),
        ];
        inv
    }

    #[test]
    fn valid_b2b_invoice() {
        assert!(validate_invoice(&b2b_invoice()).is_ok());
    }

    #[test]
    fn supplier_needs_siren_inbox() {
        let mut inv = b2b_invoice();
        inv.supplier.inboxes = vec![Inbox::new("0088", "1234567890128")];
        let errs = validate_invoice(&inv).unwrap_err();
        let msg = errs.message("supplier.inboxes").unwrap();
        assert!(msg.contains("BR-FR-21"), "{msg}");

        inv.supplier.inboxes = vec![Inbox::new("0225", "999999999")];
        let errs = validate_invoice(&inv).unwrap_err();
        assert!(errs.message("supplier.inboxes").unwrap().contains("must start with SIREN"));
    }

    #[test]
    fn no_siren_inbox_outside_b2b() {
        let mut inv = b2b_invoice();
        inv.supplier.inboxes = vec![Inbox::new("0088", "1234567890128")];
        inv.notes[3].text = "B2C".into();
        assert!(validate_invoice(&inv).is_ok());
    }

    #[test]
    fn invoice_codes() {
        let mut inv = b2b_invoice();
        inv.code = "FAC 001".into();
        assert!(validate_invoice(&inv).unwrap_err().message("code").unwrap().contains("BR-FR-01/02"));
        inv.code = "A".repeat(30).as_str().into();
        inv.series = "SERIES".into();
        assert!(validate_invoice(&inv).is_err());
        inv.series = Code::default();
        assert!(validate_invoice(&inv).is_ok());
    }

    #[test]
    fn document_types_and_modes() {
        let mut inv = b2b_invoice();
        inv.tax.as_mut().unwrap().ext.set(EXT_UNTDID_DOCUMENT_TYPE, "325");
        let errs = validate_invoice(&inv).unwrap_err();
        assert_eq!(errs.message("tax.ext.untdid-document-type"), Some("value '325' invalid"));

        let mut inv = b2b_invoice();
        inv.tax.as_mut().unwrap().ext.delete(EXT_BILLING_MODE);
        let errs = validate_invoice(&inv).unwrap_err();
        assert_eq!(errs.message("tax.ext.fr-ctc-billing-mode"), Some("required"));

        let mut inv = b2b_invoice();
        let ext = &mut inv.tax.as_mut().unwrap().ext;
        ext.set(EXT_BILLING_MODE, "B4");
        ext.set(EXT_UNTDID_DOCUMENT_TYPE, "386");
        let errs = validate_invoice(&inv).unwrap_err();
        assert_eq!(errs.message("tax.ext.untdid-document-type"), Some("value '386' not allowed"));
    }

    #[test]
    fn preceding_references() {
        let mut inv = b2b_invoice();
        inv.tax.as_mut().unwrap().ext.set(EXT_UNTDID_DOCUMENT_TYPE, "381");
        let errs = validate_invoice(&inv).unwrap_err();
        assert!(errs.message("preceding").unwrap().contains("BR-FR-CO-05"));

        inv.tax.as_mut().unwrap().ext.set(EXT_UNTDID_DOCUMENT_TYPE, "384");
        inv.preceding = vec![DocumentRef::new("", "F1"), DocumentRef::new("", "F2")];
        let errs = validate_invoice(&inv).unwrap_err();
        assert!(errs.message("preceding").unwrap().contains("BR-FR-CO-04"));

        inv.preceding = vec![DocumentRef::new("", "F 1")];
        let errs = validate_invoice(&inv).unwrap_err();
        assert!(errs.message("preceding.0.code").unwrap().contains("BR-FR-01/02"));
    }

    #[test]
    fn notes() {
        let mut inv = b2b_invoice();
        inv.notes.remove(1);
        let errs = validate_invoice(&inv).unwrap_err();
        assert_eq!(errs.message("notes"), Some("missing required note codes: PMD (BR-FR-05)"));

        let mut inv = b2b_invoice();
        inv.notes.push(subject_note("AAB", "Escompte 2%"));
        let errs = validate_invoice(&inv).unwrap_err();
        assert_eq!(errs.message("notes"), Some("duplicate note codes found: AAB (BR-FR-06/BR-FR-30)"));

        let mut inv = b2b_invoice();
        inv.notes[3].text = "B2X".into();
        assert!(validate_invoice(&inv).unwrap_err().message("notes").unwrap().starts_with("BAR note text"));

        let mut inv = b2b_invoice();
        inv.notes.clear();
        let errs = validate_invoice(&inv).unwrap_err();
        assert_eq!(errs.message("notes"), Some("notes are required for French CTC invoices (BR-FR-05)"));
    }

    #[test]
    fn stc_supplier() {
        let mut inv = b2b_invoice();
        let mut stc = Identity::new("", "123456789");
        stc.ext.set(EXT_ISO_SCHEME_ID, SchemeId::FR_STC.code);
        inv.supplier.identities.push(stc);
        let errs = validate_invoice(&inv).unwrap_err();
        assert!(errs.message("ordering").unwrap().contains("BR-FR-CO-15"));
        assert!(errs.message("notes").unwrap().contains("BR-FR-CO-14"));

        inv.ordering = Some(Ordering {
            seller: Some(Party::new("Membre")),
            ..Default::default()
        });
        inv.notes.push(subject_note("TXD", STC_NOTE_TEXT));
        let errs = validate_invoice(&inv).unwrap_err();
        assert_eq!(
            errs.message("ordering.seller"),
            Some("tax ID is required when supplier is under STC scheme (BR-FR-CO-15)")
        );
        assert!(!errs.contains("notes"));
    }

    #[test]
    fn ordering_reference_qualifiers() {
        let reference = |qualifier: &str, code: &str| {
            let mut id = Identity::new("", code);
            id.ext.set(EXT_UNTDID_REFERENCE, qualifier);
            id
        };
        let mut inv = b2b_invoice();
        inv.ordering = Some(Ordering {
            identities: vec![reference("AFL", "F-2024-001"), reference("AWW", "FUND-9")],
            ..Default::default()
        });
        assert!(validate_invoice(&inv).err().is_none_or(|e| !e.contains("ordering")));

        if let Some(o) = inv.ordering.as_mut() {
            o.identities.push(reference("AFL", "F-2024-002"));
        }
        let errs = validate_invoice(&inv).unwrap_err();
        assert_eq!(
            errs.message("ordering.identities"),
            Some("only one ordering identity with UNTDID reference 'AFL' is allowed (BR-FR-30)")
        );
    }

    #[test]
    fn final_invoices() {
        let mut inv = b2b_invoice();
        inv.tax.as_mut().unwrap().ext.set(EXT_BILLING_MODE, "S2");
        inv.totals = Some(Totals {
            total_with_tax: Amount::new(12000, 2),
            payable: Amount::new(12000, 2),
            ..Default::default()
        });
        let errs = validate_invoice(&inv).unwrap_err();
        assert!(errs.message("payment").unwrap().contains("BR-FR-CO-09"));
        assert!(errs.message("totals.advance").unwrap().contains("BR-FR-CO-09"));

        inv.payment = Some(PaymentDetails {
            terms: Some(Terms::default()),
            ..Default::default()
        });
        let errs = validate_invoice(&inv).unwrap_err();
        assert!(errs.message("payment.terms.due_dates").unwrap().contains("BR-FR-CO-09"));

        inv.payment.as_mut().unwrap().terms.as_mut().unwrap().due_dates.push(DueDate {
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            ..Default::default()
        });
        let totals = inv.totals.as_mut().unwrap();
        totals.advances = Some(Amount::new(12000, 2));
        totals.due = Some(Amount::new(0, 2));
        assert!(validate_invoice(&inv).is_ok());
    }

    #[test]
    fn due_dates_not_before_issue() {
        let mut inv = b2b_invoice();
        inv.issue_date = NaiveDate::from_ymd_opt(2025, 3, 10);
        inv.payment = Some(PaymentDetails {
            terms: Some(Terms {
                due_dates: vec![DueDate {
                    date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                    ..Default::default()
                }],
                ..Default::default()
            }),
            ..Default::default()
        });
        let errs = validate_invoice(&inv).unwrap_err();
        assert!(errs.message("payment.terms.due_dates.0.date").unwrap().contains("BR-FR-CO-07"));
    }

    #[test]
    fn siren_from_siret() {
        let mut p = Party::new("Boutique");
        p.identities.push(Identity::new("SIRET", "35600000012345"));
        normalize(ObjectMut::Party(&mut p));
        assert_eq!(p.identities.len(), 2);
        assert_eq!(p.identities[1].kind, "SIREN");
        assert_eq!(p.identities[1].code, "356000000");
        assert_eq!(p.identities[1].scope, IDENTITY_SCOPE_LEGAL);
    }

    #[test]
    fn peppol_inbox_and_private_id() {
        let mut p = Party::new("Boutique");
        p.inboxes.push(Inbox::new("0088", "1234567890128"));
        p.inboxes.push(Inbox::new("0225", "356000000"));
        normalize(ObjectMut::Party(&mut p));
        assert_eq!(p.inboxes[1].key, "peppol");
        assert!(p.inboxes[0].key.is_empty());

        let mut id = Identity::with_key("private-id", "ABC-123");
        normalize(ObjectMut::Identity(&mut id));
        assert!(id.ext.is(EXT_ISO_SCHEME_ID, "0224"));
    }

    #[test]
    fn party_identity_rules() {
        let mut p = Party::new("Boutique");
        p.identities.push(siren("356000000"));
        let mut siret = Identity::new("SIRET", "73282932000000");
        siret.ext.set(EXT_ISO_SCHEME_ID, SchemeId::SIRET.code);
        p.identities.push(siret);
        let errs = validate_party(&p).unwrap_err();
        assert!(errs.message("identities").unwrap().contains("BR-FR-09/10"));

        p.identities[1].code = "35600000012345".into();
        assert!(validate_party(&p).is_ok());

        p.identities.push(Identity::new("RCS", "Paris B 356 000 000"));
        assert!(validate_party(&p).unwrap_err().message("identities").unwrap().contains("BR-FR-CO-10"));

        p.identities.pop();
        p.identities.push(siren("356000000"));
        assert!(validate_party(&p).unwrap_err().message("identities").unwrap().contains("duplicate"));

        p.identities.pop();
        let mut private = Identity::with_key("private-id", "bad code!");
        private.ext.set(EXT_ISO_SCHEME_ID, SchemeId::FR_PRIVATE.code);
        p.identities.push(private);
        assert!(validate_party(&p).unwrap_err().message("identities").unwrap().contains("BR-FR-24"));
    }

    #[test]
    fn siren_inbox_format() {
        assert!(validate_inbox(&Inbox::new("0225", "356000000_FACT")).is_ok());
        assert!(validate_inbox(&Inbox::new("0225", "356000000 FACT")).is_err());
        assert!(validate_inbox(&Inbox::new("0088", "anything goes")).is_ok());
    }
}
