use chrono::NaiveDate;
use tracing::debug;

use crate::cbc::{Code, Key, Stamp, add_stamp, stamp_for};
use crate::engine::{Engine, engine};
use crate::error::GoblError;
use crate::org::DocumentRef;
use crate::schema::BILL_INVOICE;
use crate::tax::{CorrectionDefinition, Extensions};

use super::{Invoice, InvoiceType};

/// How an invoice should be corrected.
///
/// With no flags a corrective invoice is produced. Regimes that do not
/// accept credit notes turn a credit request into a corrective invoice with
/// inverted amounts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrectionOptions {
    pub credit: bool,
    pub debit: bool,
    pub corrective: bool,
    /// Issue date of the correction; today when not set.
    pub issue_date: Option<NaiveDate>,
    /// Series for the correction, when it differs from the original.
    pub series: Option<Code>,
    /// Stamps received for the original invoice.
    pub stamps: Vec<Stamp>,
    pub reason: String,
    pub corrections: Vec<Key>,
    pub method: Key,
    pub ext: Extensions,
}

impl CorrectionOptions {
    pub fn credit() -> Self {
        Self {
            credit: true,
            ..Default::default()
        }
    }

    pub fn debit() -> Self {
        Self {
            debit: true,
            ..Default::default()
        }
    }

    pub fn corrective() -> Self {
        Self {
            corrective: true,
            ..Default::default()
        }
    }

    pub fn reason(mut self, reason: &str) -> Self {
        self.reason = reason.to_string();
        self
    }

    pub fn issue_date(mut self, date: NaiveDate) -> Self {
        self.issue_date = Some(date);
        self
    }

    pub fn series(mut self, series: &str) -> Self {
        self.series = Some(Code::from(series));
        self
    }

    pub fn stamp(mut self, stamp: Stamp) -> Self {
        add_stamp(&mut self.stamps, stamp);
        self
    }

    pub fn corrections(mut self, keys: &[&str]) -> Self {
        self.corrections = keys.iter().map(|k| Key::from(*k)).collect();
        self
    }

    pub fn method(mut self, method: &str) -> Self {
        self.method = Key::from(method);
        self
    }

    pub fn ext(mut self, ext: Extensions) -> Self {
        self.ext = ext;
        self
    }
}

impl Invoice {
    /// Turn this invoice into the document that corrects it, linked to the
    /// original through `preceding`.
    pub fn correct(&mut self, opts: CorrectionOptions) -> Result<(), GoblError> {
        self.correct_with(engine(), opts)
    }

    pub fn correct_with(&mut self, engine: &Engine, opts: CorrectionOptions) -> Result<(), GoblError> {
        if opts.credit && opts.debit {
            return Err(GoblError::Correction("cannot use both credit and debit options".into()));
        }
        if self.code.is_empty() {
            return Err(GoblError::Correction("cannot correct an invoice without a code".into()));
        }
        if self.totals.is_none() {
            self.calculate_with(engine)?;
        }
        let ctx = self.context(engine)?;
        let def = ctx.correction_definition(BILL_INVOICE);
        let (kind, invert) = correction_type(&def, &opts)?;
        check_options(&def, &opts)?;

        let mut pre = DocumentRef {
            uuid: self.uuid,
            kind: self.kind.key(),
            issue_date: self.issue_date,
            series: self.series.clone(),
            code: self.code.clone(),
            reason: opts.reason.trim().to_string(),
            corrections: opts.corrections.clone(),
            correction_method: opts.method.clone(),
            ext: opts.ext.clone(),
            ..Default::default()
        };
        for key in &def.stamps {
            let stamp = stamp_for(&opts.stamps, key)
                .ok_or_else(|| GoblError::Correction(format!("missing stamp: {key}")))?;
            add_stamp(&mut pre.stamps, stamp.clone());
        }
        if def.copy_tax {
            if let Some(t) = &self.totals {
                pre.tax = t.taxes.clone();
                pre.payable = Some(t.payable);
            }
        }
        debug!(code = %self.code, kind = %kind, invert, "correcting invoice");

        self.uuid = None;
        self.kind = kind;
        self.code = Code::EMPTY;
        if let Some(series) = opts.series {
            self.series = series;
        }
        self.issue_date = Some(opts.issue_date.unwrap_or_else(|| ctx.today()));
        self.preceding = vec![pre];

        self.calculate_with(engine)?;
        if invert {
            self.invert_with(engine)?;
        }
        Ok(())
    }
}

/// Document type of the correction and whether amounts must be inverted.
fn correction_type(def: &CorrectionDefinition, opts: &CorrectionOptions) -> Result<(InvoiceType, bool), GoblError> {
    let wanted = if opts.credit {
        InvoiceType::CreditNote
    } else if opts.debit {
        InvoiceType::DebitNote
    } else {
        InvoiceType::Corrective
    };
    if def.types.is_empty() || def.has_type(wanted.as_str()) {
        return Ok((wanted, false));
    }
    match wanted {
        InvoiceType::CreditNote if def.has_type(InvoiceType::Corrective.as_str()) => {
            Ok((InvoiceType::Corrective, true))
        }
        InvoiceType::DebitNote if def.has_type(InvoiceType::Corrective.as_str()) => {
            Ok((InvoiceType::Corrective, false))
        }
        _ => Err(GoblError::Correction(format!("invalid correction type: {wanted}"))),
    }
}

fn check_options(def: &CorrectionDefinition, opts: &CorrectionOptions) -> Result<(), GoblError> {
    if def.reason_required && opts.reason.trim().is_empty() {
        return Err(GoblError::Correction("missing corrective reason".into()));
    }
    if !def.corrections.is_empty() {
        if let Some(k) = opts.corrections.iter().find(|k| !def.has_correction(k)) {
            return Err(GoblError::Correction(format!("invalid correction key: {k}")));
        }
    }
    if !def.methods.is_empty() && !opts.method.is_empty() && !def.has_method(&opts.method) {
        return Err(GoblError::Correction(format!("invalid correction method: {}", opts.method)));
    }
    if !def.extensions.is_empty() {
        if let Some(k) = opts.ext.keys().find(|k| !def.has_extension(k)) {
            return Err(GoblError::Correction(format!("invalid correction extension: {k}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bill::Line;
    use crate::cbc::Definition;
    use crate::org::{Item, Party};
    use crate::tax::{self, Combo};

    fn invoice() -> Invoice {
        let mut inv = Invoice {
            series: "TEST".into(),
            code: "123".into(),
            currency: "EUR".into(),
            issue_date: NaiveDate::from_ymd_opt(2022, 6, 13),
            supplier: Party::new("Provide One S.L.").with_tax_id(tax::Identity::new("ES", "B98602642")),
            ..Default::default()
        };
        inv.lines.push(
            Line::new("10".parse().unwrap(), Item::new("Development services", "100.00".parse().unwrap()))
                .with_tax(Combo::new("VAT", "standard")),
        );
        inv
    }

    #[test]
    fn credit_and_debit_conflict() {
        let mut inv = invoice();
        let opts = CorrectionOptions {
            credit: true,
            debit: true,
            ..Default::default()
        };
        let err = inv.correct_with(&Engine::new(), opts).unwrap_err();
        assert_eq!(err.to_string(), "correction: cannot use both credit and debit options");
    }

    #[test]
    fn needs_code() {
        let mut inv = invoice();
        inv.code = Code::EMPTY;
        let err = inv.correct_with(&Engine::new(), CorrectionOptions::credit()).unwrap_err();
        assert_eq!(err.to_string(), "correction: cannot correct an invoice without a code");
    }

    #[test]
    fn type_resolution() {
        let mut def = CorrectionDefinition::new(BILL_INVOICE);
        assert_eq!(
            correction_type(&def, &CorrectionOptions::credit()).unwrap(),
            (InvoiceType::CreditNote, false)
        );
        def.types = vec![Key::from("corrective")];
        assert_eq!(
            correction_type(&def, &CorrectionOptions::credit()).unwrap(),
            (InvoiceType::Corrective, true)
        );
        assert_eq!(
            correction_type(&def, &CorrectionOptions::debit()).unwrap(),
            (InvoiceType::Corrective, false)
        );
        def.types = vec![Key::from("credit-note")];
        let err = correction_type(&def, &CorrectionOptions::debit()).unwrap_err();
        assert_eq!(err.to_string(), "correction: invalid correction type: debit-note");
    }

    #[test]
    fn option_checks() {
        let mut def = CorrectionDefinition::new(BILL_INVOICE);
        def.reason_required = true;
        def.corrections = vec![Definition::key("line", "Line")];
        let err = check_options(&def, &CorrectionOptions::credit()).unwrap_err();
        assert_eq!(err.to_string(), "correction: missing corrective reason");
        let opts = CorrectionOptions::credit().reason("refund").corrections(&["tax-rate"]);
        let err = check_options(&def, &opts).unwrap_err();
        assert_eq!(err.to_string(), "correction: invalid correction key: tax-rate");
        let opts = CorrectionOptions::credit().reason("refund").corrections(&["line"]);
        assert!(check_options(&def, &opts).is_ok());
    }

    #[cfg(feature = "es")]
    #[test]
    fn spanish_credit_becomes_inverted_corrective() {
        let e = Engine::new();
        let mut inv = invoice();
        inv.calculate_with(&e).unwrap();
        let opts = CorrectionOptions::credit()
            .reason("test refund")
            .method("complete")
            .corrections(&["line"]);
        inv.correct_with(&e, opts).unwrap();
        assert_eq!(inv.kind, InvoiceType::Corrective);
        assert_eq!(inv.lines[0].quantity.to_string(), "-10");
        assert_eq!(inv.totals.as_ref().unwrap().payable.to_string(), "-1210.00");
        assert!(inv.code.is_empty());
        let pre = &inv.preceding[0];
        assert_eq!(pre.series, "TEST");
        assert_eq!(pre.code, "123");
        assert_eq!(pre.issue_date, NaiveDate::from_ymd_opt(2022, 6, 13));
        assert_eq!(pre.reason, "test refund");
        assert_ne!(inv.issue_date, NaiveDate::from_ymd_opt(2022, 6, 13));
    }
}
