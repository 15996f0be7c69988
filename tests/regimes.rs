//! Regime behaviour seen through whole documents: tax ID clean up, local
//! identity checks and the registry of compiled-in regimes.

use gobl::bill::{Invoice, Line};
use gobl::engine::engine;
use gobl::l10n::CountryCode;
use gobl::num::Amount;
use gobl::org::{Item, Party};
use gobl::tax::{self, Combo};

fn amt(s: &str) -> Amount {
    s.parse().unwrap()
}

fn invoice(supplier: Party) -> Invoice {
    let mut inv = Invoice {
        series: "R".into(),
        code: "1".into(),
        currency: "EUR".into(),
        issue_date: chrono::NaiveDate::from_ymd_opt(2024, 5, 2),
        supplier,
        ..Default::default()
    };
    inv.lines.push(Line::new(amt("3"), Item::new("Widget", amt("20.00"))).with_tax(Combo::new("VAT", "standard")));
    inv
}

fn validation_message(inv: &Invoice, path: &str) -> Option<String> {
    let err = inv.validate().err()?;
    err.validation_errors()?.message(path).map(str::to_string)
}

#[test]
fn registry_lists_compiled_regimes() {
    let e = engine();
    #[cfg(feature = "es")]
    assert_eq!(e.regime_for_code(&CountryCode::new("es")).unwrap().currency, "EUR");
    #[cfg(feature = "fr")]
    assert!(e.regime_for_code(&CountryCode::new("FR")).is_some());
    assert!(e.regime_for_code(&CountryCode::new("ZZ")).is_none());
}

#[cfg(feature = "es")]
mod spain {
    use super::*;

    fn supplier(code: &str) -> Party {
        Party::new("Provide One S.L.").with_tax_id(tax::Identity::new("ES", code))
    }

    #[test]
    fn tax_code_is_cleaned() {
        let mut inv = invoice(supplier(" es B-98602642 "));
        inv.calculate().unwrap();
        assert_eq!(inv.regime, "ES");
        assert_eq!(inv.supplier.tax_id.as_ref().unwrap().code, "B98602642");
        assert!(inv.validate().is_ok());
    }

    #[test]
    fn leading_zeros_restored() {
        let mut inv = invoice(supplier("1234567L"));
        inv.calculate().unwrap();
        assert_eq!(inv.supplier.tax_id.as_ref().unwrap().code, "01234567L");
        assert!(inv.validate().is_ok());
    }

    #[test]
    fn bad_check_digit() {
        let mut inv = invoice(supplier("B98602643"));
        inv.calculate().unwrap();
        assert_eq!(
            validation_message(&inv, "supplier.tax_id.code").as_deref(),
            Some("invalid check digit")
        );
    }

    #[test]
    fn supplier_needs_tax_code() {
        let mut inv = invoice(supplier(""));
        inv.regime = "ES".into();
        inv.calculate().unwrap();
        assert_eq!(
            validation_message(&inv, "supplier.tax_id.code").as_deref(),
            Some("cannot be blank")
        );
    }

    #[test]
    fn standard_rate_follows_issue_date() {
        let mut inv = invoice(supplier("B98602642"));
        inv.issue_date = chrono::NaiveDate::from_ymd_opt(2011, 3, 1);
        inv.calculate().unwrap();
        let t = inv.totals.as_ref().unwrap();
        assert_eq!(t.taxes.as_ref().unwrap().categories[0].rates[0].percent.unwrap().to_string(), "18.0%");
        assert_eq!(t.payable.to_string(), "70.80");
    }
}

#[cfg(feature = "fr")]
mod france {
    use super::*;
    use gobl::org::Identity;

    fn supplier(code: &str) -> Party {
        Party::new("Fournisseur SAS").with_tax_id(tax::Identity::new("FR", code))
    }

    #[test]
    fn siren_expands_to_vat_code() {
        let mut inv = invoice(supplier("732829320"));
        inv.calculate().unwrap();
        assert_eq!(inv.regime, "FR");
        assert_eq!(inv.supplier.tax_id.as_ref().unwrap().code, "44732829320");
        assert_eq!(inv.totals.as_ref().unwrap().payable.to_string(), "72.00");
        assert!(inv.validate().is_ok());
    }

    #[test]
    fn vat_key_mismatch() {
        let mut inv = invoice(supplier("45732829320"));
        inv.calculate().unwrap();
        assert_eq!(
            validation_message(&inv, "supplier.tax_id.code").as_deref(),
            Some("checksum mismatch")
        );
    }

    #[test]
    fn siret_is_cleaned_and_checked() {
        let mut p = supplier("44732829320");
        p.identities.push(Identity::with_key("siret", "FR 391 838 042 00012"));
        let mut inv = invoice(p);
        inv.calculate().unwrap();
        assert_eq!(inv.supplier.identities[0].code, "39183804200012");
        assert!(inv.validate().is_ok());

        inv.supplier.identities[0].code = "39183804300012".into();
        assert_eq!(
            validation_message(&inv, "supplier.identities.0.code").as_deref(),
            Some("checksum mismatch")
        );
    }
}
