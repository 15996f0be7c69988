//! Spanish tax codes: DNI for nationals, NIE for foreigners and NIF for
//! organisations, each with its own check character.

use std::sync::OnceLock;

use regex::Regex;

use crate::cbc::Code;
use crate::tax::Identity;
use crate::validation::Errors;

const CHECK_LETTERS: &[u8] = b"TRWAGMYFPDXBNJZSQVHLCKE";
const ORG_CHECK_LETTERS: &[u8] = b"JABCDEFGHI";

/// Kind of person or entity a code was issued to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxCodeType {
    National,
    Foreigner,
    Other,
    Org,
}

struct Patterns {
    national: Regex,
    foreigner: Regex,
    other: Regex,
    org: Regex,
}

fn patterns() -> &'static Patterns {
    static RE: OnceLock<Patterns> = OnceLock::new();
    RE.get_or_init(|| Patterns {
        national: Regex::new(r"^[0-9]{8}[A-Z]$").expect("valid national regex"),
        foreigner: Regex::new(r"^[XYZ][0-9]{7}[A-Z]$").expect("valid foreigner regex"),
        other: Regex::new(r"^[KLM][0-9]{7}[0-9JABCDEFGHI]$").expect("valid other regex"),
        org: Regex::new(r"^[ABCDEFGHJNPQRSUVW][0-9]{7}[0-9JABCDEFGHI]$").expect("valid org regex"),
    })
}

/// Classify a normalized code by its shape.
pub fn tax_code_type(code: &str) -> Option<TaxCodeType> {
    let p = patterns();
    if p.national.is_match(code) {
        Some(TaxCodeType::National)
    } else if p.foreigner.is_match(code) {
        Some(TaxCodeType::Foreigner)
    } else if p.other.is_match(code) {
        Some(TaxCodeType::Other)
    } else if p.org.is_match(code) {
        Some(TaxCodeType::Org)
    } else {
        None
    }
}

/// Codes starting with a digit lost their leading zeros somewhere along
/// the way; put them back.
pub(super) fn normalize(id: &mut Identity) {
    let code = id.code.as_str();
    if code.starts_with(|c: char| c.is_ascii_digit()) && code.len() < 9 {
        id.code = Code::from(format!("{code:0>9}"));
    }
}

pub(super) fn validate(id: &Identity) -> Result<(), Errors> {
    if id.code.is_empty() {
        return Ok(());
    }
    let mut errs = Errors::new();
    if let Err(msg) = check(id.code.as_str()) {
        errs.add("code", msg);
    }
    errs.into_result()
}

fn check(code: &str) -> Result<(), &'static str> {
    let valid = match tax_code_type(code).ok_or("invalid format")? {
        TaxCodeType::National => check_national(code),
        TaxCodeType::Foreigner => check_foreigner(code),
        TaxCodeType::Other | TaxCodeType::Org => check_org(code),
    };
    if valid { Ok(()) } else { Err("invalid check digit") }
}

fn letter_for(number: u32) -> u8 {
    CHECK_LETTERS[(number % 23) as usize]
}

fn check_national(code: &str) -> bool {
    let (digits, letter) = code.split_at(8);
    match digits.parse::<u32>() {
        Ok(0) | Err(_) => false,
        Ok(n) => letter.as_bytes()[0] == letter_for(n),
    }
}

fn check_foreigner(code: &str) -> bool {
    let prefix = match code.as_bytes()[0] {
        b'X' => '0',
        b'Y' => '1',
        _ => '2',
    };
    let number = format!("{prefix}{}", &code[1..8]);
    match number.parse::<u32>() {
        Ok(n) => code.as_bytes()[8] == letter_for(n),
        Err(_) => false,
    }
}

fn check_org(code: &str) -> bool {
    let digits = &code.as_bytes()[1..8];
    let mut sum = 0u32;
    for (i, d) in digits.iter().enumerate() {
        let v = u32::from(d - b'0');
        if i % 2 == 0 {
            let doubled = v * 2;
            sum += if doubled > 9 { doubled - 9 } else { doubled };
        } else {
            sum += v;
        }
    }
    let cdc = ((10 - sum % 10) % 10) as usize;
    let last = code.as_bytes()[8];
    last == b'0' + cdc as u8 || last == ORG_CHECK_LETTERS[cdc]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors(code: &str) -> Option<String> {
        validate(&Identity::new("ES", code))
            .err()
            .and_then(|e| e.message("code").map(str::to_string))
    }

    #[test]
    fn valid_codes() {
        for code in ["B98602642", "54387763P", "X3157928M", "Y5148763C", "A58818501", "Q2826000H", "K0867756I"] {
            assert_eq!(errors(code), None, "{code}");
        }
    }

    #[test]
    fn bad_check_digits() {
        for code in ["B98602643", "54387763A", "X3157928A", "A58818502"] {
            assert_eq!(errors(code).as_deref(), Some("invalid check digit"), "{code}");
        }
        assert_eq!(errors("00000000T").as_deref(), Some("invalid check digit"));
    }

    #[test]
    fn bad_format() {
        for code in ["1234", "B9860264", "I98602642", "ABCDEFGHI"] {
            assert_eq!(errors(code).as_deref(), Some("invalid format"), "{code}");
        }
    }

    #[test]
    fn classify() {
        assert_eq!(tax_code_type("54387763P"), Some(TaxCodeType::National));
        assert_eq!(tax_code_type("X3157928M"), Some(TaxCodeType::Foreigner));
        assert_eq!(tax_code_type("K0867756I"), Some(TaxCodeType::Other));
        assert_eq!(tax_code_type("B98602642"), Some(TaxCodeType::Org));
    }

    #[test]
    fn pads_leading_zeros() {
        let mut id = Identity::new("ES", "4387763P");
        normalize(&mut id);
        assert_eq!(id.code, "04387763P");
        let mut id = Identity::new("ES", "B98602642");
        normalize(&mut id);
        assert_eq!(id.code, "B98602642");
    }
}
