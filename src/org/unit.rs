//! Units of measure for item quantities.
//!
//! Units are written as short lowercase keys (`h`, `kg`, `item`) and map
//! onto UN/ECE Recommendation 20 codes for e-invoicing formats. Any
//! Rec 20 code may also be used directly (`KWH`, `C62`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// A unit key or a UN/ECE Rec 20 code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Unit(String);

impl Unit {
    pub fn new(unit: impl Into<String>) -> Self {
        Self(unit.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// UN/ECE Rec 20 code for this unit.
    pub fn unece(&self) -> Option<&str> {
        match UNIT_KEYS.binary_search_by(|(key, _)| key.cmp(&self.0.as_str())) {
            Ok(i) => Some(UNIT_KEYS[i].1),
            Err(_) if is_rec20_code(&self.0) => Some(self.0.as_str()),
            Err(_) => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_empty() || self.unece().is_some()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Unit {
    fn from(unit: &str) -> Self {
        Self::new(unit)
    }
}

/// Two or three uppercase letters or digits, the shape of every Rec 20
/// code.
fn is_rec20_code(code: &str) -> bool {
    (2..=3).contains(&code.len()) && code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Unit keys and their Rec 20 codes, sorted by key for binary search.
static UNIT_KEYS: &[(&str, &str)] = &[
    ("a", "AMP"),
    ("bag", "XBG"),
    ("bottle", "XBO"),
    ("box", "XBX"),
    ("can", "XCA"),
    ("carton", "XCT"),
    ("case", "XCS"),
    ("cl", "CLT"),
    ("cm", "CMT"),
    ("cm2", "CMK"),
    ("cm3", "CMQ"),
    ("d", "DAY"),
    ("day", "DAY"),
    ("dozen", "DZN"),
    ("g", "GRM"),
    ("h", "HUR"),
    ("ha", "HAR"),
    ("hour", "HUR"),
    ("item", "H87"),
    ("kg", "KGM"),
    ("km", "KMT"),
    ("kw", "KWT"),
    ("kwh", "KWH"),
    ("l", "LTR"),
    ("lb", "LBR"),
    ("m", "MTR"),
    ("m2", "MTK"),
    ("m3", "MTQ"),
    ("mg", "MGM"),
    ("min", "MIN"),
    ("ml", "MLT"),
    ("mm", "MMT"),
    ("month", "MON"),
    ("mw", "MAW"),
    ("mwh", "MWH"),
    ("one", "C62"),
    ("pack", "XPK"),
    ("packet", "XPA"),
    ("pair", "PR"),
    ("pallet", "XPX"),
    ("percent", "P1"),
    ("piece", "H87"),
    ("roll", "XRO"),
    ("s", "SEC"),
    ("service", "E48"),
    ("set", "SET"),
    ("sheet", "XST"),
    ("t", "TNE"),
    ("tube", "XTU"),
    ("w", "WTT"),
    ("week", "WEE"),
    ("wh", "WHR"),
    ("year", "ANN"),
];
