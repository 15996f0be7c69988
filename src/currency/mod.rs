//! ISO 4217 currencies and exchange rates.
//!
//! Each currency carries the number of minor-unit decimal places used when
//! rounding monetary totals. Exchange rates convert amounts between
//! currencies at a fixed intermediate accuracy.

mod exchange;

pub use exchange::{CONVERSION_ACCURACY, ExchangeRate, can_convert_into, convert, match_exchange_rate};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::num::Amount;

/// Three-letter ISO 4217 currency code.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Definition from the currency table, if the code is known.
    pub fn def(&self) -> Option<&'static Def> {
        get(&self.0)
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl PartialEq<&str> for CurrencyCode {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Currency definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Def {
    pub code: &'static str,
    pub name: &'static str,
    /// Decimal places of the minor unit.
    pub subunits: u32,
}

impl Def {
    /// Zero amount with this currency's precision.
    pub fn zero(&self) -> Amount {
        Amount::zero(self.subunits)
    }

    /// Round `amount` to this currency's precision.
    pub fn rescale(&self, amount: Amount) -> Amount {
        amount.rescale(self.subunits)
    }
}

/// Look up a currency by its code.
pub fn get(code: &str) -> Option<&'static Def> {
    CURRENCIES
        .binary_search_by(|d| d.code.cmp(code))
        .ok()
        .map(|i| &CURRENCIES[i])
}

/// Check whether `code` is a known ISO 4217 currency code.
pub fn is_known_currency_code(code: &str) -> bool {
    get(code).is_some()
}

const fn def(code: &'static str, name: &'static str, subunits: u32) -> Def {
    Def { code, name, subunits }
}

/// Sorted by code for binary search.
static CURRENCIES: &[Def] = &[
    def("AED", "UAE Dirham", 2),
    def("AMD", "Armenian Dram", 2),
    def("ARS", "Argentine Peso", 2),
    def("AUD", "Australian Dollar", 2),
    def("BGN", "Bulgarian Lev", 2),
    def("BHD", "Bahraini Dinar", 3),
    def("BRL", "Brazilian Real", 2),
    def("CAD", "Canadian Dollar", 2),
    def("CHF", "Swiss Franc", 2),
    def("CLP", "Chilean Peso", 0),
    def("CNY", "Chinese Yuan", 2),
    def("COP", "Colombian Peso", 2),
    def("CZK", "Czech Koruna", 2),
    def("DKK", "Danish Krone", 2),
    def("EGP", "Egyptian Pound", 2),
    def("EUR", "Euro", 2),
    def("GBP", "Pound Sterling", 2),
    def("GEL", "Georgian Lari", 2),
    def("HKD", "Hong Kong Dollar", 2),
    def("HRK", "Croatian Kuna", 2),
    def("HUF", "Hungarian Forint", 2),
    def("IDR", "Indonesian Rupiah", 2),
    def("ILS", "Israeli Shekel", 2),
    def("INR", "Indian Rupee", 2),
    def("ISK", "Icelandic Krona", 0),
    def("JOD", "Jordanian Dinar", 3),
    def("JPY", "Japanese Yen", 0),
    def("KES", "Kenyan Shilling", 2),
    def("KRW", "South Korean Won", 0),
    def("KWD", "Kuwaiti Dinar", 3),
    def("KZT", "Kazakhstani Tenge", 2),
    def("MAD", "Moroccan Dirham", 2),
    def("MXN", "Mexican Peso", 2),
    def("MYR", "Malaysian Ringgit", 2),
    def("NGN", "Nigerian Naira", 2),
    def("NOK", "Norwegian Krone", 2),
    def("NZD", "New Zealand Dollar", 2),
    def("OMR", "Omani Rial", 3),
    def("PEN", "Peruvian Sol", 2),
    def("PHP", "Philippine Peso", 2),
    def("PLN", "Polish Zloty", 2),
    def("RON", "Romanian Leu", 2),
    def("RUB", "Russian Ruble", 2),
    def("SAR", "Saudi Riyal", 2),
    def("SEK", "Swedish Krona", 2),
    def("SGD", "Singapore Dollar", 2),
    def("THB", "Thai Baht", 2),
    def("TND", "Tunisian Dinar", 3),
    def("TRY", "Turkish Lira", 2),
    def("TWD", "New Taiwan Dollar", 2),
    def("UAH", "Ukrainian Hryvnia", 2),
    def("USD", "US Dollar", 2),
    def("VND", "Vietnamese Dong", 0),
    def("ZAR", "South African Rand", 2),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_currencies() {
        assert!(is_known_currency_code("EUR"));
        assert!(is_known_currency_code("USD"));
        assert!(is_known_currency_code("JPY"));
        assert!(!is_known_currency_code("XYZ"));
        assert!(!is_known_currency_code(""));
        assert!(!is_known_currency_code("eur"));
    }

    #[test]
    fn subunits() {
        assert_eq!(CurrencyCode::new("eur").def().unwrap().subunits, 2);
        assert_eq!(get("JPY").unwrap().subunits, 0);
        assert_eq!(get("KWD").unwrap().zero().to_string(), "0.000");
    }

    #[test]
    fn list_is_sorted() {
        for window in CURRENCIES.windows(2) {
            assert!(
                window[0].code < window[1].code,
                "currency codes not sorted: {} >= {}",
                window[0].code,
                window[1].code
            );
        }
    }
}
