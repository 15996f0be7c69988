use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;

use crate::cbc::{Code, Definition, I18nString, Key, find_key};
use crate::currency::CurrencyCode;
use crate::l10n::CountryCode;

use super::{CategoryDef, CorrectionDefinition, Normalizer, RoundingRule, ScenarioSet, Validator};

/// A tax jurisdiction: its categories and rates, local defaults, and the
/// normalizer and validator it applies to documents.
#[derive(Debug, Clone, Default)]
pub struct RegimeDef {
    pub country: CountryCode,
    pub name: I18nString,
    pub currency: CurrencyCode,
    /// IANA time zone name, used to work out "today". Unknown names fall
    /// back to UTC.
    pub time_zone: String,
    pub rounding: RoundingRule,
    pub tags: Vec<Definition>,
    pub extensions: Vec<Definition>,
    pub scenarios: Vec<ScenarioSet>,
    pub corrections: Vec<CorrectionDefinition>,
    pub categories: Vec<CategoryDef>,
    pub normalizer: Option<Normalizer>,
    pub validator: Option<Validator>,
}

impl RegimeDef {
    pub fn code(&self) -> &CountryCode {
        &self.country
    }

    pub fn category_def(&self, code: &Code) -> Option<&CategoryDef> {
        self.categories.iter().find(|c| &c.code == code)
    }

    pub fn extension_def(&self, key: &Key) -> Option<&Definition> {
        find_key(&self.extensions, key)
    }

    pub fn tag_def(&self, key: &Key) -> Option<&Definition> {
        find_key(&self.tags, key)
    }

    pub fn scenario_set(&self, schema: &str) -> Option<&ScenarioSet> {
        self.scenarios.iter().find(|s| s.schema == schema)
    }

    pub fn correction_definition(&self, schema: &str) -> Option<&CorrectionDefinition> {
        self.corrections.iter().find(|c| c.schema == schema)
    }

    /// Wall clock time in the regime's time zone at the given instant.
    pub fn local_time_at(&self, at: DateTime<Utc>) -> NaiveDateTime {
        match self.time_zone.parse::<Tz>() {
            Ok(tz) => at.with_timezone(&tz).naive_local(),
            Err(_) => at.naive_utc(),
        }
    }

    /// Current date in the regime's time zone.
    pub fn today(&self) -> NaiveDate {
        self.local_time_at(Utc::now()).date()
    }

    /// Current time in the regime's time zone, to the second.
    pub fn now_time(&self) -> NaiveTime {
        let now = self.local_time_at(Utc::now()).time();
        NaiveTime::from_num_seconds_from_midnight_opt(now.num_seconds_from_midnight(), 0).unwrap_or(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn regime(tz: &str) -> RegimeDef {
        RegimeDef {
            country: CountryCode::new("ES"),
            time_zone: tz.into(),
            ..Default::default()
        }
    }

    #[test]
    fn local_date_follows_daylight_saving() {
        let r = regime("Europe/Madrid");
        let summer = Utc.with_ymd_and_hms(2024, 7, 15, 22, 30, 0).unwrap();
        assert_eq!(r.local_time_at(summer).date(), NaiveDate::from_ymd_opt(2024, 7, 16).unwrap());
        assert_eq!(r.local_time_at(summer).time(), NaiveTime::from_hms_opt(0, 30, 0).unwrap());

        let winter = Utc.with_ymd_and_hms(2024, 1, 15, 22, 30, 0).unwrap();
        assert_eq!(r.local_time_at(winter).date(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn unknown_zone_uses_utc() {
        let at = Utc.with_ymd_and_hms(2024, 7, 15, 23, 30, 0).unwrap();
        assert_eq!(regime("Mars/Olympus").local_time_at(at), at.naive_utc());
        assert_eq!(regime("").local_time_at(at), at.naive_utc());
    }
}
