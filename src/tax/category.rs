use chrono::NaiveDate;
use serde::Serialize;
use tracing::trace;

use crate::cbc::{Code, I18nString, Key};
use crate::num::Percentage;

use super::Extensions;

/// A tax category such as VAT or a retained income tax, with the rates
/// it offers.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryDef {
    pub code: Code,
    pub name: I18nString,
    #[serde(skip_serializing_if = "I18nString::is_empty")]
    pub title: I18nString,
    /// Amounts are withheld by the customer instead of added.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub retained: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rates: Vec<RateDef>,
}

impl CategoryDef {
    pub fn new(code: &str, name: &str, title: &str) -> Self {
        Self {
            code: Code::from(code),
            name: I18nString::en(name),
            title: I18nString::en(title),
            ..Default::default()
        }
    }

    pub fn retained(mut self) -> Self {
        self.retained = true;
        self
    }

    pub fn rates(mut self, rates: Vec<RateDef>) -> Self {
        self.rates = rates;
        self
    }

    pub fn rate_def(&self, key: &Key) -> Option<&RateDef> {
        self.rates.iter().find(|r| &r.key == key)
    }
}

/// A named rate within a category along with its history of values.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RateDef {
    pub key: Key,
    pub name: I18nString,
    #[serde(skip_serializing_if = "I18nString::is_empty")]
    pub desc: I18nString,
    /// Newest first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<RateValueDef>,
}

impl RateDef {
    pub fn new(key: &str, name: &str) -> Self {
        Self {
            key: Key::from(key),
            name: I18nString::en(name),
            ..Default::default()
        }
    }

    pub fn values(mut self, values: Vec<RateValueDef>) -> Self {
        self.values = values;
        self
    }

    /// Value in force on `date` for a document with the given tags and
    /// extensions. Values with a tag filter only apply when the document
    /// carries one of the tags. When several apply, the newest wins and a
    /// tagged value beats an untagged one from the same date.
    pub fn value(&self, date: NaiveDate, tags: &[Key], ext: &Extensions) -> Option<&RateValueDef> {
        let found = self
            .values
            .iter()
            .filter(|v| v.applies(date, tags, ext))
            .max_by_key(|v| (v.since, !v.tags.is_empty()));
        trace!(rate = %self.key, %date, found = found.is_some(), "rate value lookup");
        found
    }
}

/// A percentage valid from a given date, optionally restricted to
/// documents with specific tags or extensions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RateValueDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Key>,
    #[serde(skip_serializing_if = "Extensions::is_empty")]
    pub ext: Extensions,
    pub percent: Percentage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surcharge: Option<Percentage>,
}

impl RateValueDef {
    pub fn new(since: Option<NaiveDate>, percent: Percentage) -> Self {
        Self {
            since,
            percent,
            ..Default::default()
        }
    }

    pub fn surcharge(mut self, surcharge: Percentage) -> Self {
        self.surcharge = Some(surcharge);
        self
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| Key::from(*t)).collect();
        self
    }

    fn applies(&self, date: NaiveDate, tags: &[Key], ext: &Extensions) -> bool {
        if self.since.is_some_and(|since| since > date) {
            return false;
        }
        if !self.tags.is_empty() && !self.tags.iter().any(|t| tags.contains(t)) {
            return false;
        }
        ext.contains(&self.ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn pct(s: &str) -> Percentage {
        s.parse().unwrap()
    }

    fn standard() -> RateDef {
        RateDef::new("standard", "Standard").values(vec![
            RateValueDef::new(Some(date(2012, 9, 1)), pct("21.0%")),
            RateValueDef::new(Some(date(2010, 7, 1)), pct("18.0%")),
            RateValueDef::new(Some(date(2024, 1, 1)), pct("5.0%")).tags(&["special"]),
        ])
    }

    #[test]
    fn newest_value_by_date() {
        let r = standard();
        let none = Extensions::new();
        assert_eq!(r.value(date(2022, 6, 13), &[], &none).unwrap().percent, pct("21.0%"));
        assert_eq!(r.value(date(2011, 1, 1), &[], &none).unwrap().percent, pct("18.0%"));
        assert!(r.value(date(2000, 1, 1), &[], &none).is_none());
    }

    #[test]
    fn tagged_values_need_tags() {
        let r = standard();
        let none = Extensions::new();
        let tags = vec![Key::from("special")];
        assert_eq!(r.value(date(2024, 6, 1), &[], &none).unwrap().percent, pct("21.0%"));
        assert_eq!(r.value(date(2024, 6, 1), &tags, &none).unwrap().percent, pct("5.0%"));
    }

    #[test]
    fn category_lookup() {
        let cat = CategoryDef::new("IRPF", "IRPF", "Personal income tax").retained().rates(vec![standard()]);
        assert!(cat.retained);
        assert!(cat.rate_def(&Key::from("standard")).is_some());
        assert!(cat.rate_def(&Key::from("super")).is_none());
    }
}
