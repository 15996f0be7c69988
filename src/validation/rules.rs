use chrono::NaiveDate;
use regex::Regex;

use super::{Errors, FieldError, Validate};
use crate::cbc::{Code, I18nString, Key};
use crate::currency::CurrencyCode;
use crate::l10n::CountryCode;
use crate::num::{Amount, Percentage};
use crate::tax::Context;

/// A check over a single value.
pub type Rule<'a, T> = Box<dyn Fn(&T) -> Result<(), FieldError> + 'a>;

/// Whether a value counts as provided.
pub trait Presence {
    fn is_present(&self) -> bool;
}

impl Presence for String {
    fn is_present(&self) -> bool {
        !self.trim().is_empty()
    }
}

impl Presence for Code {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl Presence for Key {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl Presence for CountryCode {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl Presence for CurrencyCode {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl Presence for I18nString {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl Presence for Amount {
    fn is_present(&self) -> bool {
        !self.is_zero()
    }
}

impl Presence for NaiveDate {
    fn is_present(&self) -> bool {
        true
    }
}

impl<T> Presence for Option<T> {
    fn is_present(&self) -> bool {
        self.is_some()
    }
}

impl<T> Presence for Vec<T> {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

/// Values with a measurable length.
pub trait HasLength {
    fn length(&self) -> usize;
}

impl HasLength for String {
    fn length(&self) -> usize {
        self.chars().count()
    }
}

impl HasLength for Code {
    fn length(&self) -> usize {
        self.as_str().chars().count()
    }
}

impl HasLength for Key {
    fn length(&self) -> usize {
        self.as_str().chars().count()
    }
}

impl<T> HasLength for Vec<T> {
    fn length(&self) -> usize {
        self.len()
    }
}

/// Values that can be compared numerically.
pub trait NumValue {
    fn num(&self) -> Option<Amount>;
}

impl NumValue for Amount {
    fn num(&self) -> Option<Amount> {
        Some(*self)
    }
}

impl NumValue for Percentage {
    fn num(&self) -> Option<Amount> {
        Some(self.amount())
    }
}

impl<T: NumValue> NumValue for Option<T> {
    fn num(&self) -> Option<Amount> {
        self.as_ref().and_then(NumValue::num)
    }
}

/// Values that may hold a date.
pub trait DateValue {
    fn date(&self) -> Option<NaiveDate>;
}

impl DateValue for NaiveDate {
    fn date(&self) -> Option<NaiveDate> {
        Some(*self)
    }
}

impl DateValue for Option<NaiveDate> {
    fn date(&self) -> Option<NaiveDate> {
        *self
    }
}

fn fail(msg: impl Into<String>) -> Result<(), FieldError> {
    Err(FieldError::msg(msg))
}

pub fn required<'a, T: Presence + 'a>() -> Rule<'a, T> {
    Box::new(|v: &T| if v.is_present() { Ok(()) } else { fail("cannot be blank") })
}

/// Like [`required`] with a custom message.
pub fn required_msg<'a, T: Presence + 'a>(msg: &'a str) -> Rule<'a, T> {
    Box::new(move |v: &T| if v.is_present() { Ok(()) } else { fail(msg) })
}

/// Value must not be provided.
pub fn empty<'a, T: Presence + 'a>() -> Rule<'a, T> {
    Box::new(|v: &T| if v.is_present() { fail("must be blank") } else { Ok(()) })
}

/// Length between `min` and `max` inclusive; a zero `max` means unbounded.
/// Empty values pass.
pub fn length<'a, T: HasLength + 'a>(min: usize, max: usize) -> Rule<'a, T> {
    Box::new(move |v: &T| {
        let len = v.length();
        if len == 0 || (len >= min && (max == 0 || len <= max)) {
            return Ok(());
        }
        if max == 0 {
            fail(format!("the length must be no less than {min}"))
        } else if min == 0 {
            fail(format!("the length must be no more than {max}"))
        } else {
            fail(format!("the length must be between {min} and {max}"))
        }
    })
}

/// Value must match `re`. Empty values pass.
pub fn matches<'a, T: AsRef<str> + 'a>(re: &'a Regex) -> Rule<'a, T> {
    Box::new(move |v: &T| {
        let s = v.as_ref();
        if s.is_empty() || re.is_match(s) { Ok(()) } else { fail("must be in a valid format") }
    })
}

/// Value must be one of `list`. Empty values pass.
pub fn in_list<'a, T: AsRef<str> + 'a>(list: &'a [&'a str]) -> Rule<'a, T> {
    Box::new(move |v: &T| {
        let s = v.as_ref();
        if s.is_empty() || list.contains(&s) { Ok(()) } else { fail("must be a valid value") }
    })
}

/// Value must not be one of `list`.
pub fn not_in<'a, T: AsRef<str> + 'a>(list: &'a [&'a str]) -> Rule<'a, T> {
    Box::new(move |v: &T| {
        if list.contains(&v.as_ref()) { fail("must not be one of the listed values") } else { Ok(()) }
    })
}

/// Value must equal one of `values`.
pub fn one_of<'a, T: PartialEq + 'a>(values: Vec<T>) -> Rule<'a, T> {
    Box::new(move |v: &T| if values.contains(v) { Ok(()) } else { fail("must be a valid value") })
}

/// Apply `rules` to every element, reporting failures by index.
pub fn each<'a, T: 'a>(rules: Vec<Rule<'a, T>>) -> Rule<'a, Vec<T>> {
    Box::new(move |items: &Vec<T>| {
        let mut errs = Errors::new();
        for (i, item) in items.iter().enumerate() {
            if let Some(err) = rules.iter().find_map(|rule| rule(item).err()) {
                errs.insert(i.to_string(), err);
            }
        }
        errs.into_result().map_err(FieldError::Nested)
    })
}

/// Apply `rules` only when `cond` holds.
pub fn when<'a, T: 'a>(cond: bool, rules: Vec<Rule<'a, T>>) -> Rule<'a, T> {
    Box::new(move |v: &T| {
        if !cond {
            return Ok(());
        }
        rules.iter().try_for_each(|rule| rule(v))
    })
}

/// Custom check returning a message on failure.
pub fn by<'a, T: 'a, F>(check: F) -> Rule<'a, T>
where
    F: Fn(&T) -> Result<(), String> + 'a,
{
    Box::new(move |v: &T| check(v).map_err(FieldError::Message))
}

/// Recurse into a nested value with the same context.
pub fn nested<'a, T: Validate + 'a>(ctx: &'a Context<'a>) -> Rule<'a, T> {
    Box::new(move |v: &T| v.validate_with(ctx).map_err(FieldError::Nested))
}

pub fn num_equals<'a, T: NumValue + 'a>(target: Amount) -> Rule<'a, T> {
    Box::new(move |v: &T| match v.num() {
        Some(n) if n != target => fail(format!("must be equal to {target}")),
        _ => Ok(()),
    })
}

pub fn num_min<'a, T: NumValue + 'a>(min: Amount) -> Rule<'a, T> {
    Box::new(move |v: &T| match v.num() {
        Some(n) if n < min => fail(format!("must be no less than {min}")),
        _ => Ok(()),
    })
}

pub fn num_max<'a, T: NumValue + 'a>(max: Amount) -> Rule<'a, T> {
    Box::new(move |v: &T| match v.num() {
        Some(n) if n > max => fail(format!("must be no greater than {max}")),
        _ => Ok(()),
    })
}

pub fn positive<'a, T: NumValue + 'a>() -> Rule<'a, T> {
    Box::new(|v: &T| match v.num() {
        Some(n) if !n.is_positive() => fail("must be greater than 0"),
        _ => Ok(()),
    })
}

pub fn zero_or_positive<'a, T: NumValue + 'a>() -> Rule<'a, T> {
    Box::new(|v: &T| match v.num() {
        Some(n) if n.is_negative() => fail("must be no less than 0"),
        _ => Ok(()),
    })
}

pub fn date_after<'a, T: DateValue + 'a>(after: NaiveDate) -> Rule<'a, T> {
    Box::new(move |v: &T| match v.date() {
        Some(d) if d <= after => fail(format!("too early, must be after {after}")),
        _ => Ok(()),
    })
}

pub fn date_before<'a, T: DateValue + 'a>(before: NaiveDate) -> Rule<'a, T> {
    Box::new(move |v: &T| match v.date() {
        Some(d) if d >= before => fail(format!("too late, must be before {before}")),
        _ => Ok(()),
    })
}

pub fn date_not_zero<'a, T: DateValue + 'a>() -> Rule<'a, T> {
    Box::new(|v: &T| match v.date() {
        Some(_) => Ok(()),
        None => fail("required"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_struct;

    fn amt(s: &str) -> Amount {
        s.parse().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn check<T>(value: &T, rules: Vec<Rule<'_, T>>) -> Option<String> {
        validate_struct()
            .field("f", value, rules)
            .finish()
            .err()
            .map(|e| e.to_string())
    }

    #[test]
    fn required_and_empty() {
        assert_eq!(check(&String::new(), vec![required()]).unwrap(), "f: cannot be blank.");
        assert!(check(&Some(1), vec![required()]).is_none());
        assert_eq!(check(&Some(1), vec![empty()]).unwrap(), "f: must be blank.");
        assert!(check(&Vec::<u8>::new(), vec![empty()]).is_none());
    }

    #[test]
    fn length_bounds() {
        assert!(check(&Code::from("ABC"), vec![length(1, 3)]).is_none());
        assert!(check(&Code::from("ABCD"), vec![length(1, 3)]).unwrap().contains("between 1 and 3"));
        assert!(check(&String::new(), vec![length(2, 0)]).is_none());
    }

    #[test]
    fn first_failing_rule_reported() {
        let out = check(&String::new(), vec![required_msg("missing"), length(5, 0)]);
        assert_eq!(out.unwrap(), "f: missing.");
    }

    #[test]
    fn regex_and_lists() {
        let re = Regex::new(r"^\d+$").unwrap();
        assert!(check(&Code::from("123"), vec![matches(&re)]).is_none());
        assert!(check(&Code::from("12a"), vec![matches(&re)]).is_some());
        assert!(check(&Code::from("B1"), vec![in_list(&["B1", "S1"])]).is_none());
        assert!(check(&Code::from("X"), vec![in_list(&["B1", "S1"])]).is_some());
        assert!(check(&Code::from("X"), vec![not_in(&["X"])]).is_some());
        assert!(check(&3, vec![one_of(vec![1, 2])]).is_some());
    }

    #[test]
    fn each_reports_by_index() {
        let list = vec![String::from("a"), String::new()];
        assert_eq!(check(&list, vec![each(vec![required()])]).unwrap(), "f: (1: cannot be blank.).");
    }

    #[test]
    fn when_and_by() {
        assert!(check(&String::new(), vec![when(false, vec![required()])]).is_none());
        assert!(check(&String::new(), vec![when(true, vec![required()])]).is_some());
        let out = check(&5, vec![by(|v: &i32| if *v > 3 { Err("too big".into()) } else { Ok(()) })]);
        assert_eq!(out.unwrap(), "f: too big.");
    }

    #[test]
    fn numeric_predicates() {
        assert!(check(&amt("10.00"), vec![num_equals(amt("10"))]).is_none());
        assert!(check(&amt("10.00"), vec![num_max(amt("5"))]).is_some());
        assert!(check(&amt("-1"), vec![num_min(amt("0"))]).is_some());
        assert!(check(&amt("0"), vec![positive()]).is_some());
        assert!(check(&amt("0"), vec![zero_or_positive()]).is_none());
        assert!(check(&None::<Amount>, vec![positive()]).is_none());
    }

    #[test]
    fn date_predicates() {
        let d = date(2024, 6, 1);
        assert!(check(&d, vec![date_after(date(2024, 1, 1))]).is_none());
        assert!(check(&d, vec![date_before(date(2024, 1, 1))]).is_some());
        assert_eq!(check(&None::<NaiveDate>, vec![date_not_zero()]).unwrap(), "f: required.");
    }
}
