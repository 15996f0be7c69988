//! Composable field validation.
//!
//! Each document type lists its fields with the rules that apply to them
//! using [`validate_struct`]. Rules are plain closures, so conditional and
//! custom checks compose with the primitive ones. Failures accumulate into
//! an [`Errors`] tree keyed by field name and collection index.
//!
//! ```
//! use gobl::validation::{length, required, validate_struct};
//!
//! struct Contact { name: String }
//!
//! let c = Contact { name: String::new() };
//! let err = validate_struct()
//!     .field("name", &c.name, vec![required(), length(1, 64)])
//!     .finish()
//!     .unwrap_err();
//! assert_eq!(err.to_string(), "name: cannot be blank.");
//! ```

mod errors;
mod rules;

pub use errors::{Errors, FieldError, ValidationError};
pub use rules::*;

use crate::tax::Context;

/// Types that validate themselves against the active regime and addons.
pub trait Validate {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors>;
}

impl<T: Validate> Validate for Option<T> {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        match self {
            Some(v) => v.validate_with(ctx),
            None => Ok(()),
        }
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        let mut errs = Errors::new();
        for (i, item) in self.iter().enumerate() {
            errs.nest(i.to_string(), item.validate_with(ctx));
        }
        errs.into_result()
    }
}

impl<T: Validate> Validate for Box<T> {
    fn validate_with(&self, ctx: &Context<'_>) -> Result<(), Errors> {
        (**self).validate_with(ctx)
    }
}

/// Collects field errors for one struct.
#[derive(Debug, Default)]
pub struct Fields {
    errors: Errors,
}

/// Start validating a struct's fields.
pub fn validate_struct() -> Fields {
    Fields::default()
}

impl Fields {
    /// Apply `rules` to `value` in order, stopping at the first failure.
    pub fn field<'a, T>(mut self, name: &str, value: &T, rules: Vec<Rule<'a, T>>) -> Self {
        for rule in rules {
            if let Err(err) = rule(value) {
                self.errors.insert(name, err);
                break;
            }
        }
        self
    }

    /// Merge errors produced outside the field list, such as regime or
    /// addon validators for the whole object.
    pub fn with(mut self, result: Result<(), Errors>) -> Self {
        if let Err(errs) = result {
            self.errors.merge(errs);
        }
        self
    }

    pub fn finish(self) -> Result<(), Errors> {
        self.errors.into_result()
    }
}
