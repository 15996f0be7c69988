use thiserror::Error;

use crate::validation::Errors;

/// Errors raised while calculating, converting or validating a document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GoblError {
    /// Document currency is missing or not a known ISO 4217 code.
    #[error("currency: {0}")]
    Currency(String),

    /// No exchange rate is available for a required conversion.
    #[error("exchange: {0}")]
    Exchange(String),

    /// A tax combo could not be resolved against its regime.
    #[error("tax: {0}")]
    Tax(String),

    /// Lookup of an unknown regime, addon or catalogue.
    #[error("registry: {0}")]
    Registry(String),

    /// A correction could not be prepared.
    #[error("correction: {0}")]
    Correction(String),

    /// A builder was missing required input.
    #[error("builder: {0}")]
    Builder(String),

    /// One or more validation rules failed. The tree of field errors is
    /// available for inspection.
    #[error("validation: {0}")]
    Validation(Errors),

    /// Document (de)serialization error.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl GoblError {
    /// Field errors when this is a validation failure.
    pub fn validation_errors(&self) -> Option<&Errors> {
        match self {
            GoblError::Validation(errs) => Some(errs),
            _ => None,
        }
    }
}

impl From<Errors> for GoblError {
    fn from(errs: Errors) -> Self {
        GoblError::Validation(errs)
    }
}
