//! Per-field validation shared by JSON request bodies and submitted forms.
//!
//! Checks never stop at the first problem: every failing field is collected so a client
//! can highlight all of them at once.

use crate::errors::Error;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::ops::RangeInclusive;
use utoipa::ToSchema;

/// A validation failure attached to one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    /// Field name, using dots for nested fields (e.g. `config.temperature`)
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Collects field errors for one request.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn extend(&mut self, errors: impl IntoIterator<Item = FieldError>) {
        self.errors.extend(errors);
    }

    pub fn required(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.push(field, "is required");
        }
    }

    /// For partial updates: absent is fine, present-but-blank is not.
    pub fn required_if_present(&mut self, field: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.required(field, value);
        }
    }

    pub fn within<T: PartialOrd + Display>(&mut self, field: &str, value: T, range: RangeInclusive<T>) {
        if !range.contains(&value) {
            self.push(field, format!("must be between {} and {}", range.start(), range.end()));
        }
    }

    pub fn at_least<T: PartialOrd + Display>(&mut self, field: &str, value: T, min: T) {
        if value < min {
            self.push(field, format!("must be at least {min}"));
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.push(field, "is required");
        } else if !value.contains('@') {
            self.push(field, "must be a valid email address");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }

    /// `Ok` when nothing was collected, otherwise a 422 carrying every field error.
    pub fn finish(self) -> Result<(), Error> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation { errors: self.errors })
        }
    }
}

/// Implemented by request bodies that carry field-level rules beyond their types.
pub trait Validate {
    fn check(&self, v: &mut Validator);

    fn validate(&self) -> Result<(), Error> {
        let mut v = Validator::new();
        self.check(&mut v);
        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_every_failure() {
        let mut v = Validator::new();
        v.required("name", "  ");
        v.email("email", "not-an-email");
        v.within("config.top_p", 1.5, 0.0..=1.0);
        v.at_least("usage_limit", 0u64, 1);
        v.within("port", 8080u16, 1..=65535);

        let errors = v.into_errors();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "email", "config.top_p", "usage_limit"]);
    }

    #[test]
    fn test_finish_maps_to_validation_error() {
        let mut v = Validator::new();
        v.required_if_present("name", Some(""));
        v.required_if_present("host", None);

        match v.finish() {
            Err(Error::Validation { errors }) => {
                assert_eq!(errors, vec![FieldError::new("name", "is required")]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
