//! Declarative-ish request validation.
//!
//! Each request struct declares its field rules through a [`Validator`],
//! which collects every violation and turns the batch into a single
//! `ApiError::Validation` whose message is the serialized field-error list.

use crate::error::{ApiError, FieldError};

#[derive(Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    /// Required string with inclusive length bounds.
    pub fn require_str(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        if value.chars().count() < min {
            self.push(field, format!("must contain at least {} character(s)", min));
        } else if value.chars().count() > max {
            self.push(field, format!("must contain at most {} character(s)", max));
        }
        self
    }

    /// Optional string; rules apply only when the value is present.
    pub fn optional_str(
        &mut self,
        field: &str,
        value: Option<&str>,
        min: usize,
        max: usize,
    ) -> &mut Self {
        if let Some(value) = value {
            self.require_str(field, value, min, max);
        }
        self
    }

    pub fn min_i64(&mut self, field: &str, value: i64, min: i64) -> &mut Self {
        if value < min {
            self.push(field, format!("must be greater than or equal to {}", min));
        }
        self
    }

    pub fn max_i64(&mut self, field: &str, value: i64, max: i64) -> &mut Self {
        if value > max {
            self.push(field, format!("must be less than or equal to {}", max));
        }
        self
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_multiple_violations() {
        let mut v = Validator::new();
        v.require_str("title", "", 1, 100);
        v.require_str("content", &"x".repeat(300), 1, 255);
        let err = v.finish().unwrap_err();
        let msg = err.message();
        assert!(msg.contains("title"));
        assert!(msg.contains("content"));
    }

    #[test]
    fn optional_fields_skip_absent_values() {
        let mut v = Validator::new();
        v.optional_str("name", None, 1, 100);
        assert!(v.finish().is_ok());
    }

    #[test]
    fn page_and_size_bounds() {
        let mut v = Validator::new();
        v.min_i64("page", 0, 1);
        v.max_i64("size", 101, 100);
        assert!(v.finish().is_err());
    }
}
