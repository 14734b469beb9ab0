//! Validation utilities.

use crate::{CairnError, FieldError};
use validator::{Validate, ValidationErrors};

/// Extension trait for validation.
pub trait ValidateExt: Validate {
    /// Validates the struct and returns a `CairnError` on failure.
    fn validate_request(&self) -> Result<(), CairnError> {
        self.validate().map_err(validation_errors_to_cairn_error)
    }
}

impl<T: Validate> ValidateExt for T {}

/// Converts `validator::ValidationErrors` to `CairnError`.
#[must_use]
pub fn validation_errors_to_cairn_error(errors: ValidationErrors) -> CairnError {
    let mut field_errors: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldError {
                field: (*field).to_string(),
                message: error
                    .message
                    .as_ref()
                    .map_or_else(|| error.code.to_string(), |m| m.to_string()),
                code: error.code.to_string(),
            })
        })
        .collect();
    field_errors.sort_by(|a, b| a.field.cmp(&b.field));

    let message = field_errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ");

    CairnError::Validation(message)
}

/// Common validation functions.
pub mod rules {
    use validator::ValidationError;

    /// Validates that a string is not blank (not empty after trimming).
    pub fn not_blank(value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::new("not_blank"));
        }
        Ok(())
    }

    /// Validates that a user name meets requirements.
    pub fn valid_user_name(user_name: &str) -> Result<(), ValidationError> {
        if user_name.is_empty() {
            return Err(ValidationError::new("user_name_empty"));
        }
        if user_name.len() > 64 {
            return Err(ValidationError::new("user_name_too_long"));
        }
        if !user_name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
        {
            return Err(ValidationError::new("user_name_invalid_characters"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::rules::*;
    use super::*;

    #[derive(Validate)]
    struct Sample {
        #[validate(custom(function = "not_blank"))]
        content: String,
        #[validate(custom(function = "valid_user_name"))]
        user_name: String,
    }

    #[test]
    fn test_not_blank() {
        assert!(not_blank("hello").is_ok());
        assert!(not_blank("   ").is_err());
        assert!(not_blank("").is_err());
    }

    #[test]
    fn test_valid_user_name() {
        assert!(valid_user_name("taha").is_ok());
        assert!(valid_user_name("adam.irbouh").is_ok());
        assert!(valid_user_name("").is_err());
        assert!(valid_user_name("has space").is_err());
        assert!(valid_user_name(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_request_maps_to_validation_error() {
        let sample = Sample {
            content: " ".to_string(),
            user_name: "bad name".to_string(),
        };

        match sample.validate_request() {
            Err(CairnError::Validation(message)) => {
                assert!(message.contains("content: not_blank"));
                assert!(message.contains("user_name: user_name_invalid_characters"));
            }
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_request_ok() {
        let sample = Sample {
            content: "post 1".to_string(),
            user_name: "taha".to_string(),
        };
        assert!(sample.validate_request().is_ok());
    }
}
