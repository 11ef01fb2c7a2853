//! Field-level validation errors attached to form inputs

use serde::Serialize;
use std::fmt;

/// Form field holding the email address being verified
pub const ADDRESS_FIELD: &str = "email";

/// Form field holding the verification code
pub const CODE_FIELD: &str = "verificationCode";

/// Validation error with field-level details
///
/// `code` is a stable identifier the presentation layer maps to a
/// translated string; `message` is the English default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub code: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code: code.into(),
        }
    }

    /// Error for the address input
    pub fn address(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self::new(ADDRESS_FIELD, message, code)
    }

    /// Error for the verification code input
    pub fn code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self::new(CODE_FIELD, message, code)
    }

    pub fn is_address_error(&self) -> bool {
        self.field == ADDRESS_FIELD
    }

    pub fn is_code_error(&self) -> bool {
        self.field == CODE_FIELD
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_constructors() {
        let address = FieldError::address("already in use", "EmailAddressInUse");
        assert!(address.is_address_error());
        assert!(!address.is_code_error());
        assert_eq!(address.to_string(), "email: already in use");

        let code = FieldError::code("invalid", "VERIFICATION_FAILED");
        assert!(code.is_code_error());
        assert_eq!(code.field, CODE_FIELD);
    }

    #[test]
    fn test_serialization() {
        let error = FieldError::code("invalid", "VERIFICATION_FAILED");
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["field"], "verificationCode");
        assert_eq!(json["code"], "VERIFICATION_FAILED");
    }
}
