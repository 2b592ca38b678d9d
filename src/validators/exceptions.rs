//! XSD Validation Exceptions
//!
//! This module contains the error item that flows through decode and encode
//! streams when data does not conform to a schema component.

use std::fmt;

/// Validation error when data doesn't conform to the schema
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// The error message
    message: String,
    /// The reason for the validation failure
    pub reason: Option<String>,
    /// The path to the item that failed validation
    path: Option<String>,
    /// Rendering of the offending value
    pub instance: Option<String>,
    /// Description of the component that produced the error
    pub validator: Option<String>,
    /// The expected type, tag or value
    pub expected: Option<String>,
    /// The actual value found
    pub actual: Option<String>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            reason: None,
            path: None,
            instance: None,
            validator: None,
            expected: None,
            actual: None,
        }
    }

    /// Error for a value the component failed to decode
    pub fn decode(
        validator: impl Into<String>,
        instance: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let instance = instance.into();
        Self::new(format!("failed decoding '{}'", instance))
            .with_instance(instance)
            .with_validator(validator)
            .with_reason(reason)
    }

    /// Error for a value the component failed to encode
    pub fn encode(
        validator: impl Into<String>,
        instance: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let instance = instance.into();
        Self::new(format!("failed encoding '{}'", instance))
            .with_instance(instance)
            .with_validator(validator)
            .with_reason(reason)
    }

    /// Set the reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Set the path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the path if one is known
    pub fn with_optional_path(mut self, path: Option<&str>) -> Self {
        if let Some(path) = path {
            self.path = Some(path.to_string());
        }
        self
    }

    /// Set the offending instance
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Set the validator description
    pub fn with_validator(mut self, validator: impl Into<String>) -> Self {
        self.validator = Some(validator.into());
        self
    }

    /// Set expected value
    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    /// Set actual value
    pub fn with_actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the path to the error location (if available)
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Get the reason (if available)
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref reason) = self.reason {
            write!(f, "\n\nReason: {}", reason)?;
        }
        if let Some(ref validator) = self.validator {
            write!(f, "\n\nValidator: {}", validator)?;
        }
        if let Some(ref instance) = self.instance {
            write!(f, "\n\nInstance: {}", instance)?;
        }
        if let Some(ref path) = self.path {
            write!(f, "\n\nPath: {}", path)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let error = ValidationError::new("Invalid element")
            .with_reason("element 'foo' not expected")
            .with_path("/root/child");

        assert_eq!(error.message(), "Invalid element");
        assert_eq!(error.path(), Some("/root/child"));
        assert_eq!(error.reason(), Some("element 'foo' not expected"));
    }

    #[test]
    fn test_validation_error_display() {
        let error = ValidationError::new("Invalid element")
            .with_reason("element 'foo' not expected")
            .with_path("/root/child");

        let display = error.to_string();
        assert!(display.contains("Invalid element"));
        assert!(display.contains("Reason:"));
        assert!(display.contains("Path: /root/child"));
    }

    #[test]
    fn test_decode_error() {
        let error = ValidationError::decode("xs:integer", "abc", "invalid digit found in string");
        assert_eq!(error.message(), "failed decoding 'abc'");
        assert_eq!(error.instance.as_deref(), Some("abc"));

        let display = error.to_string();
        assert!(display.contains("xs:integer"));
        assert!(display.contains("invalid digit"));
    }

    #[test]
    fn test_encode_error() {
        let error = ValidationError::encode("xs:boolean", "\"yes\"", "not a boolean");
        assert!(error.to_string().contains("failed encoding"));
    }

    #[test]
    fn test_optional_path() {
        let error = ValidationError::new("x").with_optional_path(None);
        assert!(error.path().is_none());

        let error = ValidationError::new("x").with_optional_path(Some("/a"));
        assert_eq!(error.path(), Some("/a"));
    }
}
