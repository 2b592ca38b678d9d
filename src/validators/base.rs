//! Base validator definitions
//!
//! Validation modes and the status string surfaces shared by every component.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Validation mode for XSD validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Strict validation - the first error aborts decoding or encoding
    #[default]
    Strict,
    /// Lax validation - errors are streamed alongside a best-effort value
    Lax,
    /// Skip validation - no validation is performed
    Skip,
}

impl ValidationMode {
    /// Get the mode as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationMode::Strict => "strict",
            ValidationMode::Lax => "lax",
            ValidationMode::Skip => "skip",
        }
    }

    /// Whether errors abort the driving loop
    pub fn is_strict(&self) -> bool {
        *self == ValidationMode::Strict
    }

    /// Whether validation checks are bypassed
    pub fn is_skip(&self) -> bool {
        *self == ValidationMode::Skip
    }
}

impl FromStr for ValidationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "strict" => Ok(ValidationMode::Strict),
            "lax" => Ok(ValidationMode::Lax),
            "skip" => Ok(ValidationMode::Skip),
            _ => Err(Error::Value(format!(
                "Invalid validation mode: '{}'. Must be 'strict', 'lax', or 'skip'",
                s
            ))),
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validation attempted on a component
///
/// Ref: https://www.w3.org/TR/xmlschema11-1/#e-validation_attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    /// Fully validated in the current check generation
    Full,
    /// Not validated in the current check generation
    None,
}

impl ValidationStatus {
    /// Get the status as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Full => "full",
            ValidationStatus::None => "none",
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validity status of a component
///
/// Ref: https://www.w3.org/TR/xmlschema11-1/#e-validity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidityStatus {
    /// Valid according to the schema
    Valid,
    /// Invalid according to the schema
    Invalid,
    /// Validity is unknown
    #[default]
    NotKnown,
}

impl ValidityStatus {
    /// Get the status as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidityStatus::Valid => "valid",
            ValidityStatus::Invalid => "invalid",
            ValidityStatus::NotKnown => "notKnown",
        }
    }

    /// Tri-state boolean view: `Some(true)`, `Some(false)` or `None`
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ValidityStatus::Valid => Some(true),
            ValidityStatus::Invalid => Some(false),
            ValidityStatus::NotKnown => None,
        }
    }
}

impl From<Option<bool>> for ValidityStatus {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => ValidityStatus::Valid,
            Some(false) => ValidityStatus::Invalid,
            None => ValidityStatus::NotKnown,
        }
    }
}

impl FromStr for ValidityStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "valid" => Ok(ValidityStatus::Valid),
            "invalid" => Ok(ValidityStatus::Invalid),
            "notKnown" => Ok(ValidityStatus::NotKnown),
            _ => Err(Error::Value(format!(
                "Invalid validity: '{}'. Must be 'valid', 'invalid', or 'notKnown'",
                s
            ))),
        }
    }
}

impl fmt::Display for ValidityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
