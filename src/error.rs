//! Error types for xmlschema-validator
//!
//! Two disjoint families live here: data errors ([`ValidationError`], recoverable
//! and governed by the validation mode) and contract errors
//! ([`Error::NotImplemented`], never suppressed).

use std::fmt;
use thiserror::Error;

pub use crate::validators::exceptions::ValidationError;

/// Result type alias using the crate Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for validator operations
#[derive(Error, Debug)]
pub enum Error {
    /// Data does not conform to the schema
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A schema component is inconsistent
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A component kind does not supply a required operation
    #[error("unsupported operation: {0}")]
    NotImplemented(String),

    /// Value error (invalid configuration or argument value)
    #[error("value error: {0}")]
    Value(String),

    /// Decoding produced no value
    #[error("decoding error: {0}")]
    Decode(String),

    /// Encoding produced no value
    #[error("encoding error: {0}")]
    Encode(String),

    /// Option set could not be loaded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this is a data validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Whether this is an unsupported-operation error
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Error::NotImplemented(_))
    }
}

/// Schema component error, reported by the check pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Description of the component that failed its check
    pub component: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            component: None,
        }
    }

    /// Set the component
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref component) = self.component {
            write!(f, "\n\nComponent: {}", component)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}
