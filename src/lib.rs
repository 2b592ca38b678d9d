//! # xmlschema-validator
//!
//! Validity tracking and the decode/encode protocol of XML Schema components.
//!
//! Every schema component records whether it has been checked in the current
//! generation of its schema and with which outcome, and every component that
//! validates data does so through one pair of lazy primitives, `iter_decode`
//! and `iter_encode`, from which validation, error enumeration and conversion
//! are derived.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use xmlschema_validator::documents::Element;
//! use xmlschema_validator::validators::{
//!     BuiltinType, ElementType, XsdAtomicType, XsdElement, XsdGlobals, XsdValidator,
//! };
//!
//! let mut globals = XsdGlobals::new();
//! let context = Arc::clone(globals.context());
//! let integer = XsdAtomicType::builtin(BuiltinType::Integer, &context);
//! let count = Arc::new(XsdElement::with_type("count", ElementType::Simple(integer), &context));
//! globals.register_element(Arc::clone(&count)).unwrap();
//!
//! assert!(globals.check_schema().unwrap().is_valid());
//! assert_eq!(count.decode(&Element::new("count").with_text("3")).unwrap(), 3);
//! assert!(!count.is_valid(&Element::new("count").with_text("three")).unwrap());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod documents;
pub mod error;
pub mod validators;

// Re-exports for convenience
pub use error::{Error, ParseError, Result};
pub use validators::{
    Chunk, DecodeOptions, EncodeOptions, ValidationError, ValidationMode, XsdComponent,
    XsdValidator,
};

/// Version of the xmlschema-validator library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// XSD 1.0 namespace
pub const XSD_1_0_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
