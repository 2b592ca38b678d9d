//! XML Schema validators
//!
//! Schema components, the check pass that tracks their validity, and the
//! decode/encode protocol every component implements.

// Foundation
pub mod base;
pub mod checks;
pub mod exceptions;
pub mod validation;

// Type system
pub mod builtins;
pub mod particles;
pub mod simple_types;
pub mod attributes;

// Complex structures
pub mod groups;
pub mod models;
pub mod complex_types;
pub mod elements;

// Global declarations
pub mod globals;

// Re-exports
pub use attributes::{AttributeUse, XsdAttribute, XsdAttributeGroup};
pub use base::{ValidationMode, ValidationStatus, ValidityStatus};
pub use builtins::BuiltinType;
pub use checks::{
    check_component, check_report, CheckContext, CheckReport, CheckToken, ValidityTracker,
    XsdComponent,
};
pub use complex_types::{ComplexContent, XsdComplexType};
pub use elements::{ElementType, XsdElement};
pub use exceptions::ValidationError;
pub use globals::{GlobalType, XsdGlobals};
pub use groups::{GroupParticle, ModelType, XsdGroup};
pub use models::{ModelStep, ModelVisitor};
pub use particles::Occurs;
pub use simple_types::{Facet, XsdAtomicType};
pub use validation::{
    Chunk, ChunkStream, DecodeOptions, EncodeOptions, ErrorStream, NamespaceMap, XsdValidator,
};
