//! XSD Element Validators
//!
//! Element declarations. The type of an element is bound once after the
//! declaration is created, so that an element can be referenced from the
//! content model of its own type (directly or through other declarations).
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#Element_Declarations

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde_json::Value;

use crate::documents::Element;
use crate::error::{Error, ParseError, Result, ValidationError};

use super::checks::{CheckContext, CheckToken, ValidityTracker, XsdComponent};
use super::complex_types::XsdComplexType;
use super::simple_types::XsdAtomicType;
use super::validation::{Chunk, ChunkStream, DecodeOptions, EncodeOptions, XsdValidator};

/// The type of an element - either simple or complex
#[derive(Debug, Clone)]
pub enum ElementType {
    /// Simple type content (text only)
    Simple(Arc<XsdAtomicType>),
    /// Complex type content
    Complex(Arc<XsdComplexType>),
}

impl ElementType {
    /// Check if this is a simple type
    pub fn is_simple(&self) -> bool {
        matches!(self, ElementType::Simple(_))
    }

    /// Check if this is a complex type
    pub fn is_complex(&self) -> bool {
        matches!(self, ElementType::Complex(_))
    }

    /// The type as a checkable component
    pub fn as_component(&self) -> Arc<dyn XsdComponent> {
        match self {
            ElementType::Simple(t) => Arc::clone(t) as Arc<dyn XsdComponent>,
            ElementType::Complex(t) => Arc::clone(t) as Arc<dyn XsdComponent>,
        }
    }
}

/// XSD element declaration
pub struct XsdElement {
    name: String,
    element_type: OnceLock<ElementType>,
    default: Option<String>,
    fixed: Option<String>,
    tracker: ValidityTracker,
    context: Arc<CheckContext>,
}

impl XsdElement {
    /// Create an element declaration with no type bound yet
    pub fn new(name: impl Into<String>, context: &Arc<CheckContext>) -> Self {
        Self::build(name.into(), OnceLock::new(), context)
    }

    /// Create an element declaration with its type
    pub fn with_type(
        name: impl Into<String>,
        element_type: ElementType,
        context: &Arc<CheckContext>,
    ) -> Self {
        Self::build(name.into(), OnceLock::from(element_type), context)
    }

    fn build(name: String, element_type: OnceLock<ElementType>, context: &Arc<CheckContext>) -> Self {
        Self {
            name,
            element_type,
            default: None,
            fixed: None,
            tracker: ValidityTracker::new(),
            context: Arc::clone(context),
        }
    }

    /// Set the default value
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Set the fixed value
    pub fn with_fixed(mut self, value: impl Into<String>) -> Self {
        self.fixed = Some(value.into());
        self
    }

    /// Bind the element type; an element can be bound only once
    pub fn bind_type(&self, element_type: ElementType) -> Result<()> {
        self.element_type
            .set(element_type)
            .map_err(|_| Error::Value(format!("type of element '{}' is already bound", self.name)))
    }

    /// Get the element name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the element type, if bound
    pub fn element_type(&self) -> Option<&ElementType> {
        self.element_type.get()
    }

    /// Get the value constraint (fixed or default)
    pub fn value_constraint(&self) -> Option<&str> {
        self.fixed.as_deref().or(self.default.as_deref())
    }

    pub(crate) fn decode_stream<'a>(
        &'a self,
        data: &'a Element,
        options: &DecodeOptions,
    ) -> ChunkStream<'a, Value> {
        let options = options.child(&data.tag);
        let skip = options.mode.is_skip();
        let error = |message: String| {
            ValidationError::new(message)
                .with_validator(self.describe())
                .with_optional_path(options.path.as_deref())
        };

        let mut errors = Vec::new();
        if !skip && data.tag != self.name {
            errors.push(
                error(format!("Unexpected tag '{}'", data.tag)).with_expected(self.name.as_str()),
            );
        }

        let content: ChunkStream<'a, Value> = match self.element_type.get() {
            None => {
                if !skip {
                    errors.push(error(format!("type of element '{}' is not bound", self.name)));
                }
                Box::new(std::iter::once(Chunk::Value(Value::Null)))
            }
            Some(ElementType::Complex(complex_type)) => complex_type.decode_stream(data, &options),
            Some(ElementType::Simple(simple_type)) => {
                if !skip && !data.children.is_empty() {
                    errors.push(error(
                        "an element of simple type can't have child elements".to_string(),
                    ));
                }
                let text = match (data.text.as_deref(), self.value_constraint()) {
                    (None | Some(""), Some(constraint)) if options.use_defaults => constraint,
                    (Some(text), _) => text,
                    (None, _) => "",
                };
                if let Some(ref fixed) = self.fixed {
                    if !skip && text != fixed.as_str() {
                        errors.push(
                            error(format!("value of element '{}' must be '{}'", self.name, fixed))
                                .with_instance(text),
                        );
                    }
                }
                simple_type.decode_stream(text, &options)
            }
        };

        Box::new(errors.into_iter().map(Chunk::Error).chain(content))
    }

    pub(crate) fn encode_stream<'a>(
        &'a self,
        value: &'a Value,
        options: &EncodeOptions,
    ) -> ChunkStream<'a, Element> {
        let options = options.child(&self.name);
        match self.element_type.get() {
            None => {
                let error = ValidationError::encode(
                    self.describe(),
                    value.to_string(),
                    format!("type of element '{}' is not bound", self.name),
                )
                .with_optional_path(options.path.as_deref());
                let mut chunks = vec![Chunk::Value(Element::new(self.name.as_str()))];
                if !options.mode.is_skip() {
                    chunks.insert(0, Chunk::Error(error));
                }
                Box::new(chunks.into_iter())
            }
            Some(ElementType::Simple(simple_type)) => Box::new(
                simple_type
                    .encode_stream(value, &options)
                    .map(move |chunk| chunk.map(|text| Element::new(self.name.as_str()).with_text(text))),
            ),
            Some(ElementType::Complex(complex_type)) => Box::new(
                complex_type.encode_stream(value, &options).map(move |chunk| {
                    chunk.map(|mut element| {
                        element.tag = self.name.clone();
                        element
                    })
                }),
            ),
        }
    }
}

impl fmt::Debug for XsdElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XsdElement")
            .field("name", &self.name)
            .field("bound", &self.element_type.get().is_some())
            .field("default", &self.default)
            .field("fixed", &self.fixed)
            .finish_non_exhaustive()
    }
}

impl XsdComponent for XsdElement {
    fn tracker(&self) -> &ValidityTracker {
        &self.tracker
    }

    fn check_token(&self) -> Result<CheckToken> {
        Ok(self.context.current())
    }

    fn describe(&self) -> String {
        format!("element '{}'", self.name)
    }

    fn components(&self) -> Vec<Arc<dyn XsdComponent>> {
        self.element_type
            .get()
            .map(ElementType::as_component)
            .into_iter()
            .collect()
    }

    fn check_content(&self) -> Vec<ParseError> {
        let mut errors = Vec::new();
        if self.default.is_some() && self.fixed.is_some() {
            errors.push(ParseError::new(
                "'default' and 'fixed' attributes are mutually exclusive",
            ));
        }
        match self.element_type.get() {
            None => errors.push(ParseError::new("element type is not bound")),
            Some(ElementType::Simple(simple_type)) => {
                if let Some(constraint) = self.value_constraint() {
                    let options = DecodeOptions::new().with_mode(super::base::ValidationMode::Lax);
                    if simple_type.decode_stream(constraint, &options).any(|c| c.is_error()) {
                        errors.push(ParseError::new(format!(
                            "value constraint '{}' is not valid for {}",
                            constraint,
                            simple_type.describe()
                        )));
                    }
                }
            }
            Some(ElementType::Complex(_)) => {
                if self.value_constraint().is_some() {
                    errors.push(ParseError::new(
                        "a value constraint requires a simple type or simple content",
                    ));
                }
            }
        }
        errors
            .into_iter()
            .map(|e| e.with_component(self.describe()))
            .collect()
    }
}

impl XsdValidator for XsdElement {
    type Serialized = Element;
    type Native = Value;

    fn iter_decode<'a>(
        &'a self,
        data: &'a Element,
        options: DecodeOptions,
    ) -> Result<ChunkStream<'a, Value>> {
        Ok(self.decode_stream(data, &options))
    }

    fn iter_encode<'a>(
        &'a self,
        data: &'a Value,
        options: EncodeOptions,
    ) -> Result<ChunkStream<'a, Element>> {
        Ok(self.encode_stream(data, &options))
    }
}
