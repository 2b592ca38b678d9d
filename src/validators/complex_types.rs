//! XSD Complex Types
//!
//! A complex type combines an attribute group with its content: nothing, a
//! simple type for the character data, or a model group for the child
//! elements. Decoded values are JSON objects where attributes carry the
//! configured prefix and character data sits under the text key.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#Complex_Type_Definitions

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::documents::{AttributeMap, Element};
use crate::error::{ParseError, Result, ValidationError};

use super::attributes::XsdAttributeGroup;
use super::checks::{CheckContext, CheckToken, ValidityTracker, XsdComponent};
use super::groups::XsdGroup;
use super::simple_types::XsdAtomicType;
use super::validation::{Chunk, ChunkStream, DecodeOptions, EncodeOptions, Gather, Step, XsdValidator};

/// Content type of a complex type
#[derive(Debug, Clone)]
pub enum ComplexContent {
    /// No character data and no child elements
    Empty,
    /// Character data only, of a simple type
    Simple(Arc<XsdAtomicType>),
    /// Child elements matched by a model group
    Model(Arc<XsdGroup>),
}

impl ComplexContent {
    /// Get the content type label
    pub fn label(&self) -> &'static str {
        match self {
            ComplexContent::Empty => "empty",
            ComplexContent::Simple(_) => "simple",
            ComplexContent::Model(_) => "element-only",
        }
    }
}

/// Decoded parts of an element, merged into one object at the end
enum Decoded {
    Attributes(Map<String, Value>),
    Text(Value),
    Children(Map<String, Value>),
}

/// Encoded parts of an element, assembled into one element at the end
enum Encoded {
    Attributes(AttributeMap),
    Text(String),
    Children(Vec<Element>),
}

/// XSD complex type definition
#[derive(Debug)]
pub struct XsdComplexType {
    name: Option<String>,
    attributes: Arc<XsdAttributeGroup>,
    content: ComplexContent,
    mixed: bool,
    tracker: ValidityTracker,
    context: Arc<CheckContext>,
}

impl XsdComplexType {
    /// Create an anonymous complex type with empty content and no attributes
    pub fn new(context: &Arc<CheckContext>) -> Self {
        Self {
            name: None,
            attributes: Arc::new(XsdAttributeGroup::anonymous(context)),
            content: ComplexContent::Empty,
            mixed: false,
            tracker: ValidityTracker::new(),
            context: Arc::clone(context),
        }
    }

    /// Set the type name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the attribute uses
    pub fn with_attributes(mut self, attributes: Arc<XsdAttributeGroup>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Set the content type
    pub fn with_content(mut self, content: ComplexContent) -> Self {
        self.content = content;
        self
    }

    /// Allow character data between child elements
    pub fn with_mixed(mut self, mixed: bool) -> Self {
        self.mixed = mixed;
        self
    }

    /// Get the type name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Get the attribute uses
    pub fn attributes(&self) -> &Arc<XsdAttributeGroup> {
        &self.attributes
    }

    /// Get the content type
    pub fn content(&self) -> &ComplexContent {
        &self.content
    }

    /// Whether character data is allowed among child elements
    pub fn is_mixed(&self) -> bool {
        self.mixed
    }

    fn error(&self, message: impl Into<String>, path: Option<&str>) -> ValidationError {
        ValidationError::new(message)
            .with_validator(self.describe())
            .with_optional_path(path)
    }

    pub(crate) fn decode_stream<'a>(
        &'a self,
        data: &'a Element,
        options: &DecodeOptions,
    ) -> ChunkStream<'a, Value> {
        let skip = options.mode.is_skip();
        let path = options.path.as_deref();
        let mut steps: Vec<Step<'a, (), Decoded>> = Vec::new();

        let attributes = self.attributes.decode_stream(&data.attributes, options);
        steps.push(Step::Child((), Box::new(attributes.map(|c| c.map(Decoded::Attributes)))));

        match self.content {
            ComplexContent::Empty => {
                if !skip && !data.children.is_empty() {
                    steps.push(Step::Error(
                        self.error("an element of empty content can't have child elements", path),
                    ));
                }
                if !skip && data.has_text() {
                    steps.push(Step::Error(
                        self.error("character data is not allowed in empty content", path),
                    ));
                }
            }
            ComplexContent::Simple(ref simple_type) => {
                if !skip && !data.children.is_empty() {
                    steps.push(Step::Error(
                        self.error("an element of simple content can't have child elements", path),
                    ));
                }
                let text = data.text.as_deref().unwrap_or("");
                let value = simple_type.decode_stream(text, options);
                steps.push(Step::Child((), Box::new(value.map(|c| c.map(Decoded::Text)))));
            }
            ComplexContent::Model(ref group) => {
                if data.has_text() {
                    match data.text {
                        Some(ref text) if self.mixed => {
                            steps.push(Step::Value((), Decoded::Text(Value::String(text.clone()))))
                        }
                        _ if !skip => steps.push(Step::Error(
                            self.error("character data is not allowed in element-only content", path)
                                .with_instance(data.text.as_deref().unwrap_or_default()),
                        )),
                        _ => {}
                    }
                }
                let children = group.decode_stream(&data.children, options);
                steps.push(Step::Child((), Box::new(children.map(|c| c.map(Decoded::Children)))));
            }
        }

        let attribute_prefix = options.attribute_prefix.clone();
        let text_key = options.text_key.clone();
        Gather::new(steps.into_iter(), move |parts: Vec<((), Decoded)>| {
            let mut object = Map::new();
            for (_, part) in parts {
                match part {
                    Decoded::Attributes(attributes) => {
                        for (name, value) in attributes {
                            object.insert(format!("{}{}", attribute_prefix, name), value);
                        }
                    }
                    Decoded::Text(value) => {
                        object.insert(text_key.clone(), value);
                    }
                    Decoded::Children(children) => object.extend(children),
                }
            }
            Value::Object(object)
        })
        .skip_errors(skip)
        .into_stream()
    }

    /// Encode a JSON object; the resulting element has no tag
    pub(crate) fn encode_stream<'a>(
        &'a self,
        value: &'a Value,
        options: &EncodeOptions,
    ) -> ChunkStream<'a, Element> {
        let skip = options.mode.is_skip();
        let object = match value {
            Value::Object(object) => object,
            other => {
                let error = ValidationError::encode(self.describe(), other.to_string(), "a JSON object is required")
                    .with_optional_path(options.path.as_deref());
                let error = (!skip).then_some(Chunk::Error(error));
                let value = (!options.mode.is_strict()).then(|| Chunk::Value(Element::default()));
                return Box::new(error.into_iter().chain(value));
            }
        };

        let mut attributes = Vec::new();
        let mut children = Vec::new();
        let mut text = None;
        for (key, value) in object {
            let attribute = if options.attribute_prefix.is_empty() {
                self.attributes.get(key).map(|_| key.as_str())
            } else {
                key.strip_prefix(options.attribute_prefix.as_str())
            };
            if let Some(name) = attribute {
                attributes.push((name, value));
            } else if *key == options.text_key {
                text = Some(value);
            } else {
                children.push((key.as_str(), value));
            }
        }

        let path = options.path.as_deref();
        let mut steps: Vec<Step<'a, (), Encoded>> = Vec::new();
        let encoded = self.attributes.encode_entries(attributes, options);
        steps.push(Step::Child((), Box::new(encoded.map(|c| c.map(Encoded::Attributes)))));

        match self.content {
            ComplexContent::Empty => {
                if !skip && (!children.is_empty() || text.is_some()) {
                    steps.push(Step::Error(
                        self.error("an element of empty content can't have content", path),
                    ));
                }
            }
            ComplexContent::Simple(ref simple_type) => {
                if !skip && !children.is_empty() {
                    steps.push(Step::Error(
                        self.error("an element of simple content can't have child elements", path),
                    ));
                }
                if let Some(text) = text {
                    let encoded = simple_type.encode_stream(text, options);
                    steps.push(Step::Child((), Box::new(encoded.map(|c| c.map(Encoded::Text)))));
                }
            }
            ComplexContent::Model(ref group) => {
                match text {
                    Some(Value::String(text)) if self.mixed => {
                        steps.push(Step::Value((), Encoded::Text(text.clone())))
                    }
                    Some(text) if !skip => steps.push(Step::Error(
                        ValidationError::encode(
                            self.describe(),
                            text.to_string(),
                            "character data is not allowed in element-only content",
                        )
                        .with_optional_path(path),
                    )),
                    _ => {}
                }
                let encoded = group.encode_entries(children, options);
                steps.push(Step::Child((), Box::new(encoded.map(|c| c.map(Encoded::Children)))));
            }
        }

        Gather::new(steps.into_iter(), |parts: Vec<((), Encoded)>| {
            let mut element = Element::default();
            for (_, part) in parts {
                match part {
                    Encoded::Attributes(attributes) => element.attributes = attributes,
                    Encoded::Text(text) => element.text = Some(text),
                    Encoded::Children(children) => element.children = children,
                }
            }
            element
        })
        .skip_errors(skip)
        .into_stream()
    }
}

impl fmt::Display for XsdComplexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(ref name) => write!(f, "complexType '{}'", name),
            None => write!(f, "anonymous complexType ({} content)", self.content.label()),
        }
    }
}

impl XsdComponent for XsdComplexType {
    fn tracker(&self) -> &ValidityTracker {
        &self.tracker
    }

    fn check_token(&self) -> Result<CheckToken> {
        Ok(self.context.current())
    }

    fn describe(&self) -> String {
        self.to_string()
    }

    fn components(&self) -> Vec<Arc<dyn XsdComponent>> {
        let mut components = vec![Arc::clone(&self.attributes) as Arc<dyn XsdComponent>];
        match self.content {
            ComplexContent::Empty => {}
            ComplexContent::Simple(ref t) => components.push(Arc::clone(t) as Arc<dyn XsdComponent>),
            ComplexContent::Model(ref g) => components.push(Arc::clone(g) as Arc<dyn XsdComponent>),
        }
        components
    }

    fn check_content(&self) -> Vec<ParseError> {
        if self.mixed && !matches!(self.content, ComplexContent::Model(_)) {
            let error = ParseError::new(format!(
                "mixed content is not allowed with {} content",
                self.content.label()
            ));
            return vec![error.with_component(self.describe())];
        }
        Vec::new()
    }
}

impl XsdValidator for XsdComplexType {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::attributes::{AttributeUse, XsdAttribute};
    use crate::validators::base::ValidationMode;
    use crate::validators::builtins::BuiltinType;
    use crate::validators::checks::check_report;
    use crate::validators::elements::{ElementType, XsdElement};
    use crate::validators::groups::ModelType;
    use crate::validators::particles::Occurs;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn id_attributes(context: &Arc<CheckContext>) -> Arc<XsdAttributeGroup> {
        let string = XsdAtomicType::builtin(BuiltinType::String, context);
        let group = XsdAttributeGroup::anonymous(context)
            .with_attribute(Arc::new(
                XsdAttribute::new("id", string, context).with_use(AttributeUse::Required),
            ))
            .unwrap();
        Arc::new(group)
    }

    fn note_type(context: &Arc<CheckContext>, mixed: bool) -> XsdComplexType {
        let string = XsdAtomicType::builtin(BuiltinType::String, context);
        let to = Arc::new(XsdElement::with_type("to", ElementType::Simple(string), context));
        let group = XsdGroup::new(ModelType::Sequence, context).with_particle(to, Occurs::once());
        XsdComplexType::new(context)
            .with_name("note")
            .with_attributes(id_attributes(context))
            .with_content(ComplexContent::Model(Arc::new(group)))
            .with_mixed(mixed)
    }

    #[test]
    fn test_encode_non_object() {
        let context = CheckContext::shared();
        let note = note_type(&context, false);
        let value = json!("not an object");

        let skip = EncodeOptions::new().with_mode(ValidationMode::Skip);
        let chunks: Vec<_> = note.encode_stream(&value, &skip).collect();
        assert_eq!(chunks, vec![Chunk::Value(Element::default())]);

        let lax = EncodeOptions::new().with_mode(ValidationMode::Lax);
        let chunks: Vec<_> = note.encode_stream(&value, &lax).collect();
        assert_eq!(chunks.len(), 2);
        let reason = chunks[0].clone().into_error().and_then(|e| e.reason().map(str::to_string));
        assert_eq!(reason.as_deref(), Some("a JSON object is required"));
        assert_eq!(chunks[1], Chunk::Value(Element::default()));

        assert!(note.encode(&value).unwrap_err().is_validation());
    }

    #[test]
    fn test_decode_model_content() {
        let context = CheckContext::shared();
        let note = note_type(&context, false);
        let data = Element::new("note")
            .with_attribute("id", "n1")
            .with_child(Element::new("to").with_text("Ann"));

        assert_eq!(note.decode(&data).unwrap(), json!({"@id": "n1", "to": "Ann"}));

        let mut options = DecodeOptions::new();
        options.attribute_prefix = String::new();
        assert_eq!(note.decode_with(&data, options).unwrap(), json!({"id": "n1", "to": "Ann"}));
    }

    #[test]
    fn test_mixed_text() {
        let context = CheckContext::shared();
        let data = Element::new("note")
            .with_attribute("id", "n1")
            .with_text("Hi")
            .with_child(Element::new("to").with_text("Ann"));

        let strict = note_type(&context, false);
        let errors: Vec<_> = strict.iter_errors(&data).unwrap().collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message().contains("element-only content"));

        let mixed = note_type(&context, true);
        assert_eq!(mixed.decode(&data).unwrap(), json!({"@id": "n1", "$": "Hi", "to": "Ann"}));
    }

    #[test]
    fn test_simple_and_empty_content() {
        let context = CheckContext::shared();
        let price = XsdComplexType::new(&context)
            .with_attributes(id_attributes(&context))
            .with_content(ComplexContent::Simple(XsdAtomicType::builtin(BuiltinType::Double, &context)));
        let data = Element::new("price").with_attribute("id", "p").with_text("9.5");
        assert_eq!(price.decode(&data).unwrap(), json!({"@id": "p", "$": 9.5}));

        let empty = XsdComplexType::new(&context);
        assert_eq!(empty.decode(&Element::new("br")).unwrap(), json!({}));
        let data = Element::new("br").with_text("x").with_child(Element::new("y"));
        assert_eq!(empty.iter_errors(&data).unwrap().count(), 2);

        let skip = DecodeOptions::new().with_mode(ValidationMode::Skip);
        assert!(empty.iter_decode(&data, skip).unwrap().all(|c| !c.is_error()));
    }

    #[test]
    fn test_encode() {
        let context = CheckContext::shared();
        let note = note_type(&context, true);
        let native = json!({"@id": "n1", "$": "Hi", "to": "Ann"});

        let encoded = note.encode(&native).unwrap();
        assert_eq!(encoded.get_attribute("id"), Some("n1"));
        assert_eq!(encoded.text.as_deref(), Some("Hi"));
        assert_eq!(encoded.children, vec![Element::new("to").with_text("Ann")]);

        assert!(note.encode(&json!([1, 2])).unwrap_err().is_validation());
        let lax = EncodeOptions::new().with_mode(ValidationMode::Lax);
        assert!(note.encode_with(&json!("note"), lax).is_err());
    }

    #[test]
    fn test_check_content() {
        let context = CheckContext::shared();
        let content = ComplexContent::Simple(XsdAtomicType::builtin(BuiltinType::String, &context));
        let invalid = XsdComplexType::new(&context).with_content(content).with_mixed(true);
        let report = check_report(&invalid).unwrap();
        assert_eq!(report.errors.len(), 1);
        assert!(check_report(&note_type(&context, false)).unwrap().is_valid());
    }
}
