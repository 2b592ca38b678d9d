//! XSD Attribute validators
//!
//! Attribute declarations and attribute groups. An attribute decodes a single
//! text value through its simple type; an attribute group decodes a whole
//! attribute map, reporting undeclared, prohibited and missing attributes.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#Attribute_Declarations

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::documents::AttributeMap;
use crate::error::{Error, ParseError, Result, ValidationError};

use super::checks::{CheckContext, CheckToken, ValidityTracker, XsdComponent};
use super::simple_types::XsdAtomicType;
use super::validation::{
    Chunk, ChunkStream, DecodeOptions, EncodeOptions, Gather, Step, XsdValidator,
};

/// Attribute use mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeUse {
    /// Attribute is optional (default)
    #[default]
    Optional,
    /// Attribute is required
    Required,
    /// Attribute is prohibited
    Prohibited,
}

impl AttributeUse {
    /// Get as string
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeUse::Optional => "optional",
            AttributeUse::Required => "required",
            AttributeUse::Prohibited => "prohibited",
        }
    }
}

impl FromStr for AttributeUse {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "optional" => Ok(AttributeUse::Optional),
            "required" => Ok(AttributeUse::Required),
            "prohibited" => Ok(AttributeUse::Prohibited),
            _ => Err(Error::Value(format!("Invalid attribute use: '{}'", s))),
        }
    }
}

impl fmt::Display for AttributeUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Attribute Declaration
// =============================================================================

/// XSD attribute declaration
#[derive(Debug)]
pub struct XsdAttribute {
    name: String,
    simple_type: Arc<XsdAtomicType>,
    use_mode: AttributeUse,
    default: Option<String>,
    fixed: Option<String>,
    tracker: ValidityTracker,
    context: Arc<CheckContext>,
}

impl XsdAttribute {
    /// Create a new optional attribute declaration
    pub fn new(
        name: impl Into<String>,
        simple_type: Arc<XsdAtomicType>,
        context: &Arc<CheckContext>,
    ) -> Self {
        Self {
            name: name.into(),
            simple_type,
            use_mode: AttributeUse::Optional,
            default: None,
            fixed: None,
            tracker: ValidityTracker::new(),
            context: Arc::clone(context),
        }
    }

    /// Set the use mode
    pub fn with_use(mut self, use_mode: AttributeUse) -> Self {
        self.use_mode = use_mode;
        self
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

    /// Get the attribute name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the use mode
    pub fn use_mode(&self) -> AttributeUse {
        self.use_mode
    }

    /// Check if required
    pub fn is_required(&self) -> bool {
        self.use_mode == AttributeUse::Required
    }

    /// Get the simple type
    pub fn simple_type(&self) -> &Arc<XsdAtomicType> {
        &self.simple_type
    }

    /// Get the value constraint (fixed or default)
    pub fn value_constraint(&self) -> Option<&str> {
        self.fixed.as_deref().or(self.default.as_deref())
    }

    pub(crate) fn decode_stream<'a>(
        &'a self,
        text: &'a str,
        options: &DecodeOptions,
    ) -> ChunkStream<'a, Value> {
        let fixed_error = match self.fixed {
            Some(ref fixed) if !options.mode.is_skip() && text != fixed.as_str() => Some(
                ValidationError::new(format!(
                    "attribute '{}' has a fixed value '{}'",
                    self.name, fixed
                ))
                .with_instance(text)
                .with_validator(self.describe())
                .with_optional_path(options.path.as_deref()),
            ),
            _ => None,
        };
        let value = self.simple_type.decode_stream(text, options);
        Box::new(fixed_error.into_iter().map(Chunk::Error).chain(value))
    }

    pub(crate) fn encode_stream<'a>(
        &'a self,
        value: &'a Value,
        options: &EncodeOptions,
    ) -> ChunkStream<'a, String> {
        self.simple_type.encode_stream(value, options)
    }
}

impl XsdComponent for XsdAttribute {
    fn tracker(&self) -> &ValidityTracker {
        &self.tracker
    }

    fn check_token(&self) -> Result<CheckToken> {
        Ok(self.context.current())
    }

    fn describe(&self) -> String {
        format!("attribute '{}'", self.name)
    }

    fn components(&self) -> Vec<Arc<dyn XsdComponent>> {
        vec![Arc::clone(&self.simple_type) as Arc<dyn XsdComponent>]
    }

    fn check_content(&self) -> Vec<ParseError> {
        let mut errors = Vec::new();
        if self.default.is_some() && self.fixed.is_some() {
            errors.push(ParseError::new(
                "'default' and 'fixed' attributes are mutually exclusive",
            ));
        }
        if self.default.is_some() && self.use_mode != AttributeUse::Optional {
            errors.push(ParseError::new(
                "Attribute 'use' must be 'optional' if 'default' is present",
            ));
        }
        if let Some(constraint) = self.value_constraint() {
            let options = DecodeOptions::new().with_mode(super::base::ValidationMode::Lax);
            if let Some(error) = self
                .simple_type
                .decode_stream(constraint, &options)
                .find_map(Chunk::into_error)
            {
                errors.push(ParseError::new(format!(
                    "value constraint '{}' is not valid: {}",
                    constraint,
                    error.message()
                )));
            }
        }
        errors
            .into_iter()
            .map(|e| e.with_component(self.describe()))
            .collect()
    }
}

impl XsdValidator for XsdAttribute {
    type Serialized = String;
    type Native = Value;

    fn iter_decode<'a>(
        &'a self,
        data: &'a String,
        options: DecodeOptions,
    ) -> Result<ChunkStream<'a, Value>> {
        Ok(self.decode_stream(data, &options))
    }

    fn iter_encode<'a>(
        &'a self,
        data: &'a Value,
        options: EncodeOptions,
    ) -> Result<ChunkStream<'a, String>> {
        Ok(self.encode_stream(data, &options))
    }
}

// =============================================================================
// Attribute Group
// =============================================================================

/// XSD attribute group: the attribute uses of a complex type or a named group
#[derive(Debug)]
pub struct XsdAttributeGroup {
    name: Option<String>,
    attributes: IndexMap<String, Arc<XsdAttribute>>,
    tracker: ValidityTracker,
    context: Arc<CheckContext>,
}

impl XsdAttributeGroup {
    /// Create a named attribute group
    pub fn new(name: impl Into<String>, context: &Arc<CheckContext>) -> Self {
        let mut group = Self::anonymous(context);
        group.name = Some(name.into());
        group
    }

    /// Create an anonymous attribute group
    pub fn anonymous(context: &Arc<CheckContext>) -> Self {
        Self {
            name: None,
            attributes: IndexMap::new(),
            tracker: ValidityTracker::new(),
            context: Arc::clone(context),
        }
    }

    /// Add an attribute, rejecting duplicates
    pub fn add_attribute(&mut self, attribute: Arc<XsdAttribute>) -> Result<()> {
        let name = attribute.name().to_string();
        if self.attributes.contains_key(&name) {
            return Err(Error::Value(format!("Duplicate attribute: {}", name)));
        }
        self.attributes.insert(name, attribute);
        Ok(())
    }

    /// Add an attribute, builder style
    pub fn with_attribute(mut self, attribute: Arc<XsdAttribute>) -> Result<Self> {
        self.add_attribute(attribute)?;
        Ok(self)
    }

    /// Add every attribute of another group
    pub fn extend_from(&mut self, group: &XsdAttributeGroup) -> Result<()> {
        for attribute in group.iter_attributes() {
            self.add_attribute(Arc::clone(attribute))?;
        }
        Ok(())
    }

    /// Get the group name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Look up an attribute by name
    pub fn get(&self, name: &str) -> Option<&Arc<XsdAttribute>> {
        self.attributes.get(name)
    }

    /// Iterate over attributes
    pub fn iter_attributes(&self) -> impl Iterator<Item = &Arc<XsdAttribute>> {
        self.attributes.values()
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Whether the group declares no attributes
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub(crate) fn decode_stream<'a>(
        &'a self,
        data: &'a AttributeMap,
        options: &DecodeOptions,
    ) -> ChunkStream<'a, Map<String, Value>> {
        let present_options = options.clone();
        let present = data.iter().map(move |(name, value)| {
            let options = present_options.child(&format!("@{}", name));
            match self.attributes.get(name) {
                Some(attribute) if attribute.use_mode() == AttributeUse::Prohibited => {
                    Step::Error(
                        ValidationError::new(format!("attribute '{}' is prohibited", name))
                            .with_validator(self.describe())
                            .with_optional_path(options.path.as_deref()),
                    )
                }
                Some(attribute) => Step::Child(name.clone(), attribute.decode_stream(value, &options)),
                None => Step::Error(
                    ValidationError::new(format!("'{}' attribute not allowed for element", name))
                        .with_instance(value.as_str())
                        .with_validator(self.describe())
                        .with_optional_path(options.path.as_deref()),
                ),
            }
        });

        let absent_options = options.clone();
        let absent = self
            .attributes
            .values()
            .filter(move |attribute| !data.contains_key(attribute.name()))
            .filter_map(move |attribute| {
                let options = absent_options.child(&format!("@{}", attribute.name()));
                if attribute.is_required() {
                    return Some(Step::Error(
                        ValidationError::new(format!(
                            "missing required attribute '{}'",
                            attribute.name()
                        ))
                        .with_validator(self.describe())
                        .with_optional_path(options.path.as_deref()),
                    ));
                }
                match attribute.value_constraint() {
                    Some(constraint) if options.use_defaults => Some(Step::Child(
                        attribute.name().to_string(),
                        attribute.decode_stream(constraint, &options),
                    )),
                    _ => None,
                }
            });

        Gather::new(present.chain(absent), |values: Vec<(String, Value)>| {
            values.into_iter().collect::<Map<String, Value>>()
        })
        .skip_errors(options.mode.is_skip())
        .into_stream()
    }

    /// Encode `(name, value)` entries into an attribute map
    pub(crate) fn encode_entries<'a>(
        &'a self,
        entries: Vec<(&'a str, &'a Value)>,
        options: &EncodeOptions,
    ) -> ChunkStream<'a, AttributeMap> {
        let names: Vec<&'a str> = entries.iter().map(|(name, _)| *name).collect();

        let present_options = options.clone();
        let present = entries.into_iter().map(move |(name, value)| {
            let options = present_options.child(&format!("@{}", name));
            match self.attributes.get(name) {
                Some(attribute) if attribute.use_mode() != AttributeUse::Prohibited => {
                    Step::Child(name.to_string(), attribute.encode_stream(value, &options))
                }
                _ => Step::Error(
                    ValidationError::encode(self.describe(), value.to_string(), format!("'{}' attribute not allowed", name))
                        .with_optional_path(options.path.as_deref()),
                ),
            }
        });

        let absent_options = options.clone();
        let absent = self
            .attributes
            .values()
            .filter(move |attribute| attribute.is_required() && !names.contains(&attribute.name()))
            .map(move |attribute| {
                Step::Error(
                    ValidationError::new(format!("missing required attribute '{}'", attribute.name()))
                        .with_validator(self.describe())
                        .with_optional_path(absent_options.path.as_deref()),
                )
            });

        Gather::new(present.chain(absent), |values: Vec<(String, String)>| {
            values.into_iter().collect::<AttributeMap>()
        })
        .skip_errors(options.mode.is_skip())
        .into_stream()
    }
}

impl XsdComponent for XsdAttributeGroup {
    fn tracker(&self) -> &ValidityTracker {
        &self.tracker
    }

    fn check_token(&self) -> Result<CheckToken> {
        Ok(self.context.current())
    }

    fn describe(&self) -> String {
        match self.name {
            Some(ref name) => format!("attributeGroup '{}'", name),
            None => "anonymous attributeGroup".to_string(),
        }
    }

    fn components(&self) -> Vec<Arc<dyn XsdComponent>> {
        self.attributes
            .values()
            .map(|a| Arc::clone(a) as Arc<dyn XsdComponent>)
            .collect()
    }
}

impl XsdValidator for XsdAttributeGroup {
    type Serialized = AttributeMap;
    type Native = Map<String, Value>;

    fn iter_decode<'a>(
        &'a self,
        data: &'a AttributeMap,
        options: DecodeOptions,
    ) -> Result<ChunkStream<'a, Map<String, Value>>> {
        Ok(self.decode_stream(data, &options))
    }

    fn iter_encode<'a>(
        &'a self,
        data: &'a Map<String, Value>,
        options: EncodeOptions,
    ) -> Result<ChunkStream<'a, AttributeMap>> {
        let entries = data.iter().map(|(k, v)| (k.as_str(), v)).collect();
        Ok(self.encode_entries(entries, &options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::base::ValidationMode;
    use crate::validators::builtins::BuiltinType;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn book_attributes(context: &Arc<CheckContext>) -> XsdAttributeGroup {
        let string = XsdAtomicType::builtin(BuiltinType::String, context);
        let integer = XsdAtomicType::builtin(BuiltinType::Integer, context);
        XsdAttributeGroup::anonymous(context)
            .with_attribute(Arc::new(
                XsdAttribute::new("id", Arc::clone(&string), context).with_use(AttributeUse::Required),
            ))
            .unwrap()
            .with_attribute(Arc::new(XsdAttribute::new("edition", integer, context).with_default("1")))
            .unwrap()
            .with_attribute(Arc::new(XsdAttribute::new("lang", string, context).with_fixed("en")))
            .unwrap()
    }

    fn attrs(pairs: &[(&str, &str)]) -> AttributeMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_attribute_use_from_str() {
        assert_eq!("required".parse::<AttributeUse>().unwrap(), AttributeUse::Required);
        assert!("mandatory".parse::<AttributeUse>().is_err());
    }

    #[test]
    fn test_attribute_fixed_value() {
        let context = CheckContext::shared();
        let string = XsdAtomicType::builtin(BuiltinType::String, &context);
        let attribute = XsdAttribute::new("lang", string, &context).with_fixed("en");

        assert!(attribute.is_valid(&"en".to_string()).unwrap());
        let errors: Vec<_> = attribute.iter_errors(&"fr".to_string()).unwrap().collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message().contains("fixed value"));
    }

    #[test]
    fn test_group_decode_fills_defaults() {
        let context = CheckContext::shared();
        let group = book_attributes(&context);

        let decoded = group.decode(&attrs(&[("id", "b1")])).unwrap();
        assert_eq!(Value::Object(decoded), json!({"id": "b1", "edition": 1, "lang": "en"}));

        let options = DecodeOptions::new().with_use_defaults(false);
        let decoded = group.decode_with(&attrs(&[("id", "b1")]), options).unwrap();
        assert_eq!(Value::Object(decoded), json!({"id": "b1"}));
    }

    #[test]
    fn test_group_errors_in_order() {
        let context = CheckContext::shared();
        let group = book_attributes(&context);
        let data = attrs(&[("edition", "two"), ("color", "red")]);

        let errors: Vec<_> = group.iter_errors(&data).unwrap().collect();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].path(), Some("/@edition"));
        assert!(errors[1].message().contains("'color' attribute not allowed"));
        assert!(errors[2].message().contains("missing required attribute 'id'"));

        let skip = DecodeOptions::new().with_mode(ValidationMode::Skip);
        assert!(group.iter_decode(&data, skip).unwrap().all(|c| !c.is_error()));
    }

    #[test]
    fn test_group_encode() {
        let context = CheckContext::shared();
        let group = book_attributes(&context);

        let native = json!({"id": "b1", "edition": 2});
        let encoded = group.encode(native.as_object().unwrap()).unwrap();
        assert_eq!(encoded, attrs(&[("id", "b1"), ("edition", "2")]));

        let missing = json!({"edition": 2});
        assert!(!group.is_valid_encoding(missing.as_object().unwrap()).unwrap());
    }

    #[test]
    fn test_check_content() {
        let context = CheckContext::shared();
        let integer = XsdAtomicType::builtin(BuiltinType::Integer, &context);
        let attribute = XsdAttribute::new("n", integer, &context)
            .with_use(AttributeUse::Required)
            .with_default("x");
        assert_eq!(attribute.check_content().len(), 2);

        let mut group = book_attributes(&context);
        let duplicate = Arc::clone(group.get("id").unwrap());
        assert!(group.add_attribute(duplicate).is_err());
    }
}
