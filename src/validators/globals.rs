//! Global XSD declarations management
//!
//! [`XsdGlobals`] owns the check context shared by every component of a
//! schema together with the maps of global declarations, and runs the schema
//! check passes over them.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{Error, Result};

use super::attributes::{XsdAttribute, XsdAttributeGroup};
use super::checks::{check_report, CheckContext, CheckReport, CheckToken, ValidityTracker, XsdComponent};
use super::complex_types::XsdComplexType;
use super::elements::{ElementType, XsdElement};
use super::groups::XsdGroup;
use super::simple_types::XsdAtomicType;

/// A global type definition
#[derive(Debug, Clone)]
pub enum GlobalType {
    /// Simple type definition
    Simple(Arc<XsdAtomicType>),
    /// Complex type definition
    Complex(Arc<XsdComplexType>),
}

impl GlobalType {
    /// Check if this is a simple type
    pub fn is_simple(&self) -> bool {
        matches!(self, GlobalType::Simple(_))
    }

    /// Check if this is a complex type
    pub fn is_complex(&self) -> bool {
        matches!(self, GlobalType::Complex(_))
    }

    /// Get as simple type
    pub fn as_simple(&self) -> Option<&Arc<XsdAtomicType>> {
        match self {
            GlobalType::Simple(t) => Some(t),
            GlobalType::Complex(_) => None,
        }
    }

    /// Get as complex type
    pub fn as_complex(&self) -> Option<&Arc<XsdComplexType>> {
        match self {
            GlobalType::Complex(t) => Some(t),
            GlobalType::Simple(_) => None,
        }
    }

    /// The type usable as an element type
    pub fn to_element_type(&self) -> ElementType {
        match self {
            GlobalType::Simple(t) => ElementType::Simple(Arc::clone(t)),
            GlobalType::Complex(t) => ElementType::Complex(Arc::clone(t)),
        }
    }

    fn as_component(&self) -> Arc<dyn XsdComponent> {
        match self {
            GlobalType::Simple(t) => Arc::clone(t) as Arc<dyn XsdComponent>,
            GlobalType::Complex(t) => Arc::clone(t) as Arc<dyn XsdComponent>,
        }
    }
}

fn register<T>(map: &mut IndexMap<String, T>, kind: &str, name: String, item: T) -> Result<()> {
    if map.contains_key(&name) {
        return Err(Error::Value(format!("Duplicate global {}: '{}'", kind, name)));
    }
    map.insert(name, item);
    Ok(())
}

/// Global declarations of a schema
#[derive(Debug)]
pub struct XsdGlobals {
    context: Arc<CheckContext>,
    tracker: ValidityTracker,
    types: IndexMap<String, GlobalType>,
    elements: IndexMap<String, Arc<XsdElement>>,
    attributes: IndexMap<String, Arc<XsdAttribute>>,
    attribute_groups: IndexMap<String, Arc<XsdAttributeGroup>>,
    groups: IndexMap<String, Arc<XsdGroup>>,
}

impl XsdGlobals {
    /// Create empty globals with a fresh check context
    pub fn new() -> Self {
        Self::with_context(CheckContext::shared())
    }

    /// Create empty globals sharing an existing check context
    pub fn with_context(context: Arc<CheckContext>) -> Self {
        Self {
            context,
            tracker: ValidityTracker::new(),
            types: IndexMap::new(),
            elements: IndexMap::new(),
            attributes: IndexMap::new(),
            attribute_groups: IndexMap::new(),
            groups: IndexMap::new(),
        }
    }

    /// The check context components of this schema must be created with
    pub fn context(&self) -> &Arc<CheckContext> {
        &self.context
    }

    /// Register a global simple type
    pub fn register_simple_type(&mut self, name: impl Into<String>, typ: Arc<XsdAtomicType>) -> Result<()> {
        register(&mut self.types, "type", name.into(), GlobalType::Simple(typ))
    }

    /// Register a global complex type
    pub fn register_complex_type(&mut self, name: impl Into<String>, typ: Arc<XsdComplexType>) -> Result<()> {
        register(&mut self.types, "type", name.into(), GlobalType::Complex(typ))
    }

    /// Register a global element under its own name
    pub fn register_element(&mut self, element: Arc<XsdElement>) -> Result<()> {
        let name = element.name().to_string();
        register(&mut self.elements, "element", name, element)
    }

    /// Register a global attribute under its own name
    pub fn register_attribute(&mut self, attribute: Arc<XsdAttribute>) -> Result<()> {
        let name = attribute.name().to_string();
        register(&mut self.attributes, "attribute", name, attribute)
    }

    /// Register a named attribute group
    pub fn register_attribute_group(&mut self, group: Arc<XsdAttributeGroup>) -> Result<()> {
        let name = group
            .name()
            .ok_or_else(|| Error::Value("global attribute groups must be named".to_string()))?
            .to_string();
        register(&mut self.attribute_groups, "attribute group", name, group)
    }

    /// Register a named model group
    pub fn register_group(&mut self, group: Arc<XsdGroup>) -> Result<()> {
        let name = group
            .name()
            .ok_or_else(|| Error::Value("global groups must be named".to_string()))?
            .to_string();
        register(&mut self.groups, "group", name, group)
    }

    /// Lookup a global type
    pub fn lookup_type(&self, name: &str) -> Option<&GlobalType> {
        self.types.get(name)
    }

    /// Lookup a global element
    pub fn lookup_element(&self, name: &str) -> Option<&Arc<XsdElement>> {
        self.elements.get(name)
    }

    /// Lookup a global attribute
    pub fn lookup_attribute(&self, name: &str) -> Option<&Arc<XsdAttribute>> {
        self.attributes.get(name)
    }

    /// Lookup a global attribute group
    pub fn lookup_attribute_group(&self, name: &str) -> Option<&Arc<XsdAttributeGroup>> {
        self.attribute_groups.get(name)
    }

    /// Lookup a global model group
    pub fn lookup_group(&self, name: &str) -> Option<&Arc<XsdGroup>> {
        self.groups.get(name)
    }

    /// Bind the type registered as `type_name` to a global element
    pub fn bind_element_type(&self, element_name: &str, type_name: &str) -> Result<()> {
        let element = self
            .lookup_element(element_name)
            .ok_or_else(|| Error::Value(format!("Unknown global element: '{}'", element_name)))?;
        let typ = self
            .lookup_type(type_name)
            .ok_or_else(|| Error::Value(format!("Unknown global type: '{}'", type_name)))?;
        element.bind_type(typ.to_element_type())
    }

    /// Iterate over global elements
    pub fn iter_elements(&self) -> impl Iterator<Item = &Arc<XsdElement>> {
        self.elements.values()
    }

    /// Iterate over global types
    pub fn iter_types(&self) -> impl Iterator<Item = (&str, &GlobalType)> {
        self.types.iter().map(|(name, typ)| (name.as_str(), typ))
    }

    /// Total number of global declarations
    pub fn total_globals(&self) -> usize {
        self.types.len()
            + self.elements.len()
            + self.attributes.len()
            + self.attribute_groups.len()
            + self.groups.len()
    }

    /// Start a new check generation and check every global component
    ///
    /// Components reached through several globals are checked once; the
    /// report's validity is the validity of the schema as a whole.
    pub fn check_schema(&self) -> Result<CheckReport> {
        let token = self.context.advance();
        tracing::debug!(token = %token, globals = self.total_globals(), "schema check started");
        let report = check_report(self)?;
        tracing::debug!(
            token = %token,
            validity = %report.validity,
            errors = report.errors.len(),
            "schema check finished"
        );
        Ok(report)
    }
}

impl Default for XsdGlobals {
    fn default() -> Self {
        Self::new()
    }
}

impl XsdComponent for XsdGlobals {
    fn tracker(&self) -> &ValidityTracker {
        &self.tracker
    }

    fn check_token(&self) -> Result<CheckToken> {
        Ok(self.context.current())
    }

    fn describe(&self) -> String {
        format!("schema globals ({} components)", self.total_globals())
    }

    fn components(&self) -> Vec<Arc<dyn XsdComponent>> {
        let types = self.types.values().map(GlobalType::as_component);
        let elements = self.elements.values().map(|e| Arc::clone(e) as Arc<dyn XsdComponent>);
        let attributes = self.attributes.values().map(|a| Arc::clone(a) as Arc<dyn XsdComponent>);
        let attribute_groups = self
            .attribute_groups
            .values()
            .map(|g| Arc::clone(g) as Arc<dyn XsdComponent>);
        let groups = self.groups.values().map(|g| Arc::clone(g) as Arc<dyn XsdComponent>);
        types
            .chain(elements)
            .chain(attributes)
            .chain(attribute_groups)
            .chain(groups)
            .collect()
    }
}
