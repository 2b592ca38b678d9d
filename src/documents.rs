//! Serialized data tree
//!
//! A minimal owned element tree used as the serialized side of element and
//! complex type decoding. Parsing XML text into this tree is the job of the
//! document layer, not of this crate.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Attribute name to value mappings, in document order
pub type AttributeMap = IndexMap<String, String>;

/// XML Element in the document tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Element tag
    pub tag: String,
    /// Element attributes
    #[serde(default)]
    pub attributes: AttributeMap,
    /// Text content (if any)
    #[serde(default)]
    pub text: Option<String>,
    /// Child elements
    #[serde(default)]
    pub children: Vec<Element>,
}

impl Element {
    /// Create a new element
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Add an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Add a child element
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Get an attribute value by name
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Whether the element carries non-whitespace character data
    pub fn has_text(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    /// Find child elements by tag
    pub fn find_children<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |e| e.tag == tag)
    }
}
