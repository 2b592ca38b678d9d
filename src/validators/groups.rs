//! XSD Model Groups
//!
//! Sequence and choice groups of element particles. Decoding drives a
//! [`ModelVisitor`] over the child elements; encoding walks the particles in
//! declaration order over the entries of a native map.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#Model_Groups

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::documents::Element;
use crate::error::{Error, ParseError, Result, ValidationError};

use super::checks::{CheckContext, CheckToken, ValidityTracker, XsdComponent};
use super::elements::XsdElement;
use super::models::{ModelStep, ModelVisitor};
use super::particles::Occurs;
use super::validation::{ChunkStream, DecodeOptions, EncodeOptions, Gather, Step, XsdValidator};

/// Model group compositor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelType {
    /// Children in declaration order
    #[default]
    Sequence,
    /// Exactly one of the alternatives
    Choice,
}

impl ModelType {
    /// Get as string
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Sequence => "sequence",
            ModelType::Choice => "choice",
        }
    }
}

impl FromStr for ModelType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sequence" => Ok(ModelType::Sequence),
            "choice" => Ok(ModelType::Choice),
            _ => Err(Error::Value(format!("Unknown model group: '{}'", s))),
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An element declaration with occurrence bounds inside a group
#[derive(Debug, Clone)]
pub struct GroupParticle {
    /// The element declaration
    pub element: Arc<XsdElement>,
    /// Occurrence bounds
    pub occurs: Occurs,
}

impl GroupParticle {
    /// Create a new particle
    pub fn new(element: Arc<XsdElement>, occurs: Occurs) -> Self {
        Self { element, occurs }
    }

    /// Name of the element
    pub fn name(&self) -> &str {
        self.element.name()
    }

    /// Whether a child tag matches this particle
    pub fn matches(&self, tag: &str) -> bool {
        self.element.name() == tag
    }
}

/// XSD model group
#[derive(Debug)]
pub struct XsdGroup {
    name: Option<String>,
    model: ModelType,
    particles: Vec<GroupParticle>,
    tracker: ValidityTracker,
    context: Arc<CheckContext>,
}

impl XsdGroup {
    /// Create an anonymous model group
    pub fn new(model: ModelType, context: &Arc<CheckContext>) -> Self {
        Self {
            name: None,
            model,
            particles: Vec::new(),
            tracker: ValidityTracker::new(),
            context: Arc::clone(context),
        }
    }

    /// Set the group name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add an element particle
    pub fn with_particle(mut self, element: Arc<XsdElement>, occurs: Occurs) -> Self {
        self.add_particle(element, occurs);
        self
    }

    /// Add an element particle
    pub fn add_particle(&mut self, element: Arc<XsdElement>, occurs: Occurs) {
        self.particles.push(GroupParticle::new(element, occurs));
    }

    /// Get the group name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Get the compositor
    pub fn model(&self) -> ModelType {
        self.model
    }

    /// Get the particles
    pub fn particles(&self) -> &[GroupParticle] {
        &self.particles
    }

    /// Whether the group accepts empty content
    pub fn is_emptiable(&self) -> bool {
        match self.model {
            ModelType::Sequence => self.particles.iter().all(|p| p.occurs.is_emptiable()),
            ModelType::Choice => {
                self.particles.is_empty() || self.particles.iter().any(|p| p.occurs.is_emptiable())
            }
        }
    }

    fn expected(&self) -> String {
        let names: Vec<&str> = self.particles.iter().map(GroupParticle::name).collect();
        format!("Tag ({}) expected", names.join(" | "))
    }

    pub(crate) fn decode_stream<'a>(
        &'a self,
        data: &'a [Element],
        options: &DecodeOptions,
    ) -> ChunkStream<'a, Map<String, Value>> {
        let force_list = options.force_list;
        let step_options = options.clone();
        let steps = ModelVisitor::new(self, data).map(move |step| {
            let error = |message: String| {
                ValidationError::new(message)
                    .with_validator(self.describe())
                    .with_optional_path(step_options.path.as_deref())
            };
            match step {
                ModelStep::Match { particle, item } => {
                    let key = (item.tag.clone(), force_list || particle.occurs.is_multiple());
                    Step::Child(key, particle.element.decode_stream(item, &step_options))
                }
                ModelStep::Missing { particle } => {
                    Step::Error(error(format!("Missing required element '{}'", particle.name())))
                }
                ModelStep::Incomplete { .. } => Step::Error(error(self.expected())),
                ModelStep::Unexpected { item, position } => Step::Error(
                    error(format!("Unexpected child with tag '{}' at position {}", item.tag, position + 1))
                        .with_instance(item.tag.as_str()),
                ),
            }
        });

        Gather::new(steps, collect_children)
            .skip_errors(options.mode.is_skip())
            .into_stream()
    }

    /// Encode `(name, value)` entries into child elements
    pub(crate) fn encode_entries<'a>(
        &'a self,
        entries: Vec<(&'a str, &'a Value)>,
        options: &EncodeOptions,
    ) -> ChunkStream<'a, Vec<Element>> {
        let chosen = match self.model {
            ModelType::Sequence => None,
            ModelType::Choice => self
                .particles
                .iter()
                .position(|p| entries.iter().any(|(name, _)| p.matches(name))),
        };
        let selected: Vec<&'a GroupParticle> = match (self.model, chosen) {
            (ModelType::Sequence, _) => self.particles.iter().collect(),
            (ModelType::Choice, Some(index)) => vec![&self.particles[index]],
            (ModelType::Choice, None) => Vec::new(),
        };
        let unknown: Vec<(&'a str, &'a Value)> = entries
            .iter()
            .filter(|(name, _)| !selected.iter().any(|p| p.matches(name)))
            .copied()
            .collect();

        let mut steps: Vec<Step<'a, usize, Element>> = Vec::new();
        if self.model == ModelType::Choice && chosen.is_none() && !self.is_emptiable() {
            steps.push(Step::Error(
                ValidationError::encode(self.describe(), fmt_keys(&entries), self.expected())
                    .with_optional_path(options.path.as_deref()),
            ));
        }
        for particle in selected {
            let value = entries.iter().find(|(name, _)| particle.matches(name)).map(|(_, v)| *v);
            let items: Vec<&'a Value> = match value {
                None => Vec::new(),
                Some(Value::Array(items)) if particle.occurs.is_multiple() => items.iter().collect(),
                Some(value) => vec![value],
            };
            let count = u32::try_from(items.len()).unwrap_or(u32::MAX);
            if particle.occurs.is_missing(count) {
                steps.push(Step::Error(
                    ValidationError::new(format!("Missing required element '{}'", particle.name()))
                        .with_validator(self.describe())
                        .with_optional_path(options.path.as_deref()),
                ));
            } else if particle.occurs.is_exceeded(count) {
                steps.push(Step::Error(
                    ValidationError::new(format!("Too many '{}' elements", particle.name()))
                        .with_validator(self.describe())
                        .with_expected(format!("{:?}", particle.occurs.max))
                        .with_actual(count.to_string())
                        .with_optional_path(options.path.as_deref()),
                ));
            }
            for item in items {
                let index = steps.len();
                steps.push(Step::Child(index, particle.element.encode_stream(item, options)));
            }
        }
        for (name, value) in unknown {
            steps.push(Step::Error(
                ValidationError::encode(
                    self.describe(),
                    value.to_string(),
                    format!("Unexpected key '{}'", name),
                )
                .with_optional_path(options.path.as_deref()),
            ));
        }

        Gather::new(steps.into_iter(), |children: Vec<(usize, Element)>| {
            children.into_iter().map(|(_, child)| child).collect()
        })
        .skip_errors(options.mode.is_skip())
        .into_stream()
    }
}

/// Merge decoded children into a map, collecting repeated particles into arrays
fn collect_children(values: Vec<((String, bool), Value)>) -> Map<String, Value> {
    let mut content = Map::new();
    for ((tag, multiple), value) in values {
        if !multiple {
            content.insert(tag, value);
            continue;
        }
        match content.get_mut(&tag) {
            Some(Value::Array(items)) => items.push(value),
            _ => {
                content.insert(tag, Value::Array(vec![value]));
            }
        }
    }
    content
}

fn fmt_keys(entries: &[(&str, &Value)]) -> String {
    let keys: Vec<&str> = entries.iter().map(|(name, _)| *name).collect();
    format!("[{}]", keys.join(", "))
}

impl XsdComponent for XsdGroup {
    fn tracker(&self) -> &ValidityTracker {
        &self.tracker
    }

    fn check_token(&self) -> Result<CheckToken> {
        Ok(self.context.current())
    }

    fn describe(&self) -> String {
        match self.name {
            Some(ref name) => format!("group '{}'", name),
            None => format!("anonymous {}", self.model),
        }
    }

    fn components(&self) -> Vec<Arc<dyn XsdComponent>> {
        self.particles
            .iter()
            .map(|p| Arc::clone(&p.element) as Arc<dyn XsdComponent>)
            .collect()
    }

    fn check_content(&self) -> Vec<ParseError> {
        let mut errors: Vec<ParseError> = self
            .particles
            .iter()
            .filter_map(|p| p.occurs.check().map(|e| e.with_component(format!("element '{}'", p.name()))))
            .collect();

        // Adjacent particles of a sequence sharing a name need a fixed count on the first.
        if self.model == ModelType::Sequence {
            for (index, particle) in self.particles.iter().enumerate().skip(1) {
                let previous = &self.particles[index - 1];
                if previous.name() == particle.name() && previous.occurs.max != previous.occurs.min.into() {
                    errors.push(ParseError::new(format!(
                        "ambiguous content model: adjacent particles for '{}'",
                        particle.name()
                    )));
                }
            }
        }

        errors
            .into_iter()
            .map(|e| match e.component {
                Some(_) => e,
                None => e.with_component(self.describe()),
            })
            .collect()
    }
}

impl XsdValidator for XsdGroup {
    type Serialized = Vec<Element>;
    type Native = Map<String, Value>;

    fn iter_decode<'a>(
        &'a self,
        data: &'a Vec<Element>,
        options: DecodeOptions,
    ) -> Result<ChunkStream<'a, Map<String, Value>>> {
        Ok(self.decode_stream(data, &options))
    }

    fn iter_encode<'a>(
        &'a self,
        data: &'a Map<String, Value>,
        options: EncodeOptions,
    ) -> Result<ChunkStream<'a, Vec<Element>>> {
        let entries = data.iter().map(|(k, v)| (k.as_str(), v)).collect();
        Ok(self.encode_entries(entries, &options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::base::ValidationMode;
    use crate::validators::builtins::BuiltinType;
    use crate::validators::checks::check_report;
    use crate::validators::elements::ElementType;
    use crate::validators::simple_types::XsdAtomicType;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn simple_element(name: &str, base: BuiltinType, context: &Arc<CheckContext>) -> Arc<XsdElement> {
        let element = XsdElement::new(name, context);
        element
            .bind_type(ElementType::Simple(XsdAtomicType::builtin(base, context)))
            .unwrap();
        Arc::new(element)
    }

    fn library(context: &Arc<CheckContext>) -> XsdGroup {
        XsdGroup::new(ModelType::Sequence, context)
            .with_particle(simple_element("title", BuiltinType::String, context), Occurs::once())
            .with_particle(simple_element("year", BuiltinType::Integer, context), Occurs::optional())
            .with_particle(simple_element("tag", BuiltinType::Token, context), Occurs::zero_or_more())
    }

    fn text(tag: &str, text: &str) -> Element {
        Element::new(tag).with_text(text)
    }

    #[test]
    fn test_model_type_from_str() {
        assert_eq!("choice".parse::<ModelType>().unwrap(), ModelType::Choice);
        assert!("all".parse::<ModelType>().is_err());
    }

    #[test]
    fn test_decode_sequence() {
        let context = CheckContext::shared();
        let group = library(&context);
        let data = vec![text("title", "Dune"), text("year", "1965"), text("tag", "scifi"), text("tag", "classic")];

        let decoded = group.decode(&data).unwrap();
        assert_eq!(
            Value::Object(decoded),
            json!({"title": "Dune", "year": 1965, "tag": ["scifi", "classic"]})
        );

        let options = DecodeOptions::new().with_force_list();
        let decoded = group.decode_with(&data[..1].to_vec(), options).unwrap();
        assert_eq!(Value::Object(decoded), json!({"title": ["Dune"]}));
    }

    #[test]
    fn test_decode_errors() {
        let context = CheckContext::shared();
        let group = library(&context);
        let data = vec![text("year", "later"), text("isbn", "123")];

        let errors: Vec<_> = group.iter_errors(&data).unwrap().collect();
        let messages: Vec<&str> = errors.iter().map(|e| e.message()).collect();
        assert_eq!(
            messages,
            vec![
                "Missing required element 'title'",
                "failed decoding 'later'",
                "Unexpected child with tag 'isbn' at position 2",
            ]
        );
        assert_eq!(errors[1].path(), Some("/year"));

        let skip = DecodeOptions::new().with_mode(ValidationMode::Skip);
        let decoded = group.decode_with(&data, skip).unwrap();
        assert_eq!(Value::Object(decoded), json!({"year": "later"}));
    }

    #[test]
    fn test_choice_incomplete() {
        let context = CheckContext::shared();
        let group = XsdGroup::new(ModelType::Choice, &context)
            .with_particle(simple_element("isbn", BuiltinType::String, &context), Occurs::once())
            .with_particle(simple_element("issn", BuiltinType::String, &context), Occurs::once());

        let errors: Vec<_> = group.iter_errors(&vec![]).unwrap().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Tag (isbn | issn) expected");
        assert!(group.is_valid(&vec![text("issn", "1")]).unwrap());
    }

    #[test]
    fn test_encode() {
        let context = CheckContext::shared();
        let group = library(&context);

        let native = json!({"tag": ["a", "b"], "title": "Dune"});
        let encoded = group.encode(native.as_object().unwrap()).unwrap();
        assert_eq!(encoded, vec![text("title", "Dune"), text("tag", "a"), text("tag", "b")]);

        let native = json!({"year": 1965, "pages": 412});
        let errors: Vec<_> = group.iter_encode_errors(native.as_object().unwrap()).unwrap().collect();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message(), "Missing required element 'title'");
        assert_eq!(errors[1].reason(), Some("Unexpected key 'pages'"));
    }

    #[test]
    fn test_check_content() {
        let context = CheckContext::shared();
        let title = simple_element("title", BuiltinType::String, &context);
        let group = XsdGroup::new(ModelType::Sequence, &context)
            .with_particle(Arc::clone(&title), Occurs::new(2, Some(1)))
            .with_particle(title, Occurs::once());

        let report = check_report(&group).unwrap();
        assert!(!report.is_valid());
        assert_eq!(report.errors.len(), 2);
    }
}
