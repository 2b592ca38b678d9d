//! XSD Simple Type validators
//!
//! Atomic simple types: a built-in base plus an ordered list of constraining
//! facets. Decoding applies the lexical mapping first, then each facet in
//! declaration order, so errors come out in a stable order.
//!
//! See: https://www.w3.org/TR/xmlschema-2/

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use crate::error::{Error, ParseError, Result, ValidationError};

use super::builtins::{as_double, BuiltinType};
use super::checks::{CheckContext, CheckToken, ValidityTracker, XsdComponent};
use super::validation::{Chunk, ChunkStream, DecodeOptions, EncodeOptions, XsdValidator};

// =============================================================================
// Facets
// =============================================================================

/// Constraining facet of an atomic type
#[derive(Debug, Clone)]
pub enum Facet {
    /// Exact length in characters
    Length(usize),
    /// Minimum length in characters
    MinLength(usize),
    /// Maximum length in characters
    MaxLength(usize),
    /// Inclusive lower bound
    MinInclusive(f64),
    /// Inclusive upper bound
    MaxInclusive(f64),
    /// Exclusive lower bound
    MinExclusive(f64),
    /// Exclusive upper bound
    MaxExclusive(f64),
    /// Allowed lexical values
    Enumeration(Vec<String>),
    /// Anchored regular expression over the lexical value
    Pattern(Regex),
}

impl Facet {
    /// Build a pattern facet, anchoring the expression like XSD does
    pub fn pattern(pattern: &str) -> Result<Self> {
        Regex::new(&format!("^(?:{})$", pattern))
            .map(Facet::Pattern)
            .map_err(|e| Error::Value(format!("Invalid pattern '{}': {}", pattern, e)))
    }

    /// Build an enumeration facet
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Facet::Enumeration(values.into_iter().map(Into::into).collect())
    }

    /// XSD name of the facet
    pub fn name(&self) -> &'static str {
        match self {
            Facet::Length(_) => "length",
            Facet::MinLength(_) => "minLength",
            Facet::MaxLength(_) => "maxLength",
            Facet::MinInclusive(_) => "minInclusive",
            Facet::MaxInclusive(_) => "maxInclusive",
            Facet::MinExclusive(_) => "minExclusive",
            Facet::MaxExclusive(_) => "maxExclusive",
            Facet::Enumeration(_) => "enumeration",
            Facet::Pattern(_) => "pattern",
        }
    }

    fn is_length(&self) -> bool {
        matches!(self, Facet::Length(_) | Facet::MinLength(_) | Facet::MaxLength(_))
    }

    fn is_bound(&self) -> bool {
        matches!(
            self,
            Facet::MinInclusive(_)
                | Facet::MaxInclusive(_)
                | Facet::MinExclusive(_)
                | Facet::MaxExclusive(_)
        )
    }

    /// Reason the normalized text or its value violates the facet
    pub fn check(&self, text: &str, value: &Value) -> Option<String> {
        let length = text.chars().count();
        let number = as_double(value);
        match self {
            Facet::Length(n) if length != *n => {
                Some(format!("length has to be {} (found {})", n, length))
            }
            Facet::MinLength(n) if length < *n => {
                Some(format!("length cannot be lesser than {} (found {})", n, length))
            }
            Facet::MaxLength(n) if length > *n => {
                Some(format!("length cannot be greater than {} (found {})", n, length))
            }
            Facet::MinInclusive(min) if number.is_some_and(|v| v < *min) => {
                Some(format!("value has to be greater or equal than {}", min))
            }
            Facet::MaxInclusive(max) if number.is_some_and(|v| v > *max) => {
                Some(format!("value has to be lesser or equal than {}", max))
            }
            Facet::MinExclusive(min) if number.is_some_and(|v| v <= *min) => {
                Some(format!("value has to be greater than {}", min))
            }
            Facet::MaxExclusive(max) if number.is_some_and(|v| v >= *max) => {
                Some(format!("value has to be lesser than {}", max))
            }
            Facet::Enumeration(values) if !values.iter().any(|v| v == text) => {
                Some(format!("value must be one of {:?}", values))
            }
            Facet::Pattern(regex) if !regex.is_match(text) => {
                Some(format!("value doesn't match any pattern of [{:?}]", regex.as_str()))
            }
            _ => None,
        }
    }
}

// =============================================================================
// Atomic Type
// =============================================================================

/// Atomic simple type: a built-in base restricted by facets
#[derive(Debug)]
pub struct XsdAtomicType {
    /// Type name (None for anonymous types)
    name: Option<String>,
    /// Built-in base type
    base: BuiltinType,
    /// Facets in declaration order
    facets: Vec<Facet>,
    tracker: ValidityTracker,
    context: Arc<CheckContext>,
}

impl XsdAtomicType {
    /// Create an anonymous type with no facets
    pub fn new(base: BuiltinType, context: &Arc<CheckContext>) -> Self {
        Self {
            name: None,
            base,
            facets: Vec::new(),
            tracker: ValidityTracker::new(),
            context: Arc::clone(context),
        }
    }

    /// Create a built-in type, named after its base
    pub fn builtin(base: BuiltinType, context: &Arc<CheckContext>) -> Arc<Self> {
        let mut atomic = Self::new(base, context);
        atomic.name = Some(base.to_string());
        Arc::new(atomic)
    }

    /// Set the type name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Append a facet
    pub fn with_facet(mut self, facet: Facet) -> Self {
        self.facets.push(facet);
        self
    }

    /// Get the type name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Get the built-in base type
    pub fn base(&self) -> BuiltinType {
        self.base
    }

    /// Get the facets
    pub fn facets(&self) -> &[Facet] {
        &self.facets
    }

    /// Decode text into a native value
    pub(crate) fn decode_stream<'a>(
        &'a self,
        text: &'a str,
        options: &DecodeOptions,
    ) -> ChunkStream<'a, Value> {
        let mut normalized = self.base.normalize(text).into_owned();
        if options.strip_whitespace {
            normalized = normalized.trim().to_string();
        }
        let path = options.path.clone();

        let (value, lexical_error) = match self.base.decode(&normalized) {
            Ok(value) => (value, None),
            Err(reason) => {
                let error = ValidationError::decode(self.describe(), text, reason)
                    .with_optional_path(path.as_deref());
                (Value::String(text.to_string()), Some(error))
            }
        };

        if options.mode.is_skip() {
            return Box::new(std::iter::once(Chunk::Value(value)));
        }

        // The value is moved into the final chunk, so facets see a copy.
        let checked = value.clone();
        let facet_errors = self.facets.iter().filter_map(move |facet| {
            facet.check(&normalized, &checked).map(|reason| {
                ValidationError::new(format!("invalid value '{}' for {}", text, self.describe()))
                    .with_reason(format!("{} facet: {}", facet.name(), reason))
                    .with_instance(text)
                    .with_optional_path(path.as_deref())
            })
        });

        let errors = lexical_error.into_iter().chain(facet_errors).map(Chunk::Error);
        Box::new(errors.chain(std::iter::once(Chunk::Value(value))))
    }

    /// Encode a native value into text
    pub(crate) fn encode_stream<'a>(
        &'a self,
        value: &'a Value,
        options: &EncodeOptions,
    ) -> ChunkStream<'a, String> {
        let path = options.path.clone();
        let (text, lexical_error) = match self.base.encode(value) {
            Ok(text) => (text, None),
            Err(reason) => {
                let error = ValidationError::encode(self.describe(), value.to_string(), reason)
                    .with_optional_path(path.as_deref());
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (text, Some(error))
            }
        };

        if options.mode.is_skip() {
            return Box::new(std::iter::once(Chunk::Value(text)));
        }

        let normalized = self.base.normalize(&text).into_owned();
        let facet_errors = self.facets.iter().filter_map(move |facet| {
            facet.check(&normalized, value).map(|reason| {
                ValidationError::encode(self.describe(), value.to_string(), format!("{} facet: {}", facet.name(), reason))
                    .with_optional_path(path.as_deref())
            })
        });

        let errors = lexical_error.into_iter().chain(facet_errors).map(Chunk::Error);
        Box::new(errors.chain(std::iter::once(Chunk::Value(text))))
    }
}

impl fmt::Display for XsdAtomicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(ref name) => write!(f, "simpleType '{}'", name),
            None => write!(f, "anonymous simpleType (restriction of {})", self.base),
        }
    }
}

impl XsdComponent for XsdAtomicType {
    fn tracker(&self) -> &ValidityTracker {
        &self.tracker
    }

    fn check_token(&self) -> Result<CheckToken> {
        Ok(self.context.current())
    }

    fn describe(&self) -> String {
        self.to_string()
    }

    fn check_content(&self) -> Vec<ParseError> {
        let mut errors = Vec::new();
        for facet in &self.facets {
            if facet.is_bound() && !self.base.is_numeric() {
                errors.push(ParseError::new(format!(
                    "{} facet is not applicable to {}",
                    facet.name(),
                    self.base
                )));
            }
            if facet.is_length() && !self.base.is_string() {
                errors.push(ParseError::new(format!(
                    "{} facet is not applicable to {}",
                    facet.name(),
                    self.base
                )));
            }
            if let Facet::Enumeration(values) = facet {
                for value in values {
                    if let Err(reason) = self.base.decode(&self.base.normalize(value)) {
                        errors.push(ParseError::new(format!(
                            "enumeration value '{}' is invalid: {}",
                            value, reason
                        )));
                    }
                }
            }
        }

        let lower = self.facets.iter().find_map(|f| match f {
            Facet::MinInclusive(v) | Facet::MinExclusive(v) => Some(*v),
            _ => None,
        });
        let upper = self.facets.iter().find_map(|f| match f {
            Facet::MaxInclusive(v) | Facet::MaxExclusive(v) => Some(*v),
            _ => None,
        });
        if let (Some(lower), Some(upper)) = (lower, upper) {
            if lower > upper {
                errors.push(ParseError::new(format!(
                    "lower bound {} is greater than upper bound {}",
                    lower, upper
                )));
            }
        }

        let min_length = self.facets.iter().find_map(|f| match f {
            Facet::MinLength(n) => Some(*n),
            _ => None,
        });
        let max_length = self.facets.iter().find_map(|f| match f {
            Facet::MaxLength(n) => Some(*n),
            _ => None,
        });
        if let (Some(min), Some(max)) = (min_length, max_length) {
            if min > max {
                errors.push(ParseError::new(format!(
                    "minLength {} is greater than maxLength {}",
                    min, max
                )));
            }
        }

        errors
            .into_iter()
            .map(|e| e.with_component(self.describe()))
            .collect()
    }
}

impl XsdValidator for XsdAtomicType {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::base::{ValidationMode, ValidityStatus};
    use crate::validators::checks::check_report;
    use serde_json::json;

    fn percent(context: &Arc<CheckContext>) -> XsdAtomicType {
        XsdAtomicType::new(BuiltinType::Integer, context)
            .with_name("percent")
            .with_facet(Facet::MinInclusive(0.0))
            .with_facet(Facet::MaxInclusive(100.0))
    }

    #[test]
    fn test_decode_valid() {
        let context = CheckContext::shared();
        let atomic = percent(&context);
        assert_eq!(atomic.decode(&" 42 ".to_string()).unwrap(), json!(42));
        assert!(atomic.is_valid(&"0".to_string()).unwrap());
    }

    #[test]
    fn test_facet_errors() {
        let context = CheckContext::shared();
        let atomic = percent(&context);
        let data = "150".to_string();

        let errors: Vec<_> = atomic.iter_errors(&data).unwrap().collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].reason().unwrap().starts_with("maxInclusive"));

        let lax = DecodeOptions::new().with_mode(ValidationMode::Lax);
        assert_eq!(atomic.decode_with(&data, lax).unwrap(), json!(150));
    }

    #[test]
    fn test_lexical_error_best_effort() {
        let context = CheckContext::shared();
        let atomic = percent(&context);
        let data = "ten".to_string();

        assert!(atomic.decode(&data).unwrap_err().is_validation());
        let lax = DecodeOptions::new().with_mode(ValidationMode::Lax);
        assert_eq!(atomic.decode_with(&data, lax).unwrap(), json!("ten"));

        let skip = DecodeOptions::new().with_mode(ValidationMode::Skip);
        let chunks: Vec<_> = atomic.iter_decode(&data, skip).unwrap().collect();
        assert_eq!(chunks, vec![Chunk::Value(json!("ten"))]);
    }

    #[test]
    fn test_double_special_values() {
        let context = CheckContext::shared();
        let reading = XsdAtomicType::new(BuiltinType::Double, &context).with_facet(Facet::MaxInclusive(10.0));

        assert_eq!(reading.decode(&"-INF".to_string()).unwrap(), json!("-INF"));
        assert!(!reading.is_valid(&"INF".to_string()).unwrap());
        assert_eq!(reading.encode(&json!("-INF")).unwrap(), "-INF");
    }

    #[test]
    fn test_pattern_and_enumeration() {
        let context = CheckContext::shared();
        let code = XsdAtomicType::new(BuiltinType::Token, &context)
            .with_facet(Facet::pattern("[A-Z]{3}").unwrap())
            .with_facet(Facet::enumeration(["EUR", "USD"]));

        assert!(code.is_valid(&"EUR".to_string()).unwrap());
        assert_eq!(code.iter_errors(&"GBP".to_string()).unwrap().count(), 1);
        assert_eq!(code.iter_errors(&"eur".to_string()).unwrap().count(), 2);
        assert!(Facet::pattern("[").is_err());
    }

    #[test]
    fn test_encode() {
        let context = CheckContext::shared();
        let atomic = percent(&context);
        assert_eq!(atomic.encode(&json!(5)).unwrap(), "5");
        assert!(atomic.encode(&json!(500)).unwrap_err().is_validation());
        assert!(atomic.encode(&json!("5")).unwrap_err().is_validation());

        let skip = EncodeOptions::new().with_mode(ValidationMode::Skip);
        assert_eq!(atomic.encode_with(&json!("5"), skip).unwrap(), "5");
    }

    #[test]
    fn test_check_content() {
        let context = CheckContext::shared();
        let bad = XsdAtomicType::new(BuiltinType::Boolean, &context)
            .with_facet(Facet::MinInclusive(1.0))
            .with_facet(Facet::MaxLength(3));
        assert_eq!(bad.check_content().len(), 2);

        let inverted = XsdAtomicType::new(BuiltinType::Integer, &context)
            .with_facet(Facet::MinInclusive(10.0))
            .with_facet(Facet::MaxInclusive(1.0));
        let report = check_report(&inverted).unwrap();
        assert_eq!(report.validity, ValidityStatus::Invalid);
        assert!(inverted.checked().unwrap());

        assert!(check_report(&percent(&context)).unwrap().is_valid());
    }

    #[test]
    fn test_describe() {
        let context = CheckContext::shared();
        assert_eq!(percent(&context).describe(), "simpleType 'percent'");
        assert_eq!(
            XsdAtomicType::builtin(BuiltinType::String, &context).describe(),
            "simpleType 'xs:string'"
        );
    }
}
