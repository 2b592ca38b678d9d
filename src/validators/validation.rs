//! Decode/encode protocol
//!
//! Every component decodes serialized data into native values (and encodes
//! native values back) as a lazy stream of [`Chunk`]s: zero or more validation
//! errors followed by at most one value. The drivers on [`XsdValidator`] pull
//! from those streams and stop as soon as their answer is known.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, ValidationError};

use super::base::ValidationMode;
use super::checks::XsdComponent;

/// One item of a decode or encode stream
#[derive(Debug, Clone, PartialEq)]
pub enum Chunk<T> {
    /// The decoded or encoded value
    Value(T),
    /// A validation error
    Error(ValidationError),
}

impl<T> Chunk<T> {
    /// Whether this chunk is an error
    pub fn is_error(&self) -> bool {
        matches!(self, Chunk::Error(_))
    }

    /// The value, if this chunk carries one
    pub fn into_value(self) -> Option<T> {
        match self {
            Chunk::Value(value) => Some(value),
            Chunk::Error(_) => None,
        }
    }

    /// The error, if this chunk carries one
    pub fn into_error(self) -> Option<ValidationError> {
        match self {
            Chunk::Value(_) => None,
            Chunk::Error(error) => Some(error),
        }
    }

    /// Map the value, passing errors through
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Chunk<U> {
        match self {
            Chunk::Value(value) => Chunk::Value(f(value)),
            Chunk::Error(error) => Chunk::Error(error),
        }
    }
}

/// Lazy, pull-driven stream of chunks
pub type ChunkStream<'a, T> = Box<dyn Iterator<Item = Chunk<T>> + 'a>;

/// Lazy stream of validation errors
pub type ErrorStream<'a> = Box<dyn Iterator<Item = ValidationError> + 'a>;

/// Namespace prefix to URI mappings, forwarded untouched
pub type NamespaceMap = IndexMap<String, String>;

/// Options forwarded to `iter_decode`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Validation mode
    pub mode: ValidationMode,
    /// Path of the data being decoded
    pub path: Option<String>,
    /// Substitute schema defaults for missing data
    pub use_defaults: bool,
    /// Whether to resolve namespaces
    pub process_namespaces: bool,
    /// Namespace mappings
    pub namespaces: NamespaceMap,
    /// Key prefix for decoded attributes
    pub attribute_prefix: String,
    /// Key for decoded character data
    pub text_key: String,
    /// Always decode child elements into arrays
    pub force_list: bool,
    /// Trim surrounding whitespace of string values
    pub strip_whitespace: bool,
}

impl DecodeOptions {
    /// Create decode options with strict mode
    pub fn new() -> Self {
        Self {
            mode: ValidationMode::Strict,
            path: None,
            use_defaults: true,
            process_namespaces: true,
            namespaces: NamespaceMap::new(),
            attribute_prefix: "@".to_string(),
            text_key: "$".to_string(),
            force_list: false,
            strip_whitespace: false,
        }
    }

    /// Load decode options from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set validation mode
    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set whether defaults fill missing data
    pub fn with_use_defaults(mut self, use_defaults: bool) -> Self {
        self.use_defaults = use_defaults;
        self
    }

    /// Set namespace mappings
    pub fn with_namespaces(mut self, namespaces: NamespaceMap) -> Self {
        self.namespaces = namespaces;
        self
    }

    /// Always decode child elements into arrays
    pub fn with_force_list(mut self) -> Self {
        self.force_list = true;
        self
    }

    /// Options for a child at `segment` below the current path
    pub fn child(&self, segment: &str) -> Self {
        let mut options = self.clone();
        options.path = Some(child_path(self.path.as_deref(), segment));
        options
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Options forwarded to `iter_encode`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    /// Validation mode
    pub mode: ValidationMode,
    /// Path of the data being encoded
    pub path: Option<String>,
    /// Namespace mappings
    pub namespaces: NamespaceMap,
    /// Key prefix marking attributes in native values
    pub attribute_prefix: String,
    /// Key marking character data in native values
    pub text_key: String,
    /// Indentation hint for serializers
    pub indent: Option<usize>,
}

impl EncodeOptions {
    /// Create encode options with strict mode
    pub fn new() -> Self {
        Self {
            mode: ValidationMode::Strict,
            path: None,
            namespaces: NamespaceMap::new(),
            attribute_prefix: "@".to_string(),
            text_key: "$".to_string(),
            indent: None,
        }
    }

    /// Load encode options from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set validation mode
    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set namespace mappings
    pub fn with_namespaces(mut self, namespaces: NamespaceMap) -> Self {
        self.namespaces = namespaces;
        self
    }

    /// Set indent level
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = Some(indent);
        self
    }

    /// Options for a child at `segment` below the current path
    pub fn child(&self, segment: &str) -> Self {
        let mut options = self.clone();
        options.path = Some(child_path(self.path.as_deref(), segment));
        options
    }
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Join a path and a child segment
pub fn child_path(path: Option<&str>, segment: &str) -> String {
    match path {
        Some(path) => format!("{}/{}", path.trim_end_matches('/'), segment),
        None => format!("/{}", segment),
    }
}

/// Trait for components that decode and encode data
///
/// Concrete kinds supply [`iter_decode`](Self::iter_decode) and
/// [`iter_encode`](Self::iter_encode); everything else is derived from them.
/// The `Err` side of the primitives is reserved for unsupported operations.
pub trait XsdValidator: XsdComponent {
    /// Serialized (foreign) form of the data
    type Serialized;
    /// Native form of the data
    type Native;

    /// Decode serialized data as a lazy stream
    fn iter_decode<'a>(
        &'a self,
        data: &'a Self::Serialized,
        options: DecodeOptions,
    ) -> Result<ChunkStream<'a, Self::Native>> {
        let _ = (data, options);
        Err(Error::NotImplemented(format!(
            "{} does not implement iter_decode",
            self.describe()
        )))
    }

    /// Encode native data as a lazy stream
    fn iter_encode<'a>(
        &'a self,
        data: &'a Self::Native,
        options: EncodeOptions,
    ) -> Result<ChunkStream<'a, Self::Serialized>> {
        let _ = (data, options);
        Err(Error::NotImplemented(format!(
            "{} does not implement iter_encode",
            self.describe()
        )))
    }

    /// Validate data, failing with the first validation error
    fn validate(&self, data: &Self::Serialized) -> Result<()> {
        self.validate_with(data, None, true)
    }

    /// Validate data below `path`, optionally filling defaults
    fn validate_with(
        &self,
        data: &Self::Serialized,
        path: Option<&str>,
        use_defaults: bool,
    ) -> Result<()> {
        match self.iter_errors_with(data, path, use_defaults)?.next() {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }

    /// Lazily enumerate the validation errors of data
    fn iter_errors<'a>(&'a self, data: &'a Self::Serialized) -> Result<ErrorStream<'a>> {
        self.iter_errors_with(data, None, true)
    }

    /// Lazily enumerate validation errors, decoding in lax mode
    fn iter_errors_with<'a>(
        &'a self,
        data: &'a Self::Serialized,
        path: Option<&str>,
        use_defaults: bool,
    ) -> Result<ErrorStream<'a>> {
        let mut options = DecodeOptions::new()
            .with_mode(ValidationMode::Lax)
            .with_use_defaults(use_defaults);
        options.path = path.map(str::to_string);
        let stream = self.iter_decode(data, options)?;
        Ok(Box::new(stream.filter_map(Chunk::into_error)))
    }

    /// Whether data produces no validation errors
    fn is_valid(&self, data: &Self::Serialized) -> Result<bool> {
        Ok(self.iter_errors(data)?.next().is_none())
    }

    /// Decode data in strict mode
    fn decode(&self, data: &Self::Serialized) -> Result<Self::Native> {
        self.decode_with(data, DecodeOptions::new())
    }

    /// Decode data with explicit options
    ///
    /// In strict mode the first error is returned. Otherwise errors are
    /// discarded and the first value is returned; use
    /// [`iter_errors`](Self::iter_errors) when they matter.
    fn decode_with(&self, data: &Self::Serialized, options: DecodeOptions) -> Result<Self::Native> {
        let strict = options.mode.is_strict();
        for chunk in self.iter_decode(data, options)? {
            match chunk {
                Chunk::Error(error) if strict => {
                    tracing::trace!(validator = %self.describe(), "strict decoding stopped at first error");
                    return Err(error.into());
                }
                Chunk::Error(_) => continue,
                Chunk::Value(value) => return Ok(value),
            }
        }
        Err(Error::Decode(format!("{} produced no value", self.describe())))
    }

    /// Alias of [`decode`](Self::decode)
    fn to_native(&self, data: &Self::Serialized) -> Result<Self::Native> {
        self.decode(data)
    }

    /// Validate native data for encoding, failing with the first error
    fn validate_encoding(&self, data: &Self::Native) -> Result<()> {
        match self.iter_encode_errors(data)?.next() {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }

    /// Lazily enumerate the errors of encoding data in lax mode
    fn iter_encode_errors<'a>(&'a self, data: &'a Self::Native) -> Result<ErrorStream<'a>> {
        let options = EncodeOptions::new().with_mode(ValidationMode::Lax);
        let stream = self.iter_encode(data, options)?;
        Ok(Box::new(stream.filter_map(Chunk::into_error)))
    }

    /// Whether native data encodes without validation errors
    fn is_valid_encoding(&self, data: &Self::Native) -> Result<bool> {
        Ok(self.iter_encode_errors(data)?.next().is_none())
    }

    /// Encode data in strict mode
    fn encode(&self, data: &Self::Native) -> Result<Self::Serialized> {
        self.encode_with(data, EncodeOptions::new())
    }

    /// Encode data with explicit options, mirroring [`decode_with`](Self::decode_with)
    fn encode_with(&self, data: &Self::Native, options: EncodeOptions) -> Result<Self::Serialized> {
        let strict = options.mode.is_strict();
        for chunk in self.iter_encode(data, options)? {
            match chunk {
                Chunk::Error(error) if strict => {
                    tracing::trace!(validator = %self.describe(), "strict encoding stopped at first error");
                    return Err(error.into());
                }
                Chunk::Error(_) => continue,
                Chunk::Value(value) => return Ok(value),
            }
        }
        Err(Error::Encode(format!("{} produced no value", self.describe())))
    }

    /// Alias of [`encode`](Self::encode)
    fn to_serialized(&self, data: &Self::Native) -> Result<Self::Serialized> {
        self.encode(data)
    }
}

/// Unit of work for [`Gather`]
pub(crate) enum Step<'a, K, V> {
    /// Emit an error
    Error(ValidationError),
    /// Forward the errors of a sub-stream and keep its value under `K`
    Child(K, ChunkStream<'a, V>),
    /// Keep a value directly
    Value(K, V),
}

type Finish<'a, K, V, T> = Box<dyn FnOnce(Vec<(K, V)>) -> T + 'a>;

/// Stream combinator used by composite components
///
/// Steps are pulled one at a time; errors are forwarded as they appear,
/// values of sub-streams are kept, and once the steps run out the kept values
/// are combined into the single final value.
pub(crate) struct Gather<'a, K, V, T> {
    steps: Box<dyn Iterator<Item = Step<'a, K, V>> + 'a>,
    current: Option<(K, ChunkStream<'a, V>)>,
    values: Vec<(K, V)>,
    finish: Option<Finish<'a, K, V, T>>,
    skip_errors: bool,
}

impl<'a, K: 'a, V: 'a, T: 'a> Gather<'a, K, V, T> {
    pub(crate) fn new(
        steps: impl Iterator<Item = Step<'a, K, V>> + 'a,
        finish: impl FnOnce(Vec<(K, V)>) -> T + 'a,
    ) -> Self {
        Self {
            steps: Box::new(steps),
            current: None,
            values: Vec::new(),
            finish: Some(Box::new(finish)),
            skip_errors: false,
        }
    }

    /// Drop structural errors (skip mode)
    pub(crate) fn skip_errors(mut self, skip: bool) -> Self {
        self.skip_errors = skip;
        self
    }

    pub(crate) fn into_stream(self) -> ChunkStream<'a, T> {
        Box::new(self)
    }
}

impl<'a, K, V, T> Iterator for Gather<'a, K, V, T> {
    type Item = Chunk<T>;

    fn next(&mut self) -> Option<Chunk<T>> {
        loop {
            if let Some((_, stream)) = self.current.as_mut() {
                match stream.next() {
                    Some(Chunk::Error(error)) => {
                        if !self.skip_errors {
                            return Some(Chunk::Error(error));
                        }
                    }
                    Some(Chunk::Value(value)) => {
                        if let Some((key, _)) = self.current.take() {
                            self.values.push((key, value));
                        }
                    }
                    None => self.current = None,
                }
                continue;
            }

            match self.steps.next() {
                Some(Step::Error(error)) => {
                    if !self.skip_errors {
                        return Some(Chunk::Error(error));
                    }
                }
                Some(Step::Child(key, stream)) => self.current = Some((key, stream)),
                Some(Step::Value(key, value)) => self.values.push((key, value)),
                None => {
                    let finish = self.finish.take()?;
                    return Some(Chunk::Value(finish(std::mem::take(&mut self.values))));
                }
            }
        }
    }
}
