//! XSD built-in types
//!
//! Lexical mapping between serialized text and native values for the
//! primitive types the concrete simple types derive from.

use crate::error::{Error, Result};
use serde_json::{Number, Value};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// XSD Namespace Constants
// =============================================================================

/// XSD 1.0 Namespace
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// XSD string type name
pub const XSD_STRING: &str = "string";
/// XSD token type name
pub const XSD_TOKEN: &str = "token";
/// XSD boolean type name
pub const XSD_BOOLEAN: &str = "boolean";
/// XSD integer type name
pub const XSD_INTEGER: &str = "integer";
/// XSD double type name
pub const XSD_DOUBLE: &str = "double";

// =============================================================================
// Built-in Types
// =============================================================================

/// Primitive type backing an atomic simple type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    /// xs:string, whitespace preserved
    String,
    /// xs:token, whitespace collapsed
    Token,
    /// xs:boolean
    Boolean,
    /// xs:integer, limited to 64 bits
    Integer,
    /// xs:double
    Double,
}

impl BuiltinType {
    /// Local name of the type
    pub fn local_name(&self) -> &'static str {
        match self {
            BuiltinType::String => XSD_STRING,
            BuiltinType::Token => XSD_TOKEN,
            BuiltinType::Boolean => XSD_BOOLEAN,
            BuiltinType::Integer => XSD_INTEGER,
            BuiltinType::Double => XSD_DOUBLE,
        }
    }

    /// Whether values of this type are ordered numbers
    pub fn is_numeric(&self) -> bool {
        matches!(self, BuiltinType::Integer | BuiltinType::Double)
    }

    /// Whether values of this type are strings
    pub fn is_string(&self) -> bool {
        matches!(self, BuiltinType::String | BuiltinType::Token)
    }

    /// Apply the type's whitespace normalization
    pub fn normalize<'t>(&self, text: &'t str) -> std::borrow::Cow<'t, str> {
        match self {
            BuiltinType::String => text.into(),
            BuiltinType::Token => text.split_whitespace().collect::<Vec<_>>().join(" ").into(),
            _ => text.trim().into(),
        }
    }

    /// Decode normalized text, returning the reason on failure
    pub fn decode(&self, text: &str) -> std::result::Result<Value, String> {
        match self {
            BuiltinType::String | BuiltinType::Token => Ok(Value::String(text.to_string())),
            BuiltinType::Boolean => match text {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(format!("'{}' is not a boolean value", text)),
            },
            BuiltinType::Integer => text
                .parse::<i64>()
                .map(Value::from)
                .map_err(|e| format!("invalid integer: {}", e)),
            BuiltinType::Double => match special_double(text) {
                Some(special) => Ok(Value::String(special.to_string())),
                None => {
                    let number = text.parse::<f64>().map_err(|e| format!("invalid double: {}", e))?;
                    Number::from_f64(number)
                        .map(Value::Number)
                        .ok_or_else(|| format!("'{}' is not a valid xs:double value", text))
                }
            },
        }
    }

    /// Encode a native value as text, returning the reason on failure
    pub fn encode(&self, value: &Value) -> std::result::Result<String, String> {
        match (self, value) {
            (BuiltinType::String | BuiltinType::Token, Value::String(s)) => Ok(s.clone()),
            (BuiltinType::Boolean, Value::Bool(b)) => Ok(b.to_string()),
            (BuiltinType::Integer, Value::Number(n)) => n
                .as_i64()
                .map(|i| i.to_string())
                .ok_or_else(|| format!("{} is not an integer", n)),
            (BuiltinType::Double, Value::Number(n)) => Ok(n.to_string()),
            (BuiltinType::Double, Value::String(s)) => special_double(s)
                .map(str::to_string)
                .ok_or_else(|| format!("{} is not a valid xs:double value", value)),
            (_, other) => Err(format!("{} is not a valid xs:{} value", other, self.local_name())),
        }
    }
}

/// Canonical form of the xs:double values JSON numbers can't hold
fn special_double(text: &str) -> Option<&'static str> {
    match text {
        "INF" | "+INF" => Some("INF"),
        "-INF" => Some("-INF"),
        "NaN" => Some("NaN"),
        _ => None,
    }
}

/// Numeric value of a native value, reading the string forms of infinities
/// and NaN
pub fn as_double(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => match special_double(s)? {
            "INF" => Some(f64::INFINITY),
            "-INF" => Some(f64::NEG_INFINITY),
            _ => Some(f64::NAN),
        },
        _ => None,
    }
}

impl FromStr for BuiltinType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let local = s.strip_prefix("xs:").unwrap_or(s);
        match local {
            XSD_STRING => Ok(BuiltinType::String),
            XSD_TOKEN => Ok(BuiltinType::Token),
            XSD_BOOLEAN => Ok(BuiltinType::Boolean),
            XSD_INTEGER => Ok(BuiltinType::Integer),
            XSD_DOUBLE => Ok(BuiltinType::Double),
            _ => Err(Error::Value(format!("Unknown built-in type: {}", s))),
        }
    }
}

impl fmt::Display for BuiltinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "xs:{}", self.local_name())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_name() {
        assert_eq!("xs:integer".parse::<BuiltinType>().unwrap(), BuiltinType::Integer);
        assert_eq!("token".parse::<BuiltinType>().unwrap(), BuiltinType::Token);
        assert!("xs:duration".parse::<BuiltinType>().is_err());
        assert_eq!(BuiltinType::Double.to_string(), "xs:double");
    }

    #[test]
    fn test_normalize() {
        assert_eq!(BuiltinType::String.normalize("  a  b "), "  a  b ");
        assert_eq!(BuiltinType::Token.normalize("  a \n b "), "a b");
        assert_eq!(BuiltinType::Integer.normalize(" 42\n"), "42");
    }

    #[test]
    fn test_decode() {
        assert_eq!(BuiltinType::Integer.decode("42"), Ok(json!(42)));
        assert!(BuiltinType::Integer.decode("4.2").is_err());
        assert_eq!(BuiltinType::Boolean.decode("1"), Ok(json!(true)));
        assert!(BuiltinType::Boolean.decode("yes").is_err());
        assert_eq!(BuiltinType::Double.decode("2.5"), Ok(json!(2.5)));
        assert_eq!(BuiltinType::Double.decode("INF"), Ok(json!("INF")));
        assert_eq!(BuiltinType::Double.decode("+INF"), Ok(json!("INF")));
        assert_eq!(BuiltinType::Double.decode("NaN"), Ok(json!("NaN")));
        assert!(BuiltinType::Double.decode("inf").is_err());
        assert_eq!(BuiltinType::String.decode(" x "), Ok(json!(" x ")));
    }

    #[test]
    fn test_encode() {
        assert_eq!(BuiltinType::Integer.encode(&json!(7)), Ok("7".to_string()));
        assert!(BuiltinType::Integer.encode(&json!(7.5)).is_err());
        assert_eq!(BuiltinType::Boolean.encode(&json!(false)), Ok("false".to_string()));
        assert!(BuiltinType::String.encode(&json!(1)).is_err());
        assert_eq!(BuiltinType::Double.encode(&json!("-INF")), Ok("-INF".to_string()));
        assert!(BuiltinType::Double.encode(&json!("many")).is_err());
    }

    #[test]
    fn test_as_double() {
        assert_eq!(as_double(&json!(1.5)), Some(1.5));
        assert_eq!(as_double(&json!("INF")), Some(f64::INFINITY));
        assert!(as_double(&json!("NaN")).is_some_and(f64::is_nan));
        assert_eq!(as_double(&json!("1.5")), None);
        assert_eq!(as_double(&json!(true)), None);
    }
}
