//! Scalar property types and value conversion.

use serde_json::{Number, Value};
use std::fmt;

/// Primitive property types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Int32,
    Int64,
    Float,
    Bool,
    String,
}

impl ScalarType {
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::Int32 => "Int32",
            ScalarType::Int64 => "Int64",
            ScalarType::Float => "Float",
            ScalarType::Bool => "Bool",
            ScalarType::String => "String",
        }
    }

    /// Parses query text (filter values) into a value of this type.
    ///
    /// ```
    /// use folders_mapping::ScalarType;
    /// use serde_json::json;
    ///
    /// assert_eq!(ScalarType::Int32.parse_str(" 7 "), Some(json!(7)));
    /// assert_eq!(ScalarType::Int32.parse_str("x"), None);
    /// assert_eq!(ScalarType::Bool.parse_str("TRUE"), Some(json!(true)));
    /// ```
    pub fn parse_str(&self, text: &str) -> Option<Value> {
        let trimmed = text.trim();
        match self {
            ScalarType::Int32 => trimmed.parse::<i32>().ok().map(Value::from),
            ScalarType::Int64 => trimmed.parse::<i64>().ok().map(Value::from),
            ScalarType::Float => trimmed
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            ScalarType::Bool => {
                if trimmed.eq_ignore_ascii_case("true") {
                    Some(Value::Bool(true))
                } else if trimmed.eq_ignore_ascii_case("false") {
                    Some(Value::Bool(false))
                } else {
                    None
                }
            }
            ScalarType::String => Some(Value::String(text.to_string())),
        }
    }

    /// Coerces a JSON payload into this type. `null` passes through; numeric
    /// and boolean types also accept their textual form.
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        match (self, value) {
            (_, Value::Null) => Some(Value::Null),
            (ScalarType::Int32, Value::Number(n)) => n
                .as_i64()
                .and_then(|i| i32::try_from(i).ok())
                .map(Value::from),
            (ScalarType::Int64, Value::Number(n)) => n.as_i64().map(Value::from),
            (ScalarType::Float, Value::Number(n)) => n
                .as_f64()
                .and_then(Number::from_f64)
                .map(Value::Number),
            (ScalarType::Bool, Value::Bool(b)) => Some(Value::Bool(*b)),
            (ScalarType::String, Value::String(s)) => Some(Value::String(s.clone())),
            (ScalarType::String, _) => None,
            (_, Value::String(s)) => self.parse_str(s),
            _ => None,
        }
    }

    /// Classifies a scalar payload for conversion lookup.
    ///
    /// Integers are narrowed to 32 bits first; an integer that does not fit
    /// has no scalar type.
    ///
    /// ```
    /// use folders_mapping::ScalarType;
    /// use serde_json::json;
    ///
    /// assert_eq!(ScalarType::narrow(&json!(4)), Some((ScalarType::Int32, json!(4))));
    /// assert_eq!(ScalarType::narrow(&json!(5_000_000_000i64)), None);
    /// assert_eq!(ScalarType::narrow(&json!("a")), Some((ScalarType::String, json!("a"))));
    /// ```
    pub fn narrow(value: &Value) -> Option<(ScalarType, Value)> {
        match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => n
                .as_i64()
                .and_then(|i| i32::try_from(i).ok())
                .map(|i| (ScalarType::Int32, Value::from(i))),
            Value::Number(_) => Some((ScalarType::Float, value.clone())),
            Value::Bool(_) => Some((ScalarType::Bool, value.clone())),
            Value::String(_) => Some((ScalarType::String, value.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
