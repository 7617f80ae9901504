// Pluggable JSON encoders: value conversion, key normalization, fallback hooks.
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::{Map, Number, Value};

use crate::core::value::{StoredValue, format_float};

/// Deepest nesting the encoder will produce; matches the parser's recursion
/// limit so anything saved can be loaded again.
pub const MAX_DEPTH: usize = 128;

#[derive(Clone, Debug, PartialEq)]
pub enum EncodeError {
    /// No JSON form and no fallback substitute.
    Unsupported { type_name: String },
    /// Mapping key with no JSON key form.
    UnsupportedKey { key: String },
    NonFiniteFloat(f64),
    DepthExceeded,
    Format(String),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::Unsupported { type_name } => {
                write!(f, "value of type {type_name} is not JSON serializable")
            }
            EncodeError::UnsupportedKey { key } => {
                write!(f, "keys must be str, int, float, bool or null, not {key}")
            }
            EncodeError::NonFiniteFloat(value) => write!(
                f,
                "out of range float value is not JSON compliant: {}",
                format_float(*value)
            ),
            EncodeError::DepthExceeded => {
                write!(f, "nesting exceeds the maximum depth of {MAX_DEPTH}")
            }
            EncodeError::Format(message) => write!(f, "failed to format JSON: {message}"),
        }
    }
}

impl std::error::Error for EncodeError {}

/// Serialization strategy used by `save_json` and as the fault locator's
/// `dump` function.
pub trait Encoder {
    fn encode(&self, value: &StoredValue) -> Result<String, EncodeError>;

    /// Substitute for a value the base encoder cannot represent.
    fn fallback(&self, _value: &StoredValue) -> Option<StoredValue> {
        None
    }
}

impl<E: Encoder + ?Sized> Encoder for &E {
    fn encode(&self, value: &StoredValue) -> Result<String, EncodeError> {
        (**self).encode(value)
    }

    fn fallback(&self, value: &StoredValue) -> Option<StoredValue> {
        (**self).fallback(value)
    }
}

type FallbackFn = dyn Fn(&StoredValue) -> Option<StoredValue> + Send + Sync;

#[derive(Clone)]
pub struct JsonEncoder {
    indent: Option<usize>,
    allow_nan: bool,
    fallback: Option<Arc<FallbackFn>>,
}

impl Default for JsonEncoder {
    fn default() -> Self {
        Self {
            indent: Some(2),
            allow_nan: false,
            fallback: None,
        }
    }
}

impl fmt::Debug for JsonEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonEncoder")
            .field("indent", &self.indent)
            .field("allow_nan", &self.allow_nan)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl JsonEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoder that writes sets as lists and objects as their representation.
    pub fn extended() -> Self {
        Self::default().with_fallback(extended_fallback)
    }

    pub fn compact() -> Self {
        Self::default().indent(None)
    }

    pub fn indent(mut self, indent: Option<usize>) -> Self {
        self.indent = indent;
        self
    }

    /// When set, non-finite floats are written as `null` instead of failing.
    pub fn allow_nan(mut self, allow_nan: bool) -> Self {
        self.allow_nan = allow_nan;
        self
    }

    pub fn with_fallback<F>(mut self, fallback: F) -> Self
    where
        F: Fn(&StoredValue) -> Option<StoredValue> + Send + Sync + 'static,
    {
        self.fallback = Some(Arc::new(fallback));
        self
    }

    pub fn to_value(&self, value: &StoredValue) -> Result<Value, EncodeError> {
        Converter {
            allow_nan: self.allow_nan,
            fallback: &|value: &StoredValue| self.fallback(value),
        }
        .convert(value, 0)
    }
}

impl Encoder for JsonEncoder {
    fn encode(&self, value: &StoredValue) -> Result<String, EncodeError> {
        let json = self.to_value(value)?;
        write_json(&json, self.indent)
    }

    fn fallback(&self, value: &StoredValue) -> Option<StoredValue> {
        self.fallback.as_ref().and_then(|fallback| fallback(value))
    }
}

pub fn extended_fallback(value: &StoredValue) -> Option<StoredValue> {
    match value {
        StoredValue::Set(items) => Some(StoredValue::List(items.clone())),
        StoredValue::Object(object) => object.representation().cloned().map(StoredValue::Map),
        _ => None,
    }
}

struct Converter<'a> {
    allow_nan: bool,
    fallback: &'a dyn Fn(&StoredValue) -> Option<StoredValue>,
}

impl Converter<'_> {
    fn convert(&self, value: &StoredValue, depth: usize) -> Result<Value, EncodeError> {
        if depth > MAX_DEPTH {
            return Err(EncodeError::DepthExceeded);
        }
        match value {
            StoredValue::Null => Ok(Value::Null),
            StoredValue::Bool(value) => Ok(Value::Bool(*value)),
            StoredValue::Int(value) => Ok(Value::Number((*value).into())),
            StoredValue::UInt(value) => Ok(Value::Number((*value).into())),
            StoredValue::Float(value) => match Number::from_f64(*value) {
                Some(number) => Ok(Value::Number(number)),
                None if self.allow_nan => Ok(Value::Null),
                None => Err(EncodeError::NonFiniteFloat(*value)),
            },
            StoredValue::Str(value) => Ok(Value::String(value.clone())),
            StoredValue::List(items) | StoredValue::Tuple(items) => items
                .iter()
                .map(|item| self.convert(item, depth + 1))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            StoredValue::Map(mapping) => {
                let mut map = Map::with_capacity(mapping.len());
                for (key, item) in mapping.iter() {
                    map.insert(json_key(key)?, self.convert(item, depth + 1)?);
                }
                Ok(Value::Object(map))
            }
            StoredValue::Set(_) | StoredValue::Object(_) => match (self.fallback)(value) {
                Some(substitute) => self.convert(&substitute, depth + 1),
                None => Err(EncodeError::Unsupported {
                    type_name: type_name(value).to_string(),
                }),
            },
        }
    }
}

/// JSON object key for a mapping key, if the key has one.
pub fn json_key(key: &StoredValue) -> Result<String, EncodeError> {
    match key {
        StoredValue::Str(value) => Ok(value.clone()),
        StoredValue::Int(value) => Ok(value.to_string()),
        StoredValue::UInt(value) => Ok(value.to_string()),
        StoredValue::Float(value) if value.is_finite() => Ok(format_float(*value)),
        StoredValue::Bool(value) => Ok(value.to_string()),
        StoredValue::Null => Ok("null".to_string()),
        other => Err(EncodeError::UnsupportedKey { key: other.repr() }),
    }
}

fn type_name(value: &StoredValue) -> &str {
    match value {
        StoredValue::Null => "null",
        StoredValue::Bool(_) => "bool",
        StoredValue::Int(_) | StoredValue::UInt(_) => "int",
        StoredValue::Float(_) => "float",
        StoredValue::Str(_) => "str",
        StoredValue::List(_) => "list",
        StoredValue::Tuple(_) => "tuple",
        StoredValue::Set(_) => "set",
        StoredValue::Map(_) => "map",
        StoredValue::Object(object) => object.type_name(),
    }
}

fn write_json(value: &Value, indent: Option<usize>) -> Result<String, EncodeError> {
    let Some(width) = indent else {
        return serde_json::to_string(value).map_err(|err| EncodeError::Format(err.to_string()));
    };
    let pad = vec![b' '; width];
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(&pad));
    value
        .serialize(&mut serializer)
        .map_err(|err| EncodeError::Format(err.to_string()))?;
    String::from_utf8(buf).map_err(|err| EncodeError::Format(err.to_string()))
}
