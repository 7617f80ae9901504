// In-memory values accepted by the store.
//
// `StoredValue` is a closed set of shapes: mappings, sequences, rich
// objects, sets, and scalars. Everything the encoder and the fault locator
// do is an exhaustive `match` over these variants.
use std::fmt::{self, Write as _};

use serde_json::Value;

#[derive(Clone, Debug, PartialEq)]
pub enum StoredValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    List(Vec<StoredValue>),
    Tuple(Vec<StoredValue>),
    Set(Vec<StoredValue>),
    Map(Mapping),
    Object(Object),
}

/// Insertion-ordered key/value pairs. Keys may be any value, including ones
/// that have no JSON key form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mapping {
    entries: Vec<(StoredValue, StoredValue)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces; a replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<StoredValue>, value: impl Into<StoredValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<StoredValue>, value: impl Into<StoredValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &StoredValue) -> Option<&StoredValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StoredValue, &StoredValue)> {
        self.entries.iter().map(|(key, value)| (key, value))
    }
}

impl<K, V> FromIterator<(K, V)> for Mapping
where
    K: Into<StoredValue>,
    V: Into<StoredValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = Mapping::new();
        for (key, value) in iter {
            mapping.insert(key, value);
        }
        mapping
    }
}

/// Something that can describe itself for storage and diagnostics.
pub trait AsDict {
    fn type_name(&self) -> &str;

    /// Human-readable identifier shown in fault paths, e.g. an entity id.
    fn identifier(&self) -> Option<String> {
        None
    }

    fn as_dict(&self) -> Mapping;
}

/// A value that is not a plain container. With a representation it can be
/// inspected field by field; without one it is opaque.
#[derive(Clone, Debug, PartialEq)]
pub struct Object {
    type_name: String,
    identifier: Option<String>,
    repr: Option<String>,
    representation: Option<Mapping>,
}

impl Object {
    pub fn opaque(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            identifier: None,
            repr: None,
            representation: None,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_repr(mut self, repr: impl Into<String>) -> Self {
        self.repr = Some(repr.into());
        self
    }

    pub fn with_representation(mut self, representation: Mapping) -> Self {
        self.representation = Some(representation);
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn representation(&self) -> Option<&Mapping> {
        self.representation.as_ref()
    }

    /// Fault-path marker: `(Type)` or `(Type: id)`.
    pub(crate) fn path_marker(&self) -> String {
        match &self.identifier {
            Some(id) => format!("({}: {id})", self.type_name),
            None => format!("({})", self.type_name),
        }
    }
}

impl StoredValue {
    pub fn object<T: AsDict + ?Sized>(source: &T) -> Self {
        let mut object = Object::opaque(source.type_name()).with_representation(source.as_dict());
        if let Some(id) = source.identifier() {
            object = object.with_identifier(id);
        }
        StoredValue::Object(object)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StoredValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StoredValue::Float(value) => Some(*value),
            StoredValue::Int(value) => Some(*value as f64),
            StoredValue::UInt(value) => Some(*value as f64),
            _ => None,
        }
    }

    /// Deterministic diagnostic rendering used in fault paths and messages.
    pub fn repr(&self) -> String {
        let mut out = String::new();
        write_repr(&mut out, self);
        out
    }
}

impl fmt::Display for StoredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

pub(crate) fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    format!("{value:?}")
}

fn write_repr(out: &mut String, value: &StoredValue) {
    match value {
        StoredValue::Null => out.push_str("null"),
        StoredValue::Bool(value) => out.push_str(if *value { "true" } else { "false" }),
        StoredValue::Int(value) => {
            let _ = write!(out, "{value}");
        }
        StoredValue::UInt(value) => {
            let _ = write!(out, "{value}");
        }
        StoredValue::Float(value) => out.push_str(&format_float(*value)),
        StoredValue::Str(value) => write_quoted(out, value),
        StoredValue::List(items) => {
            out.push('[');
            write_items(out, items);
            out.push(']');
        }
        StoredValue::Tuple(items) => {
            out.push('(');
            write_items(out, items);
            if items.len() == 1 {
                out.push(',');
            }
            out.push(')');
        }
        StoredValue::Set(items) if items.is_empty() => out.push_str("set()"),
        StoredValue::Set(items) => {
            out.push('{');
            write_items(out, items);
            out.push('}');
        }
        StoredValue::Map(mapping) => {
            out.push('{');
            for (idx, (key, value)) in mapping.iter().enumerate() {
                if idx > 0 {
                    out.push_str(", ");
                }
                write_repr(out, key);
                out.push_str(": ");
                write_repr(out, value);
            }
            out.push('}');
        }
        StoredValue::Object(object) => match (&object.repr, &object.identifier) {
            (Some(repr), _) => out.push_str(repr),
            (None, Some(id)) => {
                let _ = write!(out, "<{}: {id}>", object.type_name);
            }
            (None, None) => {
                let _ = write!(out, "<{}>", object.type_name);
            }
        },
    }
}

fn write_items(out: &mut String, items: &[StoredValue]) {
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            out.push_str(", ");
        }
        write_repr(out, item);
    }
}

fn write_quoted(out: &mut String, value: &str) {
    out.push('\'');
    for ch in value.chars() {
        match ch {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if ch.is_control() => {
                let _ = write!(out, "\\u{{{:x}}}", ch as u32);
            }
            ch => out.push(ch),
        }
    }
    out.push('\'');
}

macro_rules! from_signed {
    ($($ty:ty),*) => {
        $(impl From<$ty> for StoredValue {
            fn from(value: $ty) -> Self {
                StoredValue::Int(value as i64)
            }
        })*
    };
}

macro_rules! from_unsigned {
    ($($ty:ty),*) => {
        $(impl From<$ty> for StoredValue {
            fn from(value: $ty) -> Self {
                StoredValue::UInt(value as u64)
            }
        })*
    };
}

from_signed!(i8, i16, i32, i64);
from_unsigned!(u8, u16, u32, u64, usize);

impl From<bool> for StoredValue {
    fn from(value: bool) -> Self {
        StoredValue::Bool(value)
    }
}

impl From<f32> for StoredValue {
    fn from(value: f32) -> Self {
        StoredValue::Float(value as f64)
    }
}

impl From<f64> for StoredValue {
    fn from(value: f64) -> Self {
        StoredValue::Float(value)
    }
}

impl From<&str> for StoredValue {
    fn from(value: &str) -> Self {
        StoredValue::Str(value.to_string())
    }
}

impl From<String> for StoredValue {
    fn from(value: String) -> Self {
        StoredValue::Str(value)
    }
}

impl<T: Into<StoredValue>> From<Vec<T>> for StoredValue {
    fn from(items: Vec<T>) -> Self {
        StoredValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<StoredValue>> From<Option<T>> for StoredValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(StoredValue::Null, Into::into)
    }
}

impl From<Mapping> for StoredValue {
    fn from(mapping: Mapping) -> Self {
        StoredValue::Map(mapping)
    }
}

impl From<Object> for StoredValue {
    fn from(object: Object) -> Self {
        StoredValue::Object(object)
    }
}

impl From<Value> for StoredValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => StoredValue::Null,
            Value::Bool(value) => StoredValue::Bool(value),
            Value::Number(number) => {
                if let Some(value) = number.as_i64() {
                    StoredValue::Int(value)
                } else if let Some(value) = number.as_u64() {
                    StoredValue::UInt(value)
                } else {
                    StoredValue::Float(number.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(value) => StoredValue::Str(value),
            Value::Array(items) => StoredValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => StoredValue::Map(
                map.into_iter()
                    .map(|(key, value)| (StoredValue::Str(key), StoredValue::from(value)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AsDict, Mapping, Object, StoredValue};
    use serde_json::json;

    struct Light {
        entity_id: String,
    }

    impl AsDict for Light {
        fn type_name(&self) -> &str {
            "State"
        }

        fn identifier(&self) -> Option<String> {
            Some(self.entity_id.clone())
        }

        fn as_dict(&self) -> Mapping {
            Mapping::new().with("entity_id", self.entity_id.as_str())
        }
    }

    #[test]
    fn mapping_replaces_in_place() {
        let mut mapping = Mapping::new().with("a", 1).with("b", 2);
        mapping.insert("a", 3);
        let keys: Vec<_> = mapping.iter().map(|(key, _)| key.repr()).collect();
        assert_eq!(keys, vec!["'a'", "'b'"]);
        assert_eq!(mapping.get(&"a".into()), Some(&StoredValue::Int(3)));
    }

    #[test]
    fn repr_renders_each_shape() {
        assert_eq!(StoredValue::Tuple(vec!["A".into()]).repr(), "('A',)");
        assert_eq!(StoredValue::Tuple(vec![1.into(), 2.into()]).repr(), "(1, 2)");
        assert_eq!(StoredValue::Set(Vec::new()).repr(), "set()");
        assert_eq!(StoredValue::Set(vec![1.into()]).repr(), "{1}");
        assert_eq!(StoredValue::Float(f64::NAN).repr(), "NaN");
        assert_eq!(StoredValue::Float(1.0).repr(), "1.0");
        assert_eq!(StoredValue::Float(f64::NEG_INFINITY).repr(), "-inf");
        assert_eq!(StoredValue::from("it's").repr(), r"'it\'s'");
        assert_eq!(
            StoredValue::Map(Mapping::new().with(1, vec![true, false])).repr(),
            "{1: [true, false]}"
        );
        assert_eq!(StoredValue::Null.to_string(), "null");
    }

    #[test]
    fn object_repr_prefers_explicit_text() {
        assert_eq!(StoredValue::from(Object::opaque("Widget")).repr(), "<Widget>");
        assert_eq!(
            StoredValue::from(Object::opaque("Widget").with_identifier("w1")).repr(),
            "<Widget: w1>"
        );
        assert_eq!(
            StoredValue::from(Object::opaque("Widget").with_repr("Widget#7")).repr(),
            "Widget#7"
        );
    }

    #[test]
    fn as_dict_objects_carry_marker_and_representation() {
        let light = Light {
            entity_id: "kitchen.light".to_string(),
        };
        let StoredValue::Object(object) = StoredValue::object(&light) else {
            panic!("expected object");
        };
        assert_eq!(object.path_marker(), "(State: kitchen.light)");
        assert_eq!(object.representation().map(Mapping::len), Some(1));
        assert_eq!(Object::opaque("BadData").path_marker(), "(BadData)");
    }

    #[test]
    fn json_values_convert_losslessly() {
        let value = StoredValue::from(json!({"a": [1, -2, 2.5, "x", null, u64::MAX]}));
        let expected = StoredValue::Map(Mapping::new().with(
            "a",
            StoredValue::List(vec![
                StoredValue::Int(1),
                StoredValue::Int(-2),
                StoredValue::Float(2.5),
                "x".into(),
                StoredValue::Null,
                StoredValue::UInt(u64::MAX),
            ]),
        ));
        assert_eq!(value, expected);
    }
}
