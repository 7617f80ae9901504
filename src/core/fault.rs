// Locate the parts of a value that keep it from serializing.
//
// The walk is depth-first in container order. A subtree is only entered
// when `dump` rejects it as a whole, and only values that `dump` rejects on
// their own are reported; containers never are.
//
// Paths start at `$` and grow by `.field`, `[index]`, `<key: repr>` for
// keys `dump` rejects, and `(Type)` / `(Type: id)` when stepping into an
// object's representation.
use std::fmt;

use crate::core::encode::{EncodeError, Encoder, JsonEncoder, json_key};
use crate::core::value::{Mapping, StoredValue};

pub const ROOT_PATH: &str = "$";

/// Fault paths and the values found there, in discovery order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SerializationFault {
    entries: Vec<(String, StoredValue)>,
}

impl SerializationFault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(value: StoredValue) -> Self {
        let mut faults = Self::new();
        faults.record(ROOT_PATH.to_string(), value);
        faults
    }

    fn record(&mut self, path: String, value: StoredValue) {
        self.entries.push((path, value));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, path: &str) -> Option<&StoredValue> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == path)
            .map(|(_, value)| value)
    }

    pub fn first(&self) -> Option<(&str, &StoredValue)> {
        self.entries
            .first()
            .map(|(path, value)| (path.as_str(), value))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StoredValue)> {
        self.entries.iter().map(|(path, value)| (path.as_str(), value))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(path, _)| path.as_str())
    }
}

impl IntoIterator for SerializationFault {
    type Item = (String, StoredValue);
    type IntoIter = std::vec::IntoIter<(String, StoredValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl fmt::Display for SerializationFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, (path, value)) in self.entries.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{path}={}", value.repr())?;
        }
        Ok(())
    }
}

/// Fault paths under the default encoder.
pub fn find_paths_unserializable_data(value: &StoredValue) -> SerializationFault {
    let encoder = JsonEncoder::compact();
    find_paths_unserializable_data_with(value, |candidate| encoder.encode(candidate))
}

/// Fault paths under a caller-chosen `dump`. Never fails.
pub fn find_paths_unserializable_data_with<D, T>(value: &StoredValue, dump: D) -> SerializationFault
where
    D: Fn(&StoredValue) -> Result<T, EncodeError>,
{
    let mut locator = Locator {
        dump: &dump,
        faults: SerializationFault::new(),
    };
    locator.visit(value, ROOT_PATH.to_string());
    locator.faults
}

struct Locator<'a, T> {
    dump: &'a dyn Fn(&StoredValue) -> Result<T, EncodeError>,
    faults: SerializationFault,
}

impl<T> Locator<'_, T> {
    fn accepts(&self, value: &StoredValue) -> bool {
        (self.dump)(value).is_ok()
    }

    fn visit(&mut self, value: &StoredValue, path: String) {
        if self.accepts(value) {
            return;
        }
        match value {
            StoredValue::Map(mapping) => self.visit_entries(mapping, &path),
            StoredValue::List(items) | StoredValue::Tuple(items) => {
                for (idx, item) in items.iter().enumerate() {
                    self.visit(item, format!("{path}[{idx}]"));
                }
            }
            StoredValue::Object(object) => match object.representation() {
                Some(representation) => {
                    let path = format!("{path}{}", object.path_marker());
                    self.visit_entries(representation, &path);
                }
                None => self.faults.record(path, value.clone()),
            },
            StoredValue::Set(_)
            | StoredValue::Null
            | StoredValue::Bool(_)
            | StoredValue::Int(_)
            | StoredValue::UInt(_)
            | StoredValue::Float(_)
            | StoredValue::Str(_) => self.faults.record(path, value.clone()),
        }
    }

    fn visit_entries(&mut self, mapping: &Mapping, path: &str) {
        for (key, item) in mapping.iter() {
            let probe = StoredValue::Map(Mapping::new().with(key.clone(), StoredValue::Null));
            if self.accepts(&probe) {
                let field = json_key(key).unwrap_or_else(|_| key.repr());
                self.visit(item, format!("{path}.{field}"));
            } else {
                self.faults
                    .record(format!("{path}<key: {}>", key.repr()), key.clone());
            }
        }
    }
}
