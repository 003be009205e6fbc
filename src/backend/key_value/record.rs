//! Map entries

use chrono::{DateTime, Utc};

use crate::value::Value;

/// Native map field value. There is no nested-entity form.
#[derive(Debug, Clone, PartialEq)]
pub enum MapValue {
    Text(String),
    Long(i64),
    Double(f64),
    Bool(bool),
    Instant(DateTime<Utc>),
    Bytes(Vec<u8>),
    List(Vec<MapValue>),
}

impl MapValue {
    /// Lossless lift into the shared value model
    pub fn to_value(&self) -> Value {
        match self {
            MapValue::Text(s) => Value::String(s.clone()),
            MapValue::Long(i) => Value::Integer(*i),
            MapValue::Double(f) => Value::Float(*f),
            MapValue::Bool(b) => Value::Boolean(*b),
            MapValue::Instant(t) => Value::Temporal(*t),
            MapValue::Bytes(b) => Value::Bytes(b.clone()),
            MapValue::List(items) => Value::Sequence(items.iter().map(MapValue::to_value).collect()),
        }
    }
}

/// One map entry: its key plus every field, the key field included
#[derive(Debug, Clone, PartialEq)]
pub struct MapRecord {
    pub key: String,
    pub fields: Vec<(String, MapValue)>,
}

impl MapRecord {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            fields: Vec::new(),
        }
    }

    /// Builder-style field append
    pub fn with(mut self, name: impl Into<String>, value: MapValue) -> Self {
        self.fields.push((name.into(), value));
        self
    }

    pub fn get(&self, field: &str) -> Option<&MapValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Drops the named fields; returns true if any was present
    pub fn remove_fields(&mut self, names: &[String]) -> bool {
        let before = self.fields.len();
        self.fields.retain(|(name, _)| !names.contains(name));
        self.fields.len() != before
    }
}
