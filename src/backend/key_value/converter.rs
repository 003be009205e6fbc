//! Map entry conversion
//!
//! Every attribute becomes a field; the key attribute is also rendered as
//! the entry key. Nested entities cannot be stored.

use chrono::SecondsFormat;

use crate::backend::EntityConverter;
use crate::entity::Entity;
use crate::error::{QueryError, QueryResult};
use crate::value::{Value, ValueKind};

use super::record::{MapRecord, MapValue};
use super::BACKEND;

/// Default key attribute
pub const DEFAULT_KEY_ATTRIBUTE: &str = "id";

pub(crate) fn to_map_value(attribute: &str, value: &Value) -> QueryResult<MapValue> {
    Ok(match value {
        Value::String(s) => MapValue::Text(s.clone()),
        Value::Integer(i) => MapValue::Long(*i),
        Value::Float(f) => MapValue::Double(*f),
        Value::Boolean(b) => MapValue::Bool(*b),
        Value::Temporal(t) => MapValue::Instant(*t),
        Value::Bytes(b) => MapValue::Bytes(b.clone()),
        Value::Sequence(items) => MapValue::List(
            items
                .iter()
                .map(|item| to_map_value(attribute, item))
                .collect::<QueryResult<_>>()?,
        ),
        Value::Entity(_) => {
            return Err(QueryError::unsupported_type(
                BACKEND,
                attribute,
                ValueKind::Entity,
            ))
        }
    })
}

/// String form of a key value
pub(crate) fn render_key(attribute: &str, value: &Value) -> QueryResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Boolean(b) => Ok(b.to_string()),
        Value::Temporal(t) => Ok(t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        other => Err(QueryError::conversion(format!(
            "{} cannot be used as an entry key",
            other.kind()
        ))
        .for_attribute(attribute)),
    }
}

/// Maps entities to map entries
#[derive(Debug, Clone)]
pub struct KeyValueConverter {
    key_attribute: String,
}

impl KeyValueConverter {
    pub fn new(key_attribute: impl Into<String>) -> Self {
        Self {
            key_attribute: key_attribute.into(),
        }
    }

    pub fn key_attribute(&self) -> &str {
        &self.key_attribute
    }
}

impl Default for KeyValueConverter {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_ATTRIBUTE)
    }
}

impl EntityConverter for KeyValueConverter {
    type Record = MapRecord;

    fn to_native(&self, entity: &Entity) -> QueryResult<MapRecord> {
        let key = entity.get(&self.key_attribute).ok_or_else(|| {
            QueryError::conversion(format!("{} has no key attribute", entity.name()))
                .for_attribute(&self.key_attribute)
        })?;

        let mut record = MapRecord::new(render_key(&self.key_attribute, key)?);
        for attribute in entity.iter() {
            let value = to_map_value(attribute.name(), attribute.value())?;
            record.fields.push((attribute.name().to_string(), value));
        }
        Ok(record)
    }

    fn to_entity(&self, collection: &str, record: MapRecord) -> QueryResult<Entity> {
        let mut entity = Entity::new(collection)?;
        for (name, value) in record.fields {
            entity.set(name, value.to_value())?;
        }
        Ok(entity)
    }
}
