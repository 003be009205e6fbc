//! Document conversion
//!
//! Entities become JSON sources. The `_id` attribute travels as the hit id
//! and the entity name as the `@entity` field. Temporals are written as
//! RFC 3339 strings and bytes as base64; both read back as strings.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::SecondsFormat;
use serde_json::{Map, Number, Value as Json};

use crate::backend::EntityConverter;
use crate::entity::{Attribute, Entity};
use crate::error::{QueryError, QueryResult};
use crate::value::Value;

use super::BACKEND;

/// Attribute mapped to the hit id
pub const ID_FIELD: &str = "_id";

/// Source field carrying the entity name
pub const ENTITY_FIELD: &str = "@entity";

/// One search hit or document to index
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Empty when the store should assign one
    pub id: String,
    pub source: Map<String, Json>,
}

pub(crate) fn to_json(value: &Value) -> QueryResult<Json> {
    Ok(match value {
        Value::String(s) => Json::String(s.clone()),
        Value::Integer(i) => Json::Number((*i).into()),
        Value::Float(f) => Number::from_f64(*f).map(Json::Number).ok_or_else(|| {
            QueryError::conversion(format!("{} has no JSON representation", f))
        })?,
        Value::Boolean(b) => Json::Bool(*b),
        Value::Temporal(t) => Json::String(t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        Value::Bytes(b) => Json::String(STANDARD.encode(b)),
        Value::Sequence(items) => {
            Json::Array(items.iter().map(to_json).collect::<QueryResult<_>>()?)
        }
        Value::Entity(entity) => Json::Object(fields_of(entity.iter())?),
    })
}

fn fields_of<'a>(attributes: impl Iterator<Item = &'a Attribute>) -> QueryResult<Map<String, Json>> {
    attributes
        .map(|a| {
            to_json(a.value())
                .map(|v| (a.name().to_string(), v))
                .map_err(|e| e.for_attribute(a.name()))
        })
        .collect()
}

/// `None` for JSON null
fn from_json(field: &str, json: Json) -> QueryResult<Option<Value>> {
    Ok(Some(match json {
        Json::Null => return Ok(None),
        Json::Bool(b) => Value::Boolean(b),
        Json::String(s) => Value::String(s),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => Value::Float(n.as_f64().ok_or_else(|| {
                QueryError::conversion(format!("number {} out of range", n))
            })?),
        },
        Json::Array(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                if let Some(value) = from_json(field, item)? {
                    values.push(value);
                }
            }
            Value::Sequence(values)
        }
        Json::Object(object) => Value::Entity(entity_of(field, object)?),
    }))
}

fn entity_of(name: &str, object: Map<String, Json>) -> QueryResult<Entity> {
    let mut entity = Entity::new(name)?;
    for (field, json) in object {
        if let Some(value) = from_json(&field, json).map_err(|e| e.for_attribute(&field))? {
            entity.set(field, value)?;
        }
    }
    Ok(entity)
}

/// Maps entities to search documents
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentConverter;

impl EntityConverter for DocumentConverter {
    type Record = SearchHit;

    fn to_native(&self, entity: &Entity) -> QueryResult<SearchHit> {
        let id = match entity.get(ID_FIELD) {
            None => String::new(),
            Some(Value::String(s)) => s.clone(),
            // Ids come back as text, so only text ids round-trip
            Some(other) => {
                return Err(QueryError::unsupported_type(BACKEND, ID_FIELD, other.kind()))
            }
        };

        let mut source = fields_of(entity.iter().filter(|a| a.name() != ID_FIELD))?;
        source.insert(
            ENTITY_FIELD.to_string(),
            Json::String(entity.name().to_string()),
        );
        Ok(SearchHit { id, source })
    }

    fn to_entity(&self, collection: &str, record: SearchHit) -> QueryResult<Entity> {
        let SearchHit { id, mut source } = record;

        let name = match source.remove(ENTITY_FIELD) {
            Some(Json::String(name)) if !name.is_empty() => name,
            _ => collection.to_string(),
        };

        let mut entity = Entity::new(name)?;
        if !id.is_empty() {
            entity.set(ID_FIELD, id)?;
        }
        for (field, json) in source {
            if let Some(value) = from_json(&field, json).map_err(|e| e.for_attribute(&field))? {
                entity.set(field, value)?;
            }
        }
        Ok(entity)
    }
}
