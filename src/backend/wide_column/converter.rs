//! Wide-column row conversion
//!
//! Temporal values are stored as millisecond timestamps; anything finer is
//! truncated. Nested entities map to user-defined types and come back named
//! after the column that holds them.

use chrono::{TimeZone, Utc};

use crate::backend::EntityConverter;
use crate::entity::{Attribute, Entity};
use crate::error::{QueryError, QueryResult};
use crate::value::Value;

use super::statement::CqlValue;

/// One result row, columns in table order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, CqlValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_columns(columns: Vec<(String, CqlValue)>) -> Self {
        Self { columns }
    }

    pub fn push(&mut self, column: impl Into<String>, value: CqlValue) {
        self.columns.push((column.into(), value));
    }

    pub fn get(&self, column: &str) -> Option<&CqlValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> &[(String, CqlValue)] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<(String, CqlValue)> {
        self.columns
    }
}

/// Value → column value
pub(crate) fn to_cql(value: &Value) -> QueryResult<CqlValue> {
    Ok(match value {
        Value::String(s) => CqlValue::Text(s.clone()),
        Value::Integer(i) => CqlValue::BigInt(*i),
        Value::Float(f) => CqlValue::Double(*f),
        Value::Boolean(b) => CqlValue::Boolean(*b),
        Value::Temporal(t) => CqlValue::Timestamp(t.timestamp_millis()),
        Value::Bytes(b) => CqlValue::Blob(b.clone()),
        Value::Sequence(items) => {
            CqlValue::List(items.iter().map(to_cql).collect::<QueryResult<_>>()?)
        }
        Value::Entity(entity) => CqlValue::Udt(
            entity
                .iter()
                .map(|a| {
                    to_cql(a.value())
                        .map(|v| (a.name().to_string(), v))
                        .map_err(|e| e.for_attribute(a.name()))
                })
                .collect::<QueryResult<_>>()?,
        ),
    })
}

/// Column value → value; `column` names nested entities
fn from_cql(column: &str, value: CqlValue) -> QueryResult<Value> {
    Ok(match value {
        CqlValue::Text(s) => Value::String(s),
        CqlValue::BigInt(i) => Value::Integer(i),
        CqlValue::Double(f) => Value::Float(f),
        CqlValue::Boolean(b) => Value::Boolean(b),
        CqlValue::Timestamp(ms) => Value::Temporal(
            Utc.timestamp_millis_opt(ms)
                .single()
                .ok_or_else(|| QueryError::conversion(format!("timestamp {} out of range", ms)))?,
        ),
        CqlValue::Blob(b) => Value::Bytes(b),
        CqlValue::List(items) => Value::Sequence(
            items
                .into_iter()
                .map(|item| from_cql(column, item))
                .collect::<QueryResult<_>>()?,
        ),
        CqlValue::Udt(fields) => {
            let attributes = fields
                .into_iter()
                .map(|(name, v)| {
                    let value = from_cql(&name, v).map_err(|e| e.for_attribute(&name))?;
                    Attribute::new(name, value)
                })
                .collect::<QueryResult<Vec<_>>>()?;
            Value::Entity(Entity::of(column, attributes)?)
        }
    })
}

/// Maps entities to rows
#[derive(Debug, Clone, Copy, Default)]
pub struct WideColumnConverter;

impl EntityConverter for WideColumnConverter {
    type Record = Row;

    fn to_native(&self, entity: &Entity) -> QueryResult<Row> {
        let columns = entity
            .iter()
            .map(|a| {
                to_cql(a.value())
                    .map(|v| (a.name().to_string(), v))
                    .map_err(|e| e.for_attribute(a.name()))
            })
            .collect::<QueryResult<_>>()?;
        Ok(Row::from_columns(columns))
    }

    fn to_entity(&self, collection: &str, record: Row) -> QueryResult<Entity> {
        let mut entity = Entity::new(collection)?;
        for (name, value) in record.into_columns() {
            let value = from_cql(&name, value).map_err(|e| e.for_attribute(&name))?;
            entity.set(name, value)?;
        }
        Ok(entity)
    }
}
