//! Lossless coercion from `Value` to Rust scalar types
//!
//! A coercion either preserves the exact value or fails with a
//! conversion error. Nothing is silently truncated.

use chrono::{DateTime, TimeZone, Utc};

use super::value::{Value, MAX_EXACT_F64_INT};
use crate::entity::Entity;
use crate::error::{QueryError, QueryResult};

/// Types a `Value` can be coerced into
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> QueryResult<Self>;
}

impl Value {
    /// Coerces this value into `T`
    pub fn to<T: FromValue>(&self) -> QueryResult<T> {
        T::from_value(self)
    }
}

fn mismatch(value: &Value, target: &str) -> QueryError {
    QueryError::conversion(format!("cannot convert {} to {}", value.kind(), target))
}

impl FromValue for String {
    fn from_value(value: &Value) -> QueryResult<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Integer(i) => Ok(i.to_string()),
            Value::Float(f) => Ok(f.to_string()),
            Value::Boolean(b) => Ok(b.to_string()),
            Value::Temporal(t) => Ok(t.to_rfc3339()),
            _ => Err(mismatch(value, "string")),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> QueryResult<Self> {
        match value {
            Value::Integer(i) => Ok(*i),
            Value::Float(f) => {
                // i64::MAX as f64 rounds up to 2^63, which is out of range
                if f.is_finite() && f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64
                {
                    Ok(*f as i64)
                } else {
                    Err(QueryError::conversion(format!(
                        "float {} does not fit an integer without loss",
                        f
                    )))
                }
            }
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| QueryError::conversion(format!("'{}' is not an integer", s))),
            _ => Err(mismatch(value, "integer")),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> QueryResult<Self> {
        let wide = i64::from_value(value)?;
        i32::try_from(wide)
            .map_err(|_| QueryError::conversion(format!("{} is out of range for i32", wide)))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> QueryResult<Self> {
        match value {
            Value::Float(f) => Ok(*f),
            Value::Integer(i) => {
                if i.unsigned_abs() <= MAX_EXACT_F64_INT as u64 {
                    Ok(*i as f64)
                } else {
                    Err(QueryError::conversion(format!(
                        "integer {} is not exactly representable as a float",
                        i
                    )))
                }
            }
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| QueryError::conversion(format!("'{}' is not a number", s))),
            _ => Err(mismatch(value, "float")),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> QueryResult<Self> {
        match value {
            Value::Boolean(b) => Ok(*b),
            Value::String(s) if s == "true" => Ok(true),
            Value::String(s) if s == "false" => Ok(false),
            _ => Err(mismatch(value, "boolean")),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> QueryResult<Self> {
        match value {
            Value::Temporal(t) => Ok(*t),
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| QueryError::conversion(format!("'{}' is not RFC 3339: {}", s, e))),
            Value::Integer(millis) => Utc
                .timestamp_millis_opt(*millis)
                .single()
                .ok_or_else(|| QueryError::conversion(format!("{} ms is out of range", millis))),
            _ => Err(mismatch(value, "temporal")),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> QueryResult<Self> {
        match value {
            Value::Bytes(b) => Ok(b.clone()),
            Value::String(s) => Ok(s.as_bytes().to_vec()),
            _ => Err(mismatch(value, "bytes")),
        }
    }
}

impl FromValue for Vec<Value> {
    fn from_value(value: &Value) -> QueryResult<Self> {
        match value {
            Value::Sequence(items) => Ok(items.clone()),
            _ => Err(mismatch(value, "sequence")),
        }
    }
}

impl FromValue for Entity {
    fn from_value(value: &Value) -> QueryResult<Self> {
        match value {
            Value::Entity(entity) => Ok(entity.clone()),
            _ => Err(mismatch(value, "entity")),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> QueryResult<Self> {
        Ok(value.clone())
    }
}
