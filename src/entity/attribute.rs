//! Named value

use crate::error::{QueryError, QueryResult};
use crate::value::{FromValue, Value};

/// A (name, value) pair
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    name: String,
    value: Value,
}

impl Attribute {
    /// Creates an attribute. The name must not be empty.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> QueryResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(QueryError::invalid_argument("attribute name must not be empty"));
        }
        Ok(Self {
            name,
            value: value.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Coerces the value into `T`, naming this attribute on failure
    pub fn get<T: FromValue>(&self) -> QueryResult<T> {
        self.value.to().map_err(|e| e.for_attribute(&self.name))
    }

    pub fn into_parts(self) -> (String, Value) {
        (self.name, self.value)
    }
}
