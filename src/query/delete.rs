//! Delete descriptor consumed by write adapters

use crate::condition::Condition;
use crate::error::{QueryError, QueryResult};

/// Removes matching entries, or only the listed attributes of them
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteQuery {
    collection: String,
    condition: Option<Condition>,
    attributes: Vec<String>,
}

impl DeleteQuery {
    pub fn new(
        collection: impl Into<String>,
        condition: Option<Condition>,
        attributes: Vec<String>,
    ) -> QueryResult<Self> {
        let collection = collection.into();
        if collection.is_empty() {
            return Err(QueryError::invalid_argument(
                "delete collection name must not be empty",
            ));
        }
        if attributes.iter().any(String::is_empty) {
            return Err(QueryError::invalid_argument(
                "delete attribute names must not be empty",
            ));
        }
        Ok(Self {
            collection,
            condition,
            attributes,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    /// Attributes to remove; empty removes whole entries
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn removes_entries(&self) -> bool {
        self.attributes.is_empty()
    }
}
