//! Query descriptor

use crate::condition::Condition;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Sort key and direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// Attribute to sort by
    pub attribute: String,
    /// Sort direction
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Immutable query over one collection.
///
/// Built through [`select`](super::select) or [`QueryBuilder`](super::QueryBuilder).
/// A `limit` of 0 means unbounded.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub(super) collection: String,
    pub(super) condition: Option<Condition>,
    pub(super) sorts: Vec<Sort>,
    pub(super) skip: u64,
    pub(super) limit: u64,
}

impl Query {
    /// Target collection
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Condition tree, `None` selects every entity
    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    /// Sorts in priority order
    pub fn sorts(&self) -> &[Sort] {
        &self.sorts
    }

    pub fn skip(&self) -> u64 {
        self.skip
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Returns true if the query caps the number of results
    pub fn is_bounded(&self) -> bool {
        self.limit > 0
    }
}
