//! Native map predicates
//!
//! Evaluated entry by entry inside the map. Comparisons follow the shared
//! value ordering: integers and floats compare numerically, mismatched kinds
//! never match.

use std::cmp::Ordering;

use regex::Regex;

use crate::error::{QueryError, QueryResult};

use super::record::{MapRecord, MapValue};

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equal,
    Greater,
    GreaterEqual,
    Lesser,
    LesserEqual,
}

impl CompareOp {
    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Equal => ordering == Ordering::Equal,
            CompareOp::Greater => ordering == Ordering::Greater,
            CompareOp::GreaterEqual => ordering != Ordering::Less,
            CompareOp::Lesser => ordering == Ordering::Less,
            CompareOp::LesserEqual => ordering != Ordering::Greater,
        }
    }
}

/// Predicate tree over map entries
#[derive(Debug, Clone)]
pub enum MapPredicate {
    /// Matches every entry
    True,
    Compare {
        field: String,
        op: CompareOp,
        value: MapValue,
    },
    Between {
        field: String,
        low: MapValue,
        high: MapValue,
    },
    In {
        field: String,
        values: Vec<MapValue>,
    },
    /// Anchored regular expression over text fields
    Like { field: String, regex: Regex },
    And(Vec<MapPredicate>),
    Or(Vec<MapPredicate>),
    Not(Box<MapPredicate>),
}

impl MapPredicate {
    /// Builds a `Like` from an SQL pattern (`%` any run, `_` one character)
    pub fn like(field: impl Into<String>, pattern: &str) -> QueryResult<Self> {
        let mut expression = String::from("(?s)^");
        let mut literal = String::new();
        for c in pattern.chars() {
            match c {
                '%' | '_' => {
                    expression.push_str(&regex::escape(&literal));
                    literal.clear();
                    expression.push_str(if c == '%' { ".*" } else { "." });
                }
                c => literal.push(c),
            }
        }
        expression.push_str(&regex::escape(&literal));
        expression.push('$');

        let regex = Regex::new(&expression)
            .map_err(|e| QueryError::invalid_argument(format!("bad LIKE pattern: {}", e)))?;
        Ok(MapPredicate::Like {
            field: field.into(),
            regex,
        })
    }

    pub fn test(&self, record: &MapRecord) -> bool {
        match self {
            MapPredicate::True => true,
            MapPredicate::Compare { field, op, value } => record
                .get(field)
                .and_then(|actual| compare(actual, value))
                .map_or(false, |ordering| op.accepts(ordering)),
            MapPredicate::Between { field, low, high } => match record.get(field) {
                Some(actual) => {
                    matches!(compare(actual, low), Some(Ordering::Greater | Ordering::Equal))
                        && matches!(compare(actual, high), Some(Ordering::Less | Ordering::Equal))
                }
                None => false,
            },
            MapPredicate::In { field, values } => match record.get(field) {
                Some(actual) => values
                    .iter()
                    .any(|v| compare(actual, v) == Some(Ordering::Equal)),
                None => false,
            },
            MapPredicate::Like { field, regex } => match record.get(field) {
                Some(MapValue::Text(text)) => regex.is_match(text),
                _ => false,
            },
            MapPredicate::And(children) => children.iter().all(|c| c.test(record)),
            MapPredicate::Or(children) => children.iter().any(|c| c.test(record)),
            MapPredicate::Not(child) => !child.test(record),
        }
    }
}

pub(crate) fn compare(a: &MapValue, b: &MapValue) -> Option<Ordering> {
    a.to_value().compare(&b.to_value())
}
