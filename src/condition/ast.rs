//! Condition tree
//!
//! A recursive predicate over entity attributes: leaf comparisons combined
//! with AND, OR and NOT.

use std::fmt;

use crate::error::{QueryError, QueryResult};
use crate::value::Value;

/// Leaf operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// attribute = operand
    Equal,
    /// attribute > operand
    Greater,
    /// attribute >= operand
    GreaterEqual,
    /// attribute < operand
    Lesser,
    /// attribute <= operand
    LesserEqual,
    /// lower <= attribute <= upper, operand is [lower, upper]
    Between,
    /// attribute is one of the operand items
    In,
    /// attribute matches a `%`/`_` pattern
    Like,
}

impl Operator {
    /// Returns the operator name for logs and errors
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equal => "EQUAL",
            Operator::Greater => "GREATER",
            Operator::GreaterEqual => "GREATER_EQUAL",
            Operator::Lesser => "LESSER",
            Operator::LesserEqual => "LESSER_EQUAL",
            Operator::Between => "BETWEEN",
            Operator::In => "IN",
            Operator::Like => "LIKE",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Boolean connective of a composite condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
    Not,
}

impl Connective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
            Connective::Not => "NOT",
        }
    }
}

/// A single attribute comparison
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    attribute: String,
    operator: Operator,
    operand: Value,
}

impl Predicate {
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn operand(&self) -> &Value {
        &self.operand
    }

    /// Lower and upper bound of a BETWEEN predicate
    pub fn bounds(&self) -> Option<(&Value, &Value)> {
        match (self.operator, self.operand.as_sequence()) {
            (Operator::Between, Some([lower, upper])) => Some((lower, upper)),
            _ => None,
        }
    }

    /// Items of an IN predicate
    pub fn items(&self) -> Option<&[Value]> {
        match self.operator {
            Operator::In => self.operand.as_sequence(),
            _ => None,
        }
    }
}

/// Predicate tree
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Leaf(Predicate),
    Composite {
        connective: Connective,
        children: Vec<Condition>,
    },
}

impl Condition {
    /// Builds a leaf after validating the operand shape for the operator
    pub fn leaf(
        attribute: impl Into<String>,
        operator: Operator,
        operand: impl Into<Value>,
    ) -> QueryResult<Self> {
        let attribute = attribute.into();
        let operand = operand.into();

        if attribute.is_empty() {
            return Err(QueryError::invalid_argument(
                "condition attribute name must not be empty",
            ));
        }

        match operator {
            Operator::Between => match operand.as_sequence() {
                Some(items) if items.len() == 2 => {}
                _ => {
                    return Err(QueryError::invalid_argument(format!(
                        "BETWEEN on '{}' needs a sequence of exactly two bounds",
                        attribute
                    )))
                }
            },
            Operator::In => match operand.as_sequence() {
                Some(items) if !items.is_empty() => {}
                _ => {
                    return Err(QueryError::invalid_argument(format!(
                        "IN on '{}' needs a non-empty sequence",
                        attribute
                    )))
                }
            },
            _ => {}
        }

        Ok(Condition::Leaf(Predicate {
            attribute,
            operator,
            operand,
        }))
    }

    pub fn eq(attribute: impl Into<String>, operand: impl Into<Value>) -> QueryResult<Self> {
        Self::leaf(attribute, Operator::Equal, operand)
    }

    pub fn gt(attribute: impl Into<String>, operand: impl Into<Value>) -> QueryResult<Self> {
        Self::leaf(attribute, Operator::Greater, operand)
    }

    pub fn gte(attribute: impl Into<String>, operand: impl Into<Value>) -> QueryResult<Self> {
        Self::leaf(attribute, Operator::GreaterEqual, operand)
    }

    pub fn lt(attribute: impl Into<String>, operand: impl Into<Value>) -> QueryResult<Self> {
        Self::leaf(attribute, Operator::Lesser, operand)
    }

    pub fn lte(attribute: impl Into<String>, operand: impl Into<Value>) -> QueryResult<Self> {
        Self::leaf(attribute, Operator::LesserEqual, operand)
    }

    /// BETWEEN with an explicit `[lower, upper]` sequence operand
    pub fn between(attribute: impl Into<String>, operand: impl Into<Value>) -> QueryResult<Self> {
        Self::leaf(attribute, Operator::Between, operand)
    }

    /// BETWEEN from two bounds
    pub fn range(
        attribute: impl Into<String>,
        lower: impl Into<Value>,
        upper: impl Into<Value>,
    ) -> QueryResult<Self> {
        Self::between(attribute, Value::Sequence(vec![lower.into(), upper.into()]))
    }

    pub fn in_list(attribute: impl Into<String>, operand: impl Into<Value>) -> QueryResult<Self> {
        Self::leaf(attribute, Operator::In, operand)
    }

    pub fn like(attribute: impl Into<String>, pattern: impl Into<Value>) -> QueryResult<Self> {
        Self::leaf(attribute, Operator::Like, pattern)
    }

    /// Conjunction of one or more conditions
    pub fn and(children: impl IntoIterator<Item = Condition>) -> QueryResult<Self> {
        Self::composite(Connective::And, children.into_iter().collect())
    }

    /// Disjunction of one or more conditions
    pub fn or(children: impl IntoIterator<Item = Condition>) -> QueryResult<Self> {
        Self::composite(Connective::Or, children.into_iter().collect())
    }

    /// Negation of a condition
    pub fn negate(child: Condition) -> Self {
        Condition::Composite {
            connective: Connective::Not,
            children: vec![child],
        }
    }

    fn composite(connective: Connective, children: Vec<Condition>) -> QueryResult<Self> {
        if children.is_empty() {
            return Err(QueryError::invalid_argument(format!(
                "{} needs at least one condition",
                connective.as_str()
            )));
        }
        Ok(Condition::Composite {
            connective,
            children,
        })
    }

    /// Appends `other` to this condition under `connective`.
    ///
    /// A composite with the same connective absorbs the new child instead of
    /// nesting another level.
    pub(crate) fn combine(self, connective: Connective, other: Condition) -> Condition {
        match self {
            Condition::Composite {
                connective: existing,
                mut children,
            } if existing == connective => {
                children.push(other);
                Condition::Composite {
                    connective,
                    children,
                }
            }
            current => Condition::Composite {
                connective,
                children: vec![current, other],
            },
        }
    }

    /// Returns the predicate if this is a leaf
    pub fn as_leaf(&self) -> Option<&Predicate> {
        match self {
            Condition::Leaf(p) => Some(p),
            _ => None,
        }
    }

    /// Number of leaves in the tree
    pub fn leaf_count(&self) -> usize {
        match self {
            Condition::Leaf(_) => 1,
            Condition::Composite { children, .. } => children.iter().map(Self::leaf_count).sum(),
        }
    }
}
