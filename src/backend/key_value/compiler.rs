//! Query → map query
//!
//! The map orders matches by the first sort key only; further keys are
//! applied by the engine to each fetched page.

use crate::backend::{FetchWindow, QueryCompiler};
use crate::condition::{Condition, Connective, Operator, Predicate};
use crate::engine::{BackendProfile, ExecutionStrategy, SortSupport, Windowing};
use crate::error::{QueryError, QueryResult};
use crate::query::{Cursor, Query, Sort};

use super::converter::to_map_value;
use super::predicate::{CompareOp, MapPredicate};
use super::BACKEND;

/// One page request against a named map
#[derive(Debug, Clone)]
pub struct MapQuery {
    pub map: String,
    pub predicate: MapPredicate,
    pub order_by: Option<Sort>,
    /// Entries per page, 0 for all
    pub page_size: u64,
    /// Position to resume from
    pub anchor: u64,
}

/// Encodes a resume position as a continuation token
pub fn position_token(position: u64) -> Vec<u8> {
    position.to_be_bytes().to_vec()
}

fn decode_position(token: &[u8]) -> QueryResult<u64> {
    let bytes: [u8; 8] = token
        .try_into()
        .map_err(|_| QueryError::invalid_argument("malformed map cursor token"))?;
    Ok(u64::from_be_bytes(bytes))
}

/// Compiles queries into map predicates
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyValueCompiler;

impl KeyValueCompiler {
    /// Predicate for a condition tree, `True` when absent
    pub fn predicate(&self, condition: Option<&Condition>) -> QueryResult<MapPredicate> {
        match condition {
            None => Ok(MapPredicate::True),
            Some(condition) => translate(condition),
        }
    }
}

impl QueryCompiler for KeyValueCompiler {
    type Request = MapQuery;

    fn profile(&self) -> BackendProfile {
        BackendProfile {
            backend: BACKEND,
            strategy: ExecutionStrategy::StatefulCursor,
            windowing: Windowing::ClientSide,
            sort: SortSupport::SingleKeyWithPageSort,
        }
    }

    fn compile(&self, query: &Query, cursor: &Cursor, window: &FetchWindow) -> QueryResult<MapQuery> {
        Ok(MapQuery {
            map: query.collection().to_string(),
            predicate: self.predicate(query.condition())?,
            order_by: query.sorts().first().cloned(),
            page_size: window.page_size,
            anchor: cursor.token().map(decode_position).transpose()?.unwrap_or(0),
        })
    }
}

fn translate(condition: &Condition) -> QueryResult<MapPredicate> {
    match condition {
        Condition::Leaf(predicate) => translate_predicate(predicate),
        Condition::Composite {
            connective,
            children,
        } => {
            let mut translated = children
                .iter()
                .map(translate)
                .collect::<QueryResult<Vec<_>>>()?;
            Ok(match connective {
                Connective::And => MapPredicate::And(translated),
                Connective::Or => MapPredicate::Or(translated),
                Connective::Not if translated.len() == 1 => {
                    MapPredicate::Not(Box::new(translated.remove(0)))
                }
                Connective::Not => MapPredicate::Not(Box::new(MapPredicate::And(translated))),
            })
        }
    }
}

fn translate_predicate(predicate: &Predicate) -> QueryResult<MapPredicate> {
    let field = predicate.attribute().to_string();
    let operand = predicate.operand();

    let compare = |op: CompareOp| -> QueryResult<MapPredicate> {
        Ok(MapPredicate::Compare {
            field: field.clone(),
            op,
            value: to_map_value(&field, operand)?,
        })
    };

    match predicate.operator() {
        Operator::Equal => compare(CompareOp::Equal),
        Operator::Greater => compare(CompareOp::Greater),
        Operator::GreaterEqual => compare(CompareOp::GreaterEqual),
        Operator::Lesser => compare(CompareOp::Lesser),
        Operator::LesserEqual => compare(CompareOp::LesserEqual),
        Operator::Between => {
            let (low, high) = predicate.bounds().ok_or_else(|| {
                QueryError::invalid_argument(format!("BETWEEN on {} needs two bounds", field))
            })?;
            Ok(MapPredicate::Between {
                low: to_map_value(&field, low)?,
                high: to_map_value(&field, high)?,
                field,
            })
        }
        Operator::In => {
            let items = predicate.items().ok_or_else(|| {
                QueryError::invalid_argument(format!("IN on {} needs a list", field))
            })?;
            Ok(MapPredicate::In {
                values: items
                    .iter()
                    .map(|item| to_map_value(&field, item))
                    .collect::<QueryResult<_>>()?,
                field,
            })
        }
        Operator::Like => {
            let pattern = operand.as_str().ok_or_else(|| {
                QueryError::invalid_argument(format!("LIKE on {} needs a string pattern", field))
            })?;
            MapPredicate::like(field, pattern)
        }
    }
}
