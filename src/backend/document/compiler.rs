//! Query → search DSL
//!
//! The body is a plain JSON value. Every request is scoped to the
//! collection through a `term` filter on `@entity`, so several collections
//! can share one index.

use serde_json::{json, Map, Value as Json};

use crate::backend::{FetchWindow, QueryCompiler};
use crate::condition::{Condition, Connective, Operator, Predicate};
use crate::engine::{BackendProfile, ExecutionStrategy, SortSupport, Windowing};
use crate::error::{QueryError, QueryResult};
use crate::query::{Cursor, DeleteQuery, Query};
use crate::value::Value;

use super::converter::{to_json, ENTITY_FIELD};
use super::BACKEND;

/// `size` sent for an unbounded window; a request without `size` gets the
/// server default of 10 hits
pub const MAX_RESULT_WINDOW: u64 = 10_000;

/// Search request against one index
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub index: String,
    pub body: Json,
}

/// Compiles queries for one index
#[derive(Debug, Clone)]
pub struct DocumentCompiler {
    index: String,
}

impl DocumentCompiler {
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    fn scoped_query(&self, collection: &str, condition: Option<&Condition>) -> QueryResult<Json> {
        let mut scoped = Map::new();
        scoped.insert(
            "filter".to_string(),
            json!([{ "term": { ENTITY_FIELD: collection } }]),
        );
        if let Some(condition) = condition {
            scoped.insert("must".to_string(), json!([translate(condition)?]));
        }
        Ok(json!({ "bool": scoped }))
    }

    /// Delete-by-query body; removing single fields is not supported
    pub fn delete(&self, query: &DeleteQuery) -> QueryResult<SearchRequest> {
        if !query.removes_entries() {
            return Err(QueryError::unsupported_query(
                BACKEND,
                "removing individual fields is not supported",
            ));
        }
        Ok(SearchRequest {
            index: self.index.clone(),
            body: json!({ "query": self.scoped_query(query.collection(), query.condition())? }),
        })
    }
}

impl QueryCompiler for DocumentCompiler {
    type Request = SearchRequest;

    fn profile(&self) -> BackendProfile {
        BackendProfile {
            backend: BACKEND,
            strategy: ExecutionStrategy::Stateless,
            windowing: Windowing::Native,
            sort: SortSupport::MultiKey,
        }
    }

    fn compile(
        &self,
        query: &Query,
        _cursor: &Cursor,
        window: &FetchWindow,
    ) -> QueryResult<SearchRequest> {
        let mut body = Map::new();
        body.insert(
            "query".to_string(),
            self.scoped_query(query.collection(), query.condition())?,
        );

        if !query.sorts().is_empty() {
            let sorts: Vec<Json> = query
                .sorts()
                .iter()
                .map(|s| json!({ s.attribute.as_str(): { "order": s.direction.as_str() } }))
                .collect();
            body.insert("sort".to_string(), Json::Array(sorts));
        }

        if window.offset > 0 {
            body.insert("from".to_string(), json!(window.offset));
        }
        let size = match window.page_size {
            0 => MAX_RESULT_WINDOW,
            size => size,
        };
        body.insert("size".to_string(), json!(size));

        Ok(SearchRequest {
            index: self.index.clone(),
            body: Json::Object(body),
        })
    }
}

fn translate(condition: &Condition) -> QueryResult<Json> {
    match condition {
        Condition::Leaf(predicate) => translate_predicate(predicate),
        Condition::Composite {
            connective,
            children,
        } => {
            let clauses = children
                .iter()
                .map(translate)
                .collect::<QueryResult<Vec<_>>>()?;
            Ok(match connective {
                Connective::And => json!({ "bool": { "must": clauses } }),
                Connective::Or => {
                    json!({ "bool": { "should": clauses, "minimum_should_match": 1 } })
                }
                Connective::Not => json!({ "bool": { "must_not": clauses } }),
            })
        }
    }
}

fn translate_predicate(predicate: &Predicate) -> QueryResult<Json> {
    let field = predicate.attribute();
    let operand = |value: &Value| to_json(value).map_err(|e| e.for_attribute(field));
    let range = |bound: &str, value: &Value| -> QueryResult<Json> {
        Ok(json!({ "range": { field: { bound: operand(value)? } } }))
    };

    match predicate.operator() {
        Operator::Equal => Ok(json!({ "term": { field: operand(predicate.operand())? } })),
        Operator::Greater => range("gt", predicate.operand()),
        Operator::GreaterEqual => range("gte", predicate.operand()),
        Operator::Lesser => range("lt", predicate.operand()),
        Operator::LesserEqual => range("lte", predicate.operand()),
        Operator::Between => {
            let (low, high) = predicate.bounds().ok_or_else(|| {
                QueryError::invalid_argument(format!("BETWEEN on {} needs two bounds", field))
            })?;
            Ok(json!({ "range": { field: { "gte": operand(low)?, "lte": operand(high)? } } }))
        }
        Operator::In => Ok(json!({ "terms": { field: operand(predicate.operand())? } })),
        Operator::Like => {
            let pattern = predicate.operand().as_str().ok_or_else(|| {
                QueryError::invalid_argument(format!("LIKE on {} needs a string pattern", field))
            })?;
            Ok(json!({ "wildcard": { field: wildcard(pattern) } }))
        }
    }
}

/// `%` → `*`, `_` → `?`; literal wildcard characters are escaped
fn wildcard(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '%' => out.push('*'),
            '_' => out.push('?'),
            '*' | '?' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}
