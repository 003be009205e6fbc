//! Shared test fakes
//!
//! - `FakeCqlSession` evaluates select relations, orderings, limits and
//!   paging state over in-memory rows, and applies INSERTs.
//! - `FakeSearchClient` evaluates the search DSL over in-memory documents.
//! - Fixtures build one session per backend over the same entities.

#![allow(dead_code)]

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use regex::Regex;
use serde_json::{json, Value as Json};

use polyquery::backend::document::{DocumentCompiler, DocumentIndex, SearchClient};
use polyquery::backend::key_value::{KeyValueBucket, KeyValueConverter, MemoryMap};
use polyquery::backend::wide_column::{
    CqlSession, CqlValue, RelationOp, Row, SelectStatement, WideColumnCompiler, WideColumnTable,
    WriteStatement,
};
use polyquery::backend::{Page, WriteAdapter};
use polyquery::config::EngineConfig;
use polyquery::engine::Session;
use polyquery::entity::Entity;
use polyquery::error::TransportError;

// =============================================================================
// Fixtures
// =============================================================================

pub const KEYSPACE: &str = "app";
pub const INDEX: &str = "people";

pub fn person(id: i64, name: &str, age: i64) -> Entity {
    Entity::new("person")
        .unwrap()
        .with("id", id)
        .unwrap()
        .with("name", name)
        .unwrap()
        .with("age", age)
        .unwrap()
}

/// `n` people with ids 0..n, ages cycling through 20..25
pub fn people(n: i64) -> Vec<Entity> {
    (0..n)
        .map(|i| person(i, &format!("p{:03}", i), 20 + i % 5))
        .collect()
}

pub fn ids(entities: &[Entity]) -> Vec<i64> {
    entities
        .iter()
        .map(|e| e.get("id").unwrap().to::<i64>().unwrap())
        .collect()
}

/// Document ids are strings; map them back through the `id` attribute
pub fn document_entity(entity: &Entity) -> Entity {
    let mut copy = entity.clone();
    let id = copy.get("id").unwrap().to::<i64>().unwrap();
    copy.set("_id", format!("doc-{}", id)).unwrap();
    copy
}

/// Backends under test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    WideColumn,
    Document,
    KeyValue,
}

pub const ALL_BACKENDS: [Backend; 3] = [Backend::WideColumn, Backend::Document, Backend::KeyValue];

/// A session whose `person` collection lives in `backend`, seeded with
/// `entities` through the backend's write path
pub fn seeded_session(backend: Backend, page_size: u64, entities: &[Entity]) -> Session {
    let mut session = Session::new(EngineConfig::with_page_size(page_size));
    match backend {
        Backend::WideColumn => {
            let table = WideColumnTable::new(
                WideColumnCompiler::new(KEYSPACE),
                Arc::new(FakeCqlSession::new(KEYSPACE)),
            );
            for entity in entities {
                table.insert(entity.clone(), None).unwrap();
            }
            session.register("person", table.source());
        }
        Backend::Document => {
            let index = DocumentIndex::new(
                DocumentCompiler::new(INDEX),
                Arc::new(FakeSearchClient::new()),
            );
            for entity in entities {
                index.insert(document_entity(entity), None).unwrap();
            }
            session.register("person", index.source());
        }
        Backend::KeyValue => {
            let bucket = KeyValueBucket::new(
                KeyValueConverter::default(),
                Arc::new(MemoryMap::new()),
            );
            for entity in entities {
                bucket.insert(entity.clone(), None).unwrap();
            }
            session.register("person", bucket.source());
        }
    }
    session
}

// =============================================================================
// Fake CQL session
// =============================================================================

#[derive(Default)]
pub struct FakeCqlSession {
    keyspace: String,
    tables: Mutex<HashMap<String, Vec<Row>>>,
    pub selects: Mutex<Vec<SelectStatement>>,
    pub writes: Mutex<Vec<WriteStatement>>,
}

impl FakeCqlSession {
    pub fn new(keyspace: &str) -> Self {
        Self {
            keyspace: keyspace.to_string(),
            ..Default::default()
        }
    }

    pub fn seed(&self, table: &str, row: Row) {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    pub fn select_count(&self) -> usize {
        self.selects.lock().unwrap().len()
    }
}

/// Every double-quoted identifier in a CQL string, unescaped
fn quoted_identifiers(cql: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut chars = cql.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '"' {
            continue;
        }
        let mut ident = String::new();
        while let Some(c) = chars.next() {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    ident.push('"');
                } else {
                    break;
                }
            } else {
                ident.push(c);
            }
        }
        out.push(ident);
    }
    out
}

fn cql_compare(a: &CqlValue, b: &CqlValue) -> Option<Ordering> {
    match (a, b) {
        (CqlValue::Text(x), CqlValue::Text(y)) => Some(x.cmp(y)),
        (CqlValue::BigInt(x), CqlValue::BigInt(y)) => Some(x.cmp(y)),
        (CqlValue::BigInt(x), CqlValue::Double(y)) => (*x as f64).partial_cmp(y),
        (CqlValue::Double(x), CqlValue::BigInt(y)) => x.partial_cmp(&(*y as f64)),
        (CqlValue::Double(x), CqlValue::Double(y)) => x.partial_cmp(y),
        (CqlValue::Boolean(x), CqlValue::Boolean(y)) => Some(x.cmp(y)),
        (CqlValue::Timestamp(x), CqlValue::Timestamp(y)) => Some(x.cmp(y)),
        (CqlValue::Blob(x), CqlValue::Blob(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn sql_like(pattern: &str) -> Regex {
    let mut expression = String::from("^");
    for c in pattern.chars() {
        match c {
            '%' => expression.push_str(".*"),
            '_' => expression.push('.'),
            c => expression.push_str(&regex::escape(&c.to_string())),
        }
    }
    expression.push('$');
    Regex::new(&expression).unwrap()
}

fn relation_holds(row: &Row, column: &str, op: RelationOp, value: &CqlValue) -> bool {
    let Some(actual) = row.get(column) else {
        return false;
    };
    match op {
        RelationOp::Eq => cql_compare(actual, value) == Some(Ordering::Equal),
        RelationOp::Gt => cql_compare(actual, value) == Some(Ordering::Greater),
        RelationOp::Gte => matches!(
            cql_compare(actual, value),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        RelationOp::Lt => cql_compare(actual, value) == Some(Ordering::Less),
        RelationOp::Lte => matches!(
            cql_compare(actual, value),
            Some(Ordering::Less | Ordering::Equal)
        ),
        RelationOp::In => match value {
            CqlValue::List(items) => items
                .iter()
                .any(|item| cql_compare(actual, item) == Some(Ordering::Equal)),
            _ => false,
        },
        RelationOp::Like => match (actual, value) {
            (CqlValue::Text(text), CqlValue::Text(pattern)) => sql_like(pattern).is_match(text),
            _ => false,
        },
    }
}

impl CqlSession for FakeCqlSession {
    fn query(&self, statement: &SelectStatement) -> Result<Page<Row>, TransportError> {
        self.selects.lock().unwrap().push(statement.clone());

        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<Row> = tables
            .get(&statement.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| {
                        statement
                            .relations
                            .iter()
                            .all(|r| relation_holds(row, &r.column, r.op, &r.value))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        rows.sort_by(|a, b| {
            for sort in &statement.orderings {
                let ordering = match (a.get(&sort.attribute), b.get(&sort.attribute)) {
                    (Some(x), Some(y)) => cql_compare(x, y).unwrap_or(Ordering::Equal),
                    (None, Some(_)) => Ordering::Less,
                    (Some(_), None) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                let ordering = match sort.direction {
                    polyquery::query::SortDirection::Asc => ordering,
                    polyquery::query::SortDirection::Desc => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });

        if let Some(limit) = statement.limit {
            rows.truncate(limit as usize);
        }

        let start = statement
            .paging_state
            .as_ref()
            .map(|state| u64::from_be_bytes(state.as_slice().try_into().unwrap()) as usize)
            .unwrap_or(0)
            .min(rows.len());
        let end = match statement.page_size {
            Some(size) => (start + size as usize).min(rows.len()),
            None => rows.len(),
        };

        let page = rows[start..end].to_vec();
        if end < rows.len() {
            Ok(Page::partial(page, Some((end as u64).to_be_bytes().to_vec())))
        } else {
            Ok(Page::last(page))
        }
    }

    fn execute(&self, statement: &WriteStatement) -> Result<u64, TransportError> {
        self.writes.lock().unwrap().push(statement.clone());

        if statement.cql.starts_with("INSERT") {
            let identifiers = quoted_identifiers(&statement.cql);
            let skip = if self.keyspace.is_empty() { 0 } else { 1 };
            let table = identifiers[skip].clone();
            let columns = identifiers[skip + 1..]
                .iter()
                .cloned()
                .zip(statement.values.iter().cloned())
                .collect();
            self.seed(&table, Row::from_columns(columns));
        }
        Ok(1)
    }
}

// =============================================================================
// Fake search client
// =============================================================================

/// Hits returned when a request carries no `size`
pub const SERVER_DEFAULT_SIZE: u64 = 10;

#[derive(Default)]
pub struct FakeSearchClient {
    indices: Mutex<HashMap<String, BTreeMap<String, Json>>>,
    pub bodies: Mutex<Vec<Json>>,
}

impl FakeSearchClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search_count(&self) -> usize {
        self.bodies.lock().unwrap().len()
    }
}

fn json_compare(a: &Json, b: &Json) -> Option<Ordering> {
    match (a, b) {
        (Json::Number(x), Json::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Json::String(x), Json::String(y)) => Some(x.cmp(y)),
        (Json::Bool(x), Json::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn field<'a>(id: &'a Json, source: &'a Json, name: &str) -> Option<&'a Json> {
    if name == "_id" {
        Some(id)
    } else {
        source.get(name)
    }
}

fn single(object: &Json) -> (&str, &Json) {
    let map = object.as_object().unwrap();
    let (name, value) = map.iter().next().unwrap();
    (name.as_str(), value)
}

fn wildcard_regex(pattern: &str) -> Regex {
    let mut expression = String::from("^");
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => expression.push_str(".*"),
            '?' => expression.push('.'),
            '\\' => {
                if let Some(escaped) = chars.next() {
                    expression.push_str(&regex::escape(&escaped.to_string()));
                }
            }
            c => expression.push_str(&regex::escape(&c.to_string())),
        }
    }
    expression.push('$');
    Regex::new(&expression).unwrap()
}

fn matches_query(query: &Json, id: &Json, source: &Json) -> bool {
    let (kind, clause) = single(query);
    match kind {
        "bool" => {
            let all = |key: &str| {
                clause
                    .get(key)
                    .and_then(Json::as_array)
                    .map_or(true, |items| items.iter().all(|q| matches_query(q, id, source)))
            };
            let should_ok = match clause.get("should").and_then(Json::as_array) {
                Some(items) => items.iter().any(|q| matches_query(q, id, source)),
                None => true,
            };
            let must_not_ok = clause
                .get("must_not")
                .and_then(Json::as_array)
                .map_or(true, |items| !items.iter().any(|q| matches_query(q, id, source)));
            all("filter") && all("must") && should_ok && must_not_ok
        }
        "term" => {
            let (name, expected) = single(clause);
            field(id, source, name)
                .and_then(|actual| json_compare(actual, expected))
                .map_or(false, |o| o == Ordering::Equal)
        }
        "terms" => {
            let (name, expected) = single(clause);
            let Some(actual) = field(id, source, name) else {
                return false;
            };
            expected
                .as_array()
                .unwrap()
                .iter()
                .any(|e| json_compare(actual, e) == Some(Ordering::Equal))
        }
        "range" => {
            let (name, bounds) = single(clause);
            let Some(actual) = field(id, source, name) else {
                return false;
            };
            bounds.as_object().unwrap().iter().all(|(op, bound)| {
                match (op.as_str(), json_compare(actual, bound)) {
                    ("gt", Some(o)) => o == Ordering::Greater,
                    ("gte", Some(o)) => o != Ordering::Less,
                    ("lt", Some(o)) => o == Ordering::Less,
                    ("lte", Some(o)) => o != Ordering::Greater,
                    _ => false,
                }
            })
        }
        "wildcard" => {
            let (name, pattern) = single(clause);
            match field(id, source, name) {
                Some(Json::String(text)) => wildcard_regex(pattern.as_str().unwrap()).is_match(text),
                _ => false,
            }
        }
        other => panic!("unsupported query clause {}", other),
    }
}

impl SearchClient for FakeSearchClient {
    fn search(&self, index: &str, body: &Json) -> Result<Json, TransportError> {
        self.bodies.lock().unwrap().push(body.clone());

        let indices = self.indices.lock().unwrap();
        let mut hits: Vec<(String, Json)> = indices
            .get(index)
            .map(|docs| {
                docs.iter()
                    .filter(|(id, source)| {
                        matches_query(&body["query"], &Json::String((*id).clone()), source)
                    })
                    .map(|(id, source)| (id.clone(), source.clone()))
                    .collect()
            })
            .unwrap_or_default();

        if let Some(sorts) = body.get("sort").and_then(Json::as_array) {
            hits.sort_by(|(_, a), (_, b)| {
                for sort in sorts {
                    let (name, spec) = single(sort);
                    let ordering = match (a.get(name), b.get(name)) {
                        (Some(x), Some(y)) => json_compare(x, y).unwrap_or(Ordering::Equal),
                        (None, Some(_)) => Ordering::Less,
                        (Some(_), None) => Ordering::Greater,
                        (None, None) => Ordering::Equal,
                    };
                    let ordering = if spec["order"] == "desc" {
                        ordering.reverse()
                    } else {
                        ordering
                    };
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                Ordering::Equal
            });
        }

        let from = body.get("from").and_then(Json::as_u64).unwrap_or(0) as usize;
        let size = body
            .get("size")
            .and_then(Json::as_u64)
            .unwrap_or(SERVER_DEFAULT_SIZE) as usize;
        let page: Vec<Json> = hits
            .into_iter()
            .skip(from)
            .take(size)
            .map(|(id, source)| json!({ "_id": id, "_source": source }))
            .collect();

        Ok(json!({ "hits": { "hits": page } }))
    }

    fn put(&self, index: &str, id: &str, source: &Json) -> Result<(), TransportError> {
        self.indices
            .lock()
            .unwrap()
            .entry(index.to_string())
            .or_default()
            .insert(id.to_string(), source.clone());
        Ok(())
    }

    fn delete_by_query(&self, index: &str, body: &Json) -> Result<u64, TransportError> {
        let mut indices = self.indices.lock().unwrap();
        let Some(docs) = indices.get_mut(index) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|id, source| !matches_query(&body["query"], &Json::String(id.clone()), source));
        Ok((before - docs.len()) as u64)
    }
}
