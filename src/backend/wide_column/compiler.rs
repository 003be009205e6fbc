//! Query → CQL compilation
//!
//! CQL relations are implicitly conjunctive, so only `AND` trees (nested
//! or flat) compile. `BETWEEN` becomes a `>=`/`<=` pair; `IN` binds a single
//! list value.
//!
//! Two execution strategies:
//! - stateful cursor (default): pages follow the driver's paging state
//! - stateless: one fetch returns every row up to `LIMIT skip + limit`

use std::time::Duration;

use crate::backend::{FetchWindow, QueryCompiler};
use crate::condition::{Condition, Connective, Operator, Predicate};
use crate::engine::{BackendProfile, ExecutionStrategy, SortSupport, Windowing};
use crate::entity::Entity;
use crate::error::{QueryError, QueryResult};
use crate::query::{Cursor, DeleteQuery, Query};
use crate::value::Value;

use super::converter::to_cql;
use super::statement::{
    Consistency, CqlValue, Relation, RelationOp, SelectStatement, WriteStatement,
};
use super::BACKEND;

/// Default primary key column for updates
pub const DEFAULT_KEY_COLUMN: &str = "id";

/// Compiles queries and writes for one keyspace
#[derive(Debug, Clone)]
pub struct WideColumnCompiler {
    keyspace: String,
    allow_filtering: bool,
    key_column: String,
    strategy: ExecutionStrategy,
    consistency: Option<Consistency>,
}

impl WideColumnCompiler {
    pub fn new(keyspace: impl Into<String>) -> Self {
        Self {
            keyspace: keyspace.into(),
            allow_filtering: false,
            key_column: DEFAULT_KEY_COLUMN.to_string(),
            strategy: ExecutionStrategy::StatefulCursor,
            consistency: None,
        }
    }

    /// Paging-state cursor or single stateless fetch
    pub fn with_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Consistency level attached to every select
    pub fn with_consistency(mut self, consistency: Option<Consistency>) -> Self {
        self.consistency = consistency;
        self
    }

    pub fn strategy(&self) -> ExecutionStrategy {
        self.strategy
    }

    pub fn consistency(&self) -> Option<Consistency> {
        self.consistency
    }

    /// Appends `ALLOW FILTERING` to every select
    pub fn with_allow_filtering(mut self, allow: bool) -> Self {
        self.allow_filtering = allow;
        self
    }

    pub fn with_key_column(mut self, column: impl Into<String>) -> Self {
        self.key_column = column.into();
        self
    }

    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    fn relations(&self, condition: Option<&Condition>) -> QueryResult<Vec<Relation>> {
        let mut relations = Vec::new();
        if let Some(condition) = condition {
            collect_relations(condition, &mut relations)?;
        }
        Ok(relations)
    }

    /// `INSERT`, with `USING TTL` when `ttl` is set
    pub fn insert(&self, entity: &Entity, ttl: Option<Duration>) -> QueryResult<WriteStatement> {
        if entity.is_empty() {
            return Err(QueryError::invalid_argument(format!(
                "cannot insert entity {} without attributes",
                entity.name()
            )));
        }

        let columns = columns_of(entity.iter().map(|a| (a.name(), a.value())))?;
        let ttl_seconds = ttl.map(|ttl| {
            // CQL TTLs are whole seconds; round up so short TTLs still expire
            let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
            secs.max(1)
        });

        Ok(WriteStatement::insert(
            &self.keyspace,
            entity.name(),
            columns,
            ttl_seconds,
        ))
    }

    /// `UPDATE ... SET ... WHERE key = ?`
    pub fn update(&self, entity: &Entity) -> QueryResult<WriteStatement> {
        let key = entity.get(&self.key_column).ok_or_else(|| {
            QueryError::invalid_argument(format!(
                "update of {} needs key column {}",
                entity.name(),
                self.key_column
            ))
        })?;

        let assignments = columns_of(
            entity
                .iter()
                .filter(|a| a.name() != self.key_column)
                .map(|a| (a.name(), a.value())),
        )?;
        if assignments.is_empty() {
            return Err(QueryError::invalid_argument(format!(
                "update of {} has nothing to set",
                entity.name()
            )));
        }

        let key = Relation::new(
            self.key_column.clone(),
            RelationOp::Eq,
            to_cql(key).map_err(|e| e.for_attribute(&self.key_column))?,
        );
        Ok(WriteStatement::update(
            &self.keyspace,
            entity.name(),
            assignments,
            key,
        ))
    }

    /// `DELETE [columns] FROM ... WHERE ...`; a condition is required
    pub fn delete(&self, query: &DeleteQuery) -> QueryResult<WriteStatement> {
        let condition = query.condition().ok_or_else(|| {
            QueryError::unsupported_query(BACKEND, "DELETE needs a condition")
        })?;
        let relations = self.relations(Some(condition))?;

        Ok(WriteStatement::delete(
            &self.keyspace,
            query.collection(),
            query.attributes(),
            relations,
        ))
    }
}

impl QueryCompiler for WideColumnCompiler {
    type Request = SelectStatement;

    fn profile(&self) -> BackendProfile {
        BackendProfile {
            backend: BACKEND,
            strategy: self.strategy,
            windowing: Windowing::NativeLimitOnly,
            sort: SortSupport::MultiKey,
        }
    }

    fn compile(
        &self,
        query: &Query,
        cursor: &Cursor,
        window: &FetchWindow,
    ) -> QueryResult<SelectStatement> {
        let (page_size, paging_state) = match self.strategy {
            ExecutionStrategy::StatefulCursor => (
                (window.page_size > 0).then_some(window.page_size),
                cursor.token().map(<[u8]>::to_vec),
            ),
            ExecutionStrategy::Stateless => (None, None),
        };

        Ok(SelectStatement {
            keyspace: self.keyspace.clone(),
            table: query.collection().to_string(),
            relations: self.relations(query.condition())?,
            orderings: query.sorts().to_vec(),
            limit: (window.limit > 0).then_some(window.limit),
            page_size,
            paging_state,
            allow_filtering: self.allow_filtering,
            consistency: self.consistency,
        })
    }
}

fn columns_of<'a>(
    attributes: impl Iterator<Item = (&'a str, &'a Value)>,
) -> QueryResult<Vec<(String, CqlValue)>> {
    attributes
        .map(|(name, value)| {
            to_cql(value)
                .map(|v| (name.to_string(), v))
                .map_err(|e| e.for_attribute(name))
        })
        .collect()
}

fn collect_relations(condition: &Condition, out: &mut Vec<Relation>) -> QueryResult<()> {
    match condition {
        Condition::Leaf(predicate) => push_predicate(predicate, out),
        Condition::Composite {
            connective: Connective::And,
            children,
        } => {
            for child in children {
                collect_relations(child, out)?;
            }
            Ok(())
        }
        Condition::Composite { connective, .. } => Err(QueryError::unsupported_query(
            BACKEND,
            format!("CQL has no {} operator", connective.as_str()),
        )),
    }
}

fn push_predicate(predicate: &Predicate, out: &mut Vec<Relation>) -> QueryResult<()> {
    let column = predicate.attribute();
    let bind = |value: &Value| to_cql(value).map_err(|e| e.for_attribute(column));

    let op = match predicate.operator() {
        Operator::Equal => RelationOp::Eq,
        Operator::Greater => RelationOp::Gt,
        Operator::GreaterEqual => RelationOp::Gte,
        Operator::Lesser => RelationOp::Lt,
        Operator::LesserEqual => RelationOp::Lte,
        Operator::In => RelationOp::In,
        Operator::Like => RelationOp::Like,
        Operator::Between => {
            let (low, high) = predicate.bounds().ok_or_else(|| {
                QueryError::invalid_argument(format!("BETWEEN on {} needs two bounds", column))
            })?;
            out.push(Relation::new(column, RelationOp::Gte, bind(low)?));
            out.push(Relation::new(column, RelationOp::Lte, bind(high)?));
            return Ok(());
        }
    };

    out.push(Relation::new(column, op, bind(predicate.operand())?));
    Ok(())
}
