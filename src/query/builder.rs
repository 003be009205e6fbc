//! Fluent query construction
//!
//! ```
//! use polyquery::query::select;
//!
//! let query = select()
//!     .from("person")
//!     .filter("name").eq("Ana")
//!     .and("age").gte(18)
//!     .order_by("age").desc()
//!     .limit(10)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(query.collection(), "person");
//! assert_eq!(query.limit(), 10);
//! ```
//!
//! Failures are remembered and reported by `build()`, so a chain never
//! panics half-way.

use crate::condition::{Condition, Connective, Operator};
use crate::error::{QueryError, QueryResult};
use crate::value::Value;

use super::delete::DeleteQuery;
use super::query::{Query, Sort};

/// Builders that accumulate a condition tree
pub trait ConditionTarget: Sized {
    /// Merges a new condition (or the error building it) under `connective`
    fn push_condition(self, connective: Connective, condition: QueryResult<Condition>) -> Self;
}

fn merge(
    current: &mut Option<Condition>,
    error: &mut Option<QueryError>,
    connective: Connective,
    condition: QueryResult<Condition>,
) {
    if error.is_some() {
        return;
    }
    match condition {
        Ok(next) => {
            *current = Some(match current.take() {
                Some(existing) => existing.combine(connective, next),
                None => next,
            });
        }
        Err(e) => *error = Some(e),
    }
}

/// Entry point: `select().from("collection")`
pub fn select() -> Select {
    Select
}

/// Entry point: `delete().from("collection")`
pub fn delete() -> Delete {
    Delete {
        attributes: Vec::new(),
    }
}

/// Selection before the collection is known
#[derive(Debug, Clone, Copy, Default)]
pub struct Select;

impl Select {
    pub fn from(self, collection: impl Into<String>) -> QueryBuilder {
        QueryBuilder::new(collection)
    }
}

/// Deletion before the collection is known
#[derive(Debug, Clone, Default)]
pub struct Delete {
    attributes: Vec<String>,
}

impl Delete {
    /// Restricts the deletion to these attributes instead of whole entries
    pub fn attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn from(self, collection: impl Into<String>) -> DeleteBuilder {
        DeleteBuilder {
            collection: collection.into(),
            attributes: self.attributes,
            condition: None,
            error: None,
        }
    }
}

/// Query under construction
#[derive(Debug)]
pub struct QueryBuilder {
    collection: String,
    condition: Option<Condition>,
    sorts: Vec<Sort>,
    skip: u64,
    limit: u64,
    error: Option<QueryError>,
}

impl QueryBuilder {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            condition: None,
            sorts: Vec::new(),
            skip: 0,
            limit: 0,
            error: None,
        }
    }

    /// Starts a field clause; ANDed with anything already present
    pub fn filter(self, attribute: impl Into<String>) -> FieldClause<Self> {
        FieldClause::new(self, attribute, Connective::And)
    }

    /// Starts a field clause ANDed with the current condition
    pub fn and(self, attribute: impl Into<String>) -> FieldClause<Self> {
        FieldClause::new(self, attribute, Connective::And)
    }

    /// Starts a field clause ORed with the current condition
    pub fn or(self, attribute: impl Into<String>) -> FieldClause<Self> {
        FieldClause::new(self, attribute, Connective::Or)
    }

    /// Replaces the condition with a prebuilt tree
    pub fn matching(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn order_by(self, attribute: impl Into<String>) -> OrderClause {
        OrderClause {
            builder: self,
            attribute: attribute.into(),
        }
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sorts.push(sort);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    /// Caps the result count; 0 means unbounded
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn build(self) -> QueryResult<Query> {
        if let Some(e) = self.error {
            return Err(e);
        }
        if self.collection.is_empty() {
            return Err(QueryError::invalid_argument(
                "query collection name must not be empty",
            ));
        }
        if let Some(sort) = self.sorts.iter().find(|s| s.attribute.is_empty()) {
            return Err(QueryError::invalid_argument(format!(
                "sort attribute must not be empty ({})",
                sort.direction.as_str()
            )));
        }
        Ok(Query {
            collection: self.collection,
            condition: self.condition,
            sorts: self.sorts,
            skip: self.skip,
            limit: self.limit,
        })
    }
}

impl ConditionTarget for QueryBuilder {
    fn push_condition(mut self, connective: Connective, condition: QueryResult<Condition>) -> Self {
        merge(&mut self.condition, &mut self.error, connective, condition);
        self
    }
}

/// Delete under construction
#[derive(Debug)]
pub struct DeleteBuilder {
    collection: String,
    attributes: Vec<String>,
    condition: Option<Condition>,
    error: Option<QueryError>,
}

impl DeleteBuilder {
    pub fn filter(self, attribute: impl Into<String>) -> FieldClause<Self> {
        FieldClause::new(self, attribute, Connective::And)
    }

    pub fn and(self, attribute: impl Into<String>) -> FieldClause<Self> {
        FieldClause::new(self, attribute, Connective::And)
    }

    pub fn or(self, attribute: impl Into<String>) -> FieldClause<Self> {
        FieldClause::new(self, attribute, Connective::Or)
    }

    pub fn matching(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn build(self) -> QueryResult<DeleteQuery> {
        if let Some(e) = self.error {
            return Err(e);
        }
        DeleteQuery::new(self.collection, self.condition, self.attributes)
    }
}

impl ConditionTarget for DeleteBuilder {
    fn push_condition(mut self, connective: Connective, condition: QueryResult<Condition>) -> Self {
        merge(&mut self.condition, &mut self.error, connective, condition);
        self
    }
}

/// A pending `attribute <op> operand` clause
#[derive(Debug)]
pub struct FieldClause<B> {
    builder: B,
    attribute: String,
    connective: Connective,
    negated: bool,
}

impl<B: ConditionTarget> FieldClause<B> {
    fn new(builder: B, attribute: impl Into<String>, connective: Connective) -> Self {
        Self {
            builder,
            attribute: attribute.into(),
            connective,
            negated: false,
        }
    }

    /// Negates the clause being built
    pub fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    fn finish(self, operator: Operator, operand: Value) -> B {
        let negated = self.negated;
        let condition = Condition::leaf(self.attribute, operator, operand).map(|c| {
            if negated {
                Condition::negate(c)
            } else {
                c
            }
        });
        self.builder.push_condition(self.connective, condition)
    }

    pub fn eq(self, operand: impl Into<Value>) -> B {
        self.finish(Operator::Equal, operand.into())
    }

    pub fn gt(self, operand: impl Into<Value>) -> B {
        self.finish(Operator::Greater, operand.into())
    }

    pub fn gte(self, operand: impl Into<Value>) -> B {
        self.finish(Operator::GreaterEqual, operand.into())
    }

    pub fn lt(self, operand: impl Into<Value>) -> B {
        self.finish(Operator::Lesser, operand.into())
    }

    pub fn lte(self, operand: impl Into<Value>) -> B {
        self.finish(Operator::LesserEqual, operand.into())
    }

    pub fn between(self, lower: impl Into<Value>, upper: impl Into<Value>) -> B {
        self.finish(
            Operator::Between,
            Value::Sequence(vec![lower.into(), upper.into()]),
        )
    }

    pub fn in_list<I, V>(self, items: I) -> B
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.finish(Operator::In, Value::sequence(items))
    }

    pub fn like(self, pattern: impl Into<String>) -> B {
        self.finish(Operator::Like, Value::String(pattern.into()))
    }
}

/// A pending sort clause
#[derive(Debug)]
pub struct OrderClause {
    builder: QueryBuilder,
    attribute: String,
}

impl OrderClause {
    pub fn asc(self) -> QueryBuilder {
        self.builder.sort(Sort::asc(self.attribute))
    }

    pub fn desc(self) -> QueryBuilder {
        self.builder.sort(Sort::desc(self.attribute))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SortDirection;

    #[test]
    fn test_simple_select() {
        let query = select().from("person").build().unwrap();
        assert_eq!(query.collection(), "person");
        assert!(query.condition().is_none());
        assert_eq!(query.skip(), 0);
        assert_eq!(query.limit(), 0);
        assert!(!query.is_bounded());
    }

    #[test]
    fn test_where_eq() {
        let query = select()
            .from("person")
            .filter("name")
            .eq("Ana")
            .build()
            .unwrap();
        assert_eq!(query.condition(), Some(&Condition::eq("name", "Ana").unwrap()));
    }

    #[test]
    fn test_and_or_chain() {
        let query = select()
            .from("person")
            .filter("name")
            .eq("Ana")
            .and("age")
            .gt(18)
            .or("vip")
            .eq(true)
            .build()
            .unwrap();

        let expected = Condition::or(vec![
            Condition::and(vec![
                Condition::eq("name", "Ana").unwrap(),
                Condition::gt("age", 18).unwrap(),
            ])
            .unwrap(),
            Condition::eq("vip", true).unwrap(),
        ])
        .unwrap();
        assert_eq!(query.condition(), Some(&expected));
    }

    #[test]
    fn test_not_clause() {
        let query = select()
            .from("person")
            .filter("name")
            .not()
            .eq("Bo")
            .build()
            .unwrap();
        assert_eq!(
            query.condition(),
            Some(&Condition::negate(Condition::eq("name", "Bo").unwrap()))
        );
    }

    #[test]
    fn test_sorts_skip_limit() {
        let query = select()
            .from("person")
            .order_by("age")
            .desc()
            .order_by("name")
            .asc()
            .skip(5)
            .limit(10)
            .build()
            .unwrap();

        assert_eq!(query.sorts().len(), 2);
        assert_eq!(query.sorts()[0].direction, SortDirection::Desc);
        assert_eq!(query.sorts()[1].attribute, "name");
        assert_eq!(query.skip(), 5);
        assert_eq!(query.limit(), 10);
    }

    #[test]
    fn test_first_error_is_reported() {
        let err = select()
            .from("person")
            .filter("id")
            .in_list(Vec::<i64>::new())
            .and("")
            .eq(1)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("IN"));
    }

    #[test]
    fn test_empty_collection_rejected() {
        assert!(select().from("").build().is_err());
    }

    #[test]
    fn test_delete_builder() {
        let delete = delete()
            .attributes(["nickname"])
            .from("person")
            .filter("id")
            .eq(3)
            .build()
            .unwrap();
        assert_eq!(delete.collection(), "person");
        assert_eq!(delete.attributes(), ["nickname".to_string()]);
        assert!(delete.condition().is_some());
    }
}
