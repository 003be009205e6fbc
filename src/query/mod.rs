//! Query model
//!
//! A `Query` is an immutable descriptor: collection, optional condition,
//! ordered sorts, skip and limit. Paging state lives in a separate `Cursor`
//! owned by the pager executing the query.

mod builder;
mod cursor;
mod delete;
mod query;

pub use builder::{
    delete, select, ConditionTarget, Delete, DeleteBuilder, FieldClause, OrderClause,
    QueryBuilder, Select,
};
pub use cursor::Cursor;
pub use delete::DeleteQuery;
pub use query::{Query, Sort, SortDirection};
