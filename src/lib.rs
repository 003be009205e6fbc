//! polyquery - A vendor-neutral query layer over NoSQL stores
//!
//! One entity model, one condition tree and one query descriptor, compiled
//! per backend into CQL, a search DSL or a map predicate, and paged through
//! a single pagination engine.

pub mod backend;
pub mod condition;
pub mod config;
pub mod engine;
pub mod entity;
pub mod error;
pub mod observability;
pub mod query;
pub mod value;

pub use condition::Condition;
pub use crate::config::{ConfigError, EngineConfig, Settings};
pub use engine::{EntityStream, Session};
pub use entity::{Attribute, Entity};
pub use error::{QueryError, QueryResult, TransportError};
pub use query::{delete, select, Query};
pub use value::Value;
