//! Wide-column backend (CQL)
//!
//! Stateful cursor over the driver's paging state by default, or a single
//! stateless fetch when configured. Either way the engine asks for
//! `LIMIT skip + limit` and discards the skipped rows itself. `OR` and `NOT`
//! are not expressible and fail at compile time.

mod compiler;
mod config;
mod converter;
mod statement;
mod transport;

pub use compiler::{WideColumnCompiler, DEFAULT_KEY_COLUMN};
pub use self::config::WideColumnSettings;
pub use converter::{Row, WideColumnConverter};
pub use statement::{quote, Consistency, CqlValue, Relation, RelationOp, SelectStatement, WriteStatement};
pub use transport::{CqlSession, CqlTransport, WideColumnTable};

/// Backend name used in profiles and errors
pub const BACKEND: &str = "wide_column";
