//! CQL session seam
//!
//! The driver is abstracted as a `CqlSession`. Paged selects return the
//! driver's paging state as the continuation token.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::backend::{Adapter, Page, PageSource, Transport, WriteAdapter};
use crate::entity::Entity;
use crate::error::{QueryResult, TransportError};
use crate::query::DeleteQuery;

use super::compiler::WideColumnCompiler;
use super::converter::{Row, WideColumnConverter};
use super::statement::{SelectStatement, WriteStatement};

/// Connection to a CQL cluster
pub trait CqlSession: Send + Sync {
    /// Runs one page of a select. Without a page size the whole result
    /// comes back in one page.
    fn query(&self, statement: &SelectStatement) -> Result<Page<Row>, TransportError>;

    /// Runs a write; returns the rows affected when the driver knows it
    fn execute(&self, statement: &WriteStatement) -> Result<u64, TransportError>;
}

/// Read transport over a shared session
pub struct CqlTransport<S> {
    session: Arc<S>,
}

impl<S> CqlTransport<S> {
    pub fn new(session: Arc<S>) -> Self {
        Self { session }
    }
}

impl<S: CqlSession> Transport for CqlTransport<S> {
    type Request = SelectStatement;
    type Record = Row;

    fn execute(&self, request: SelectStatement) -> Result<Page<Row>, TransportError> {
        let mut page = self.session.query(&request)?;
        if request.page_size.is_none() {
            page.continuation = None;
            page.fully_fetched = true;
        }
        Ok(page)
    }
}

/// Read and write access to one keyspace
pub struct WideColumnTable<S> {
    compiler: WideColumnCompiler,
    session: Arc<S>,
}

impl<S: CqlSession + 'static> WideColumnTable<S> {
    pub fn new(compiler: WideColumnCompiler, session: Arc<S>) -> Self {
        Self { compiler, session }
    }

    /// Page source for registration on a session
    pub fn source(&self) -> Arc<dyn PageSource> {
        Adapter::new(
            self.compiler.clone(),
            WideColumnConverter,
            CqlTransport::new(Arc::clone(&self.session)),
        )
        .into_source()
    }

    pub fn compiler(&self) -> &WideColumnCompiler {
        &self.compiler
    }
}

impl<S: CqlSession> WriteAdapter for WideColumnTable<S> {
    fn insert(&self, mut entity: Entity, ttl: Option<Duration>) -> QueryResult<Entity> {
        if !entity.contains(self.compiler.key_column()) {
            entity.set(self.compiler.key_column(), Uuid::new_v4().to_string())?;
        }
        let statement = self.compiler.insert(&entity, ttl)?;
        self.session.execute(&statement)?;
        Ok(entity)
    }

    fn update(&self, entity: Entity) -> QueryResult<Entity> {
        let statement = self.compiler.update(&entity)?;
        self.session.execute(&statement)?;
        Ok(entity)
    }

    fn delete(&self, query: &DeleteQuery) -> QueryResult<u64> {
        let statement = self.compiler.delete(query)?;
        Ok(self.session.execute(&statement)?)
    }
}
