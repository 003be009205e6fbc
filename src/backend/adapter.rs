//! Compiler + converter + transport bundle
//!
//! Wraps the three backend pieces into a `PageSource` so a session can hold
//! any backend behind `Arc<dyn PageSource>`.

use std::sync::Arc;

use crate::engine::BackendProfile;
use crate::entity::Entity;
use crate::error::QueryResult;
use crate::query::{Cursor, Query};

use super::traits::{EntityConverter, FetchWindow, Page, PageSource, QueryCompiler, Transport};

/// One registered backend
pub struct Adapter<C, V, T> {
    compiler: C,
    converter: V,
    transport: T,
}

impl<C, V, T> Adapter<C, V, T>
where
    C: QueryCompiler + 'static,
    V: EntityConverter + 'static,
    T: Transport<Request = C::Request, Record = V::Record> + 'static,
{
    pub fn new(compiler: C, converter: V, transport: T) -> Self {
        Self {
            compiler,
            converter,
            transport,
        }
    }

    /// Erases the adapter for registration on a session
    pub fn into_source(self) -> Arc<dyn PageSource> {
        Arc::new(self)
    }

    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    pub fn converter(&self) -> &V {
        &self.converter
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<C, V, T> PageSource for Adapter<C, V, T>
where
    C: QueryCompiler,
    V: EntityConverter,
    T: Transport<Request = C::Request, Record = V::Record>,
{
    fn profile(&self) -> BackendProfile {
        self.compiler.profile()
    }

    fn fetch(
        &self,
        query: &Query,
        cursor: &Cursor,
        window: &FetchWindow,
    ) -> QueryResult<Page<QueryResult<Entity>>> {
        let request = self.compiler.compile(query, cursor, window)?;
        let page = self.transport.execute(request)?;

        let mut rows = Vec::with_capacity(page.rows.len());
        for record in page.rows {
            let converted = self.converter.to_entity(query.collection(), record);
            let failed = converted.is_err();
            rows.push(converted);
            if failed {
                break;
            }
        }

        Ok(Page {
            rows,
            continuation: page.continuation,
            fully_fetched: page.fully_fetched,
        })
    }
}
