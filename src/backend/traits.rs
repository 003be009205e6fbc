//! Backend seams
//!
//! A backend is three independent pieces: a compiler producing native
//! requests, a converter mapping native records to entities, and a transport
//! executing requests. The engine only ever sees them through `PageSource`.

use std::sync::Arc;
use std::time::Duration;

use crate::engine::BackendProfile;
use crate::entity::Entity;
use crate::error::{QueryResult, TransportError};
use crate::query::{Cursor, DeleteQuery, Query};

/// Rows the engine asks for in one fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FetchWindow {
    /// Rows the backend must skip natively (native windowing only)
    pub offset: u64,
    /// Total row cap the backend applies natively, 0 for none
    pub limit: u64,
    /// Rows per fetch, 0 for everything in one response
    pub page_size: u64,
}

/// One response from a transport
#[derive(Debug, Clone, PartialEq)]
pub struct Page<R> {
    pub rows: Vec<R>,
    /// Token to resume from; `None` means no more pages
    pub continuation: Option<Vec<u8>>,
    /// Backend declares the result stream complete
    pub fully_fetched: bool,
}

impl<R> Page<R> {
    /// A page after which nothing remains
    pub fn last(rows: Vec<R>) -> Self {
        Self {
            rows,
            continuation: None,
            fully_fetched: true,
        }
    }

    /// A page that may be followed by more
    pub fn partial(rows: Vec<R>, continuation: Option<Vec<u8>>) -> Self {
        Self {
            rows,
            continuation,
            fully_fetched: false,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Translates a query into a native request
pub trait QueryCompiler: Send + Sync {
    type Request;

    /// Capabilities the engine relies on
    fn profile(&self) -> BackendProfile;

    /// Pure translation; the same inputs always give the same request
    fn compile(
        &self,
        query: &Query,
        cursor: &Cursor,
        window: &FetchWindow,
    ) -> QueryResult<Self::Request>;
}

/// Maps entities to and from native records
pub trait EntityConverter: Send + Sync {
    type Record;

    fn to_native(&self, entity: &Entity) -> QueryResult<Self::Record>;

    /// `collection` names the entity when the record does not carry one
    fn to_entity(&self, collection: &str, record: Self::Record) -> QueryResult<Entity>;
}

/// Executes native requests (session, HTTP client, map proxy)
pub trait Transport: Send + Sync {
    type Request;
    type Record;

    fn execute(&self, request: Self::Request) -> Result<Page<Self::Record>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    type Request = T::Request;
    type Record = T::Record;

    fn execute(&self, request: Self::Request) -> Result<Page<Self::Record>, TransportError> {
        (**self).execute(request)
    }
}

/// Type-erased compile → execute → convert cycle
pub trait PageSource: Send + Sync {
    fn profile(&self) -> BackendProfile;

    /// Rows convert one at a time; a row that fails to convert is the last
    /// row of the page
    fn fetch(
        &self,
        query: &Query,
        cursor: &Cursor,
        window: &FetchWindow,
    ) -> QueryResult<Page<QueryResult<Entity>>>;
}

/// Write path, executed by backend-specific adapters
pub trait WriteAdapter: Send + Sync {
    /// Inserts an entity, optionally expiring after `ttl`; returns the
    /// stored entity (with any generated key)
    fn insert(&self, entity: Entity, ttl: Option<Duration>) -> QueryResult<Entity>;

    /// Replaces an existing entity
    fn update(&self, entity: Entity) -> QueryResult<Entity>;

    /// Returns the number of entries affected
    fn delete(&self, query: &DeleteQuery) -> QueryResult<u64>;
}
