//! Search client seam
//!
//! `SearchClient` is the HTTP surface of the search engine. Responses are
//! raw JSON; hits are read from `hits.hits[]._id` and `hits.hits[]._source`.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value as Json;
use uuid::Uuid;

use crate::backend::{Adapter, EntityConverter, Page, PageSource, Transport, WriteAdapter};
use crate::entity::Entity;
use crate::error::{QueryError, QueryResult, TransportError};
use crate::query::DeleteQuery;

use super::compiler::{DocumentCompiler, SearchRequest};
use super::converter::{DocumentConverter, SearchHit, ID_FIELD};
use super::BACKEND;

/// Search engine client
pub trait SearchClient: Send + Sync {
    /// Runs a search body against an index; returns the raw response
    fn search(&self, index: &str, body: &Json) -> Result<Json, TransportError>;

    /// Stores a document under `id`, replacing any previous version
    fn put(&self, index: &str, id: &str, source: &Json) -> Result<(), TransportError>;

    /// Removes every document matching `body`; returns the count
    fn delete_by_query(&self, index: &str, body: &Json) -> Result<u64, TransportError>;
}

/// Reads hits from a search response
pub fn parse_hits(response: &Json) -> Result<Vec<SearchHit>, TransportError> {
    let hits = response
        .pointer("/hits/hits")
        .and_then(Json::as_array)
        .ok_or_else(|| TransportError::new("search response has no hits.hits array"))?;

    hits.iter()
        .map(|hit| {
            let id = hit
                .get("_id")
                .and_then(Json::as_str)
                .ok_or_else(|| TransportError::new("search hit without _id"))?;
            let source = match hit.get("_source") {
                Some(Json::Object(source)) => source.clone(),
                None | Some(Json::Null) => serde_json::Map::new(),
                Some(_) => return Err(TransportError::new("search hit _source is not an object")),
            };
            Ok(SearchHit {
                id: id.to_string(),
                source,
            })
        })
        .collect()
}

/// Read transport over a shared client
pub struct SearchTransport<C> {
    client: Arc<C>,
}

impl<C> SearchTransport<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }
}

impl<C: SearchClient> Transport for SearchTransport<C> {
    type Request = SearchRequest;
    type Record = SearchHit;

    fn execute(&self, request: SearchRequest) -> Result<Page<SearchHit>, TransportError> {
        let response = self.client.search(&request.index, &request.body)?;
        // Stateless: the pager recomputes from/size for the next request
        Ok(Page::partial(parse_hits(&response)?, None))
    }
}

/// Read and write access to one index
pub struct DocumentIndex<C> {
    compiler: DocumentCompiler,
    client: Arc<C>,
}

impl<C: SearchClient + 'static> DocumentIndex<C> {
    pub fn new(compiler: DocumentCompiler, client: Arc<C>) -> Self {
        Self { compiler, client }
    }

    /// Page source for registration on a session
    pub fn source(&self) -> Arc<dyn PageSource> {
        Adapter::new(
            self.compiler.clone(),
            DocumentConverter,
            SearchTransport::new(Arc::clone(&self.client)),
        )
        .into_source()
    }

    fn put(&self, entity: &Entity) -> QueryResult<()> {
        let hit = DocumentConverter.to_native(entity)?;
        self.client
            .put(self.compiler.index(), &hit.id, &Json::Object(hit.source))?;
        Ok(())
    }
}

impl<C: SearchClient + 'static> WriteAdapter for DocumentIndex<C> {
    fn insert(&self, mut entity: Entity, ttl: Option<Duration>) -> QueryResult<Entity> {
        if ttl.is_some() {
            return Err(QueryError::unsupported_query(
                BACKEND,
                "documents cannot expire",
            ));
        }
        if !entity.contains(ID_FIELD) {
            entity.set(ID_FIELD, Uuid::new_v4().to_string())?;
        }
        self.put(&entity)?;
        Ok(entity)
    }

    fn update(&self, entity: Entity) -> QueryResult<Entity> {
        if !entity.contains(ID_FIELD) {
            return Err(QueryError::invalid_argument(format!(
                "update of {} needs {}",
                entity.name(),
                ID_FIELD
            )));
        }
        self.put(&entity)?;
        Ok(entity)
    }

    fn delete(&self, query: &DeleteQuery) -> QueryResult<u64> {
        let request = self.compiler.delete(query)?;
        Ok(self.client.delete_by_query(&request.index, &request.body)?)
    }
}
