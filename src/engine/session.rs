//! Query session
//!
//! Routes queries to the page source registered for their collection and
//! hands back lazy entity streams. Sources are fixed at registration; the
//! execution strategy of each is read from its profile when a pager starts.

use std::collections::HashMap;
use std::sync::Arc;

use crate::backend::PageSource;
use crate::config::EngineConfig;
use crate::entity::Entity;
use crate::error::{QueryError, QueryResult};
use crate::observability::{log_event_with_fields, Event};
use crate::query::Query;

use super::pager::{EntityStream, Pager};

/// Collection → source routing plus engine settings
pub struct Session {
    sources: HashMap<String, Arc<dyn PageSource>>,
    default: Option<Arc<dyn PageSource>>,
    config: EngineConfig,
}

impl Session {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            sources: HashMap::new(),
            default: None,
            config,
        }
    }

    /// Routes `collection` to `source`, replacing any earlier registration
    pub fn register(&mut self, collection: impl Into<String>, source: Arc<dyn PageSource>) {
        let collection = collection.into();
        let profile = source.profile();
        log_event_with_fields(
            Event::SourceRegistered,
            &[
                ("collection", collection.as_str()),
                ("backend", profile.backend),
                ("strategy", profile.strategy.as_str()),
            ],
        );
        self.sources.insert(collection, source);
    }

    /// Source used for collections without their own registration
    pub fn with_default(mut self, source: Arc<dyn PageSource>) -> Self {
        let profile = source.profile();
        log_event_with_fields(
            Event::SourceRegistered,
            &[
                ("collection", "*"),
                ("backend", profile.backend),
                ("strategy", profile.strategy.as_str()),
            ],
        );
        self.default = Some(source);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn source_for(&self, collection: &str) -> QueryResult<Arc<dyn PageSource>> {
        self.sources
            .get(collection)
            .or(self.default.as_ref())
            .cloned()
            .ok_or_else(|| {
                QueryError::invalid_argument(format!(
                    "no source registered for collection {}",
                    collection
                ))
            })
    }

    /// Page-level control over one execution
    pub fn pager(&self, query: Query) -> QueryResult<Pager> {
        let source = self.source_for(query.collection())?;
        Pager::new(source, query, self.config.page_size)
    }

    /// Lazy sequence of every matching entity
    pub fn execute(&self, query: Query) -> QueryResult<EntityStream> {
        Ok(EntityStream::new(self.pager(query)?))
    }

    /// At most one matching entity.
    ///
    /// Fails with `AmbiguousResult` as soon as a second entity arrives.
    pub fn execute_one(&self, query: Query) -> QueryResult<Option<Entity>> {
        let collection = query.collection().to_string();
        let mut stream = self.execute(query)?;

        let first = match stream.next() {
            None => return Ok(None),
            Some(result) => result?,
        };

        match stream.next() {
            None => Ok(Some(first)),
            Some(Err(err)) => Err(err),
            Some(Ok(_)) => {
                log_event_with_fields(Event::AmbiguousResult, &[("collection", collection.as_str())]);
                Err(QueryError::AmbiguousResult { collection })
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
