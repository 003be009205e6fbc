//! Key-value bucket
//!
//! Reads go through `MapTransport`; writes go straight to the map proxy.
//! Inserting an entity without its key attribute generates a UUID v4 key.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::backend::{Adapter, EntityConverter, Page, PageSource, Transport, WriteAdapter};
use crate::entity::Entity;
use crate::error::{QueryResult, TransportError};
use crate::query::DeleteQuery;

use super::compiler::{KeyValueCompiler, MapQuery};
use super::converter::KeyValueConverter;
use super::memory::MapProxy;
use super::record::MapRecord;

/// Read transport over a shared map proxy
pub struct MapTransport<P> {
    proxy: Arc<P>,
}

impl<P> MapTransport<P> {
    pub fn new(proxy: Arc<P>) -> Self {
        Self { proxy }
    }
}

impl<P: MapProxy> Transport for MapTransport<P> {
    type Request = MapQuery;
    type Record = MapRecord;

    fn execute(&self, request: MapQuery) -> Result<Page<MapRecord>, TransportError> {
        self.proxy.query(&request)
    }
}

/// Read and write access to the maps of one instance
pub struct KeyValueBucket<P> {
    converter: KeyValueConverter,
    proxy: Arc<P>,
}

impl<P: MapProxy + 'static> KeyValueBucket<P> {
    pub fn new(converter: KeyValueConverter, proxy: Arc<P>) -> Self {
        Self { converter, proxy }
    }

    /// Page source for registration on a session
    pub fn source(&self) -> Arc<dyn PageSource> {
        Adapter::new(
            KeyValueCompiler,
            self.converter.clone(),
            MapTransport::new(Arc::clone(&self.proxy)),
        )
        .into_source()
    }

    pub fn proxy(&self) -> &Arc<P> {
        &self.proxy
    }
}

impl<P: MapProxy + 'static> WriteAdapter for KeyValueBucket<P> {
    fn insert(&self, mut entity: Entity, ttl: Option<Duration>) -> QueryResult<Entity> {
        let key = self.converter.key_attribute();
        if !entity.contains(key) {
            entity.set(key, Uuid::new_v4().to_string())?;
        }
        let record = self.converter.to_native(&entity)?;
        self.proxy.put(entity.name(), record, ttl)?;
        Ok(entity)
    }

    fn update(&self, entity: Entity) -> QueryResult<Entity> {
        let record = self.converter.to_native(&entity)?;
        self.proxy.put(entity.name(), record, None)?;
        Ok(entity)
    }

    fn delete(&self, query: &DeleteQuery) -> QueryResult<u64> {
        let predicate = KeyValueCompiler.predicate(query.condition())?;
        let affected = if query.removes_entries() {
            self.proxy.remove_matching(query.collection(), &predicate)?
        } else {
            self.proxy
                .remove_fields(query.collection(), &predicate, query.attributes())?
        };
        Ok(affected)
    }
}
