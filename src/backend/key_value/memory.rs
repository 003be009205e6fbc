//! In-memory distributed-map stand-in
//!
//! Named maps of entries behind one `RwLock`. Entries may carry a TTL and
//! are dropped lazily, on the next access to their map. Query results are
//! ordered by the first sort key, then by entry key, and paged by position.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::backend::Page;
use crate::engine::PageSorter;
use crate::error::TransportError;
use crate::observability::{log_event_with_fields, Event};
use crate::query::SortDirection;

use super::compiler::{position_token, MapQuery};
use super::predicate::MapPredicate;
use super::record::{MapRecord, MapValue};

/// Map operations a key-value bucket needs
pub trait MapProxy: Send + Sync {
    /// Runs one page of a query
    fn query(&self, query: &MapQuery) -> Result<Page<MapRecord>, TransportError>;

    /// Stores an entry, replacing any entry with the same key
    fn put(&self, map: &str, record: MapRecord, ttl: Option<Duration>)
        -> Result<(), TransportError>;

    fn contains(&self, map: &str, key: &str) -> Result<bool, TransportError>;

    /// Removes matching entries; returns how many
    fn remove_matching(&self, map: &str, predicate: &MapPredicate) -> Result<u64, TransportError>;

    /// Drops fields from matching entries; returns how many changed
    fn remove_fields(
        &self,
        map: &str,
        predicate: &MapPredicate,
        fields: &[String],
    ) -> Result<u64, TransportError>;
}

#[derive(Debug, Clone)]
struct Entry {
    record: MapRecord,
    expires_at: Option<Instant>,
}

type Maps = HashMap<String, BTreeMap<String, Entry>>;

/// Process-local map store
#[derive(Debug, Default)]
pub struct MemoryMap {
    maps: RwLock<Maps>,
}

fn poisoned<T>(_: T) -> TransportError {
    TransportError::new("map lock poisoned")
}

impl MemoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live entries in `map`
    pub fn len(&self, map: &str) -> Result<usize, TransportError> {
        let mut maps = self.maps.write().map_err(poisoned)?;
        Self::purge(&mut maps, map);
        Ok(maps.get(map).map_or(0, BTreeMap::len))
    }

    pub fn get(&self, map: &str, key: &str) -> Result<Option<MapRecord>, TransportError> {
        let mut maps = self.maps.write().map_err(poisoned)?;
        Self::purge(&mut maps, map);
        Ok(maps
            .get(map)
            .and_then(|entries| entries.get(key))
            .map(|entry| entry.record.clone()))
    }

    fn purge(maps: &mut Maps, map: &str) {
        let Some(entries) = maps.get_mut(map) else {
            return;
        };
        let now = Instant::now();
        entries.retain(|key, entry| {
            let live = entry.expires_at.map_or(true, |at| at > now);
            if !live {
                log_event_with_fields(Event::EntryExpired, &[("map", map), ("key", key.as_str())]);
            }
            live
        });
    }

    fn ordering(a: &MapRecord, b: &MapRecord, query: &MapQuery) -> Ordering {
        let Some(sort) = &query.order_by else {
            return Ordering::Equal;
        };
        let ordering = PageSorter::compare_values(
            a.get(&sort.attribute).map(MapValue::to_value).as_ref(),
            b.get(&sort.attribute).map(MapValue::to_value).as_ref(),
        );
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

impl MapProxy for MemoryMap {
    fn query(&self, query: &MapQuery) -> Result<Page<MapRecord>, TransportError> {
        let mut maps = self.maps.write().map_err(poisoned)?;
        Self::purge(&mut maps, &query.map);

        // Entry key order first; the stable sort keeps it on ties
        let mut matches: Vec<&MapRecord> = maps
            .get(&query.map)
            .map(|entries| {
                entries
                    .values()
                    .map(|entry| &entry.record)
                    .filter(|record| query.predicate.test(record))
                    .collect()
            })
            .unwrap_or_default();
        matches.sort_by(|a, b| Self::ordering(a, b, query));

        let total = matches.len() as u64;
        let start = query.anchor.min(total);
        let end = if query.page_size == 0 {
            total
        } else {
            start.saturating_add(query.page_size).min(total)
        };

        let rows = matches[start as usize..end as usize]
            .iter()
            .map(|record| (*record).clone())
            .collect();

        Ok(if end < total {
            Page::partial(rows, Some(position_token(end)))
        } else {
            Page::last(rows)
        })
    }

    fn put(
        &self,
        map: &str,
        record: MapRecord,
        ttl: Option<Duration>,
    ) -> Result<(), TransportError> {
        let mut maps = self.maps.write().map_err(poisoned)?;
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        maps.entry(map.to_string())
            .or_default()
            .insert(record.key.clone(), Entry { record, expires_at });
        Ok(())
    }

    fn contains(&self, map: &str, key: &str) -> Result<bool, TransportError> {
        Ok(self.get(map, key)?.is_some())
    }

    fn remove_matching(&self, map: &str, predicate: &MapPredicate) -> Result<u64, TransportError> {
        let mut maps = self.maps.write().map_err(poisoned)?;
        Self::purge(&mut maps, map);
        let Some(entries) = maps.get_mut(map) else {
            return Ok(0);
        };
        let before = entries.len();
        entries.retain(|_, entry| !predicate.test(&entry.record));
        Ok((before - entries.len()) as u64)
    }

    fn remove_fields(
        &self,
        map: &str,
        predicate: &MapPredicate,
        fields: &[String],
    ) -> Result<u64, TransportError> {
        let mut maps = self.maps.write().map_err(poisoned)?;
        Self::purge(&mut maps, map);
        let Some(entries) = maps.get_mut(map) else {
            return Ok(0);
        };
        let mut changed = 0;
        for entry in entries.values_mut() {
            if predicate.test(&entry.record) && entry.record.remove_fields(fields) {
                changed += 1;
            }
        }
        Ok(changed)
    }
}
