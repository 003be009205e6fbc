//! Pagination state machine
//!
//! A pager drives one query through repeated compile → execute → convert
//! cycles until it is exhausted:
//!
//! ```text
//! Fresh ──▶ InFlight ──▶ HasMore ──▶ InFlight ──▶ ... ──▶ Exhausted
//!                 └──────────────────────────────────────────▲
//! ```
//!
//! Exhaustion is terminal. No request is compiled after it, and the pager
//! cannot be restarted; run the query again for a fresh pager.
//!
//! A row that fails to convert ends its page: the rows before it are
//! delivered, then the error.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::backend::{FetchWindow, Page, PageSource};
use crate::entity::Entity;
use crate::error::{QueryError, QueryResult};
use crate::observability::{log_event_with_fields, Event};
use crate::query::{Cursor, Query};

use super::profile::{BackendProfile, ExecutionStrategy, SortSupport, Windowing};
use super::sorter::PageSorter;

/// Rows per fetch on stateless backends when the configured page size is 0.
/// Search engines cap a request without an explicit size, so an unbounded
/// single fetch would silently lose rows.
pub const STATELESS_PAGE_SIZE: u64 = 1_000;

/// Pager lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerState {
    /// No page requested yet
    Fresh,
    /// A fetch is running
    InFlight,
    /// At least one page delivered, more may follow
    HasMore,
    /// Terminal
    Exhausted,
}

/// Drives one query over one page source
pub struct Pager {
    source: Arc<dyn PageSource>,
    profile: BackendProfile,
    query: Query,
    cursor: Cursor,
    page_size: u64,
    /// Rows returned by the backend so far
    received: u64,
    /// Rows discarded for `skip` by the engine
    skipped: u64,
    /// Rows handed to the caller
    emitted: u64,
    /// Conversion failure to surface after the rows that preceded it
    pending: Option<QueryError>,
    state: PagerState,
}

impl Pager {
    /// Creates a pager; fails if the query needs more sort keys than the
    /// backend supports.
    ///
    /// A `page_size` of 0 means one fetch for stateful backends and
    /// `STATELESS_PAGE_SIZE` rows per fetch for stateless ones.
    pub fn new(source: Arc<dyn PageSource>, query: Query, page_size: u64) -> QueryResult<Self> {
        let profile = source.profile();

        if let Some(max) = profile.max_sort_keys() {
            if query.sorts().len() > max {
                return Err(QueryError::unsupported_query(
                    profile.backend,
                    format!(
                        "{} sort keys requested, at most {} supported",
                        query.sorts().len(),
                        max
                    ),
                ));
            }
        }

        Ok(Self {
            source,
            profile,
            query,
            cursor: Cursor::new(),
            page_size: match (profile.strategy, page_size) {
                (ExecutionStrategy::Stateless, 0) => STATELESS_PAGE_SIZE,
                _ => page_size,
            },
            received: 0,
            skipped: 0,
            emitted: 0,
            pending: None,
            state: PagerState::Fresh,
        })
    }

    pub fn state(&self) -> PagerState {
        self.state
    }

    pub fn profile(&self) -> &BackendProfile {
        &self.profile
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Rows delivered to the caller so far
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == PagerState::Exhausted
    }

    /// Fetches the next non-empty page.
    ///
    /// Returns `Ok(None)` once exhausted. An error exhausts the pager.
    pub fn next_page(&mut self) -> QueryResult<Option<Vec<Entity>>> {
        loop {
            if self.state == PagerState::Exhausted {
                return Ok(None);
            }

            if let Some(err) = self.pending.take() {
                self.fail(&err);
                return Err(err);
            }

            if self.state == PagerState::Fresh {
                self.log_start();
            }

            let window = self.window();
            self.state = PagerState::InFlight;

            let page = match self.source.fetch(&self.query, &self.cursor, &window) {
                Ok(page) => page,
                Err(err) => {
                    self.fail(&err);
                    return Err(err);
                }
            };

            let rows = self.accept(page, &window);
            if !rows.is_empty() {
                return Ok(Some(rows));
            }
        }
    }

    /// Request window for the next fetch
    fn window(&self) -> FetchWindow {
        let skip = self.query.skip();
        let limit = self.query.limit();

        let offset = match (self.profile.strategy, self.profile.windowing) {
            (ExecutionStrategy::Stateless, Windowing::Native) => skip.saturating_add(self.received),
            (ExecutionStrategy::Stateless, _) => self.received,
            (ExecutionStrategy::StatefulCursor, Windowing::Native) => skip,
            (ExecutionStrategy::StatefulCursor, _) => 0,
        };

        let native_limit = match self.profile.windowing {
            Windowing::Native => limit,
            Windowing::NativeLimitOnly if limit > 0 => skip.saturating_add(limit),
            _ => 0,
        };

        let page_size = match self.profile.windowing {
            Windowing::Native if limit > 0 => {
                let remaining = limit.saturating_sub(self.received);
                if self.page_size == 0 {
                    remaining
                } else {
                    self.page_size.min(remaining)
                }
            }
            _ => self.page_size,
        };

        FetchWindow {
            offset,
            limit: native_limit,
            page_size,
        }
    }

    /// Applies one fetched page: page sort, client-side skip, limit, and
    /// exhaustion. Returns the rows to deliver.
    fn accept(&mut self, page: Page<QueryResult<Entity>>, window: &FetchWindow) -> Vec<Entity> {
        let fetched = page.rows.len() as u64;
        self.received = self.received.saturating_add(fetched);

        let mut failure = None;
        let mut rows = Vec::with_capacity(page.rows.len());
        for row in page.rows {
            match row {
                Ok(entity) => rows.push(entity),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        let mut exhausted = match self.profile.strategy {
            ExecutionStrategy::StatefulCursor => {
                page.continuation.is_none() || page.fully_fetched || fetched == 0
            }
            ExecutionStrategy::Stateless => {
                page.fully_fetched || window.page_size == 0 || fetched < window.page_size
            }
        };

        if self.profile.sort == SortSupport::SingleKeyWithPageSort && self.query.sorts().len() > 1
        {
            PageSorter::sort(&mut rows, self.query.sorts());
        }

        if self.profile.skips_client_side() {
            let pending = self.query.skip() - self.skipped;
            let drop = pending.min(rows.len() as u64);
            if drop > 0 {
                rows.drain(..drop as usize);
                self.skipped += drop;
            }
        }

        if self.query.is_bounded() {
            let remaining = self.query.limit() - self.emitted;
            if rows.len() as u64 >= remaining {
                rows.truncate(remaining as usize);
                exhausted = true;
                // The failed row lies past the limit and is never delivered
                failure = None;
            }
        }

        self.emitted += rows.len() as u64;

        let fetched_str = fetched.to_string();
        let delivered = rows.len().to_string();
        log_event_with_fields(
            Event::PageFetched,
            &[
                ("collection", self.query.collection()),
                ("backend", self.profile.backend),
                ("fetched", fetched_str.as_str()),
                ("delivered", delivered.as_str()),
            ],
        );

        if failure.is_some() {
            self.pending = failure;
            self.state = PagerState::HasMore;
        } else if exhausted {
            self.exhaust();
        } else {
            if self.profile.strategy == ExecutionStrategy::StatefulCursor {
                self.cursor.advance(page.continuation);
            }
            self.state = PagerState::HasMore;
        }

        rows
    }

    fn exhaust(&mut self) {
        self.cursor.exhaust();
        self.state = PagerState::Exhausted;

        let emitted = self.emitted.to_string();
        log_event_with_fields(
            Event::QueryExhausted,
            &[
                ("collection", self.query.collection()),
                ("emitted", emitted.as_str()),
            ],
        );
    }

    fn fail(&mut self, err: &QueryError) {
        self.cursor.exhaust();
        self.state = PagerState::Exhausted;

        let message = err.to_string();
        log_event_with_fields(
            Event::QueryFailed,
            &[
                ("collection", self.query.collection()),
                ("backend", self.profile.backend),
                ("code", err.code()),
                ("error", message.as_str()),
            ],
        );
    }

    fn log_start(&self) {
        let page_size = self.page_size.to_string();
        log_event_with_fields(
            Event::QueryStart,
            &[
                ("collection", self.query.collection()),
                ("backend", self.profile.backend),
                ("strategy", self.profile.strategy.as_str()),
                ("windowing", self.profile.windowing.as_str()),
                ("page_size", page_size.as_str()),
            ],
        );
    }
}

/// Lazy entity sequence over a pager.
///
/// Yields each entity once, in backend order. The first error is yielded
/// once and ends the sequence. Dropping the stream abandons the query.
pub struct EntityStream {
    pager: Pager,
    buffer: VecDeque<Entity>,
    done: bool,
}

impl EntityStream {
    pub fn new(pager: Pager) -> Self {
        Self {
            pager,
            buffer: VecDeque::new(),
            done: false,
        }
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }
}

impl Iterator for EntityStream {
    type Item = QueryResult<Entity>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entity) = self.buffer.pop_front() {
                return Some(Ok(entity));
            }
            if self.done {
                return None;
            }
            match self.pager.next_page() {
                Ok(Some(rows)) => self.buffer.extend(rows),
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::profile::SortSupport;
    use crate::error::TransportError;
    use crate::query::select;
    use std::sync::Mutex;

    /// Serves a fixed row list and records every window it was asked for
    struct Scripted {
        profile: BackendProfile,
        rows: Vec<Entity>,
        windows: Mutex<Vec<FetchWindow>>,
        fail_after: Option<usize>,
        /// Row index that fails to convert
        bad_row: Option<usize>,
    }

    impl Scripted {
        fn new(profile: BackendProfile, n: i64) -> Self {
            let rows = (0..n)
                .map(|i| Entity::new("person").unwrap().with("id", i).unwrap())
                .collect();
            Self {
                profile,
                rows,
                windows: Mutex::new(Vec::new()),
                fail_after: None,
                bad_row: None,
            }
        }

        fn calls(&self) -> usize {
            self.windows.lock().unwrap().len()
        }
    }

    impl PageSource for Scripted {
        fn profile(&self) -> BackendProfile {
            self.profile
        }

        fn fetch(
            &self,
            _query: &Query,
            cursor: &Cursor,
            window: &FetchWindow,
        ) -> QueryResult<Page<QueryResult<Entity>>> {
            let mut windows = self.windows.lock().unwrap();
            if Some(windows.len()) == self.fail_after {
                return Err(TransportError::new("connection reset").into());
            }
            windows.push(*window);

            let total = if self.profile.windowing == Windowing::NativeLimitOnly && window.limit > 0 {
                (window.limit as usize).min(self.rows.len())
            } else {
                self.rows.len()
            };

            let start = match self.profile.strategy {
                ExecutionStrategy::Stateless => window.offset as usize,
                ExecutionStrategy::StatefulCursor => cursor
                    .token()
                    .map(|t| u64::from_be_bytes(t.try_into().unwrap()) as usize)
                    .unwrap_or(window.offset as usize),
            }
            .min(total);

            let end = if window.page_size == 0 {
                total
            } else {
                (start + window.page_size as usize).min(total)
            };
            let mut rows = Vec::new();
            for (i, row) in self.rows[start..end].iter().enumerate() {
                if Some(start + i) == self.bad_row {
                    rows.push(Err(QueryError::conversion("bad timestamp")));
                    break;
                }
                rows.push(Ok(row.clone()));
            }

            Ok(match self.profile.strategy {
                ExecutionStrategy::Stateless => Page::partial(rows, None),
                ExecutionStrategy::StatefulCursor if end < total => {
                    Page::partial(rows, Some((end as u64).to_be_bytes().to_vec()))
                }
                ExecutionStrategy::StatefulCursor => Page::last(rows),
            })
        }
    }

    fn profile(strategy: ExecutionStrategy, windowing: Windowing) -> BackendProfile {
        BackendProfile {
            backend: "scripted",
            strategy,
            windowing,
            sort: SortSupport::MultiKey,
        }
    }

    fn ids(stream: EntityStream) -> Vec<i64> {
        stream
            .map(|e| e.unwrap().get("id").unwrap().to::<i64>().unwrap())
            .collect()
    }

    fn query(skip: u64, limit: u64) -> Query {
        select()
            .from("person")
            .skip(skip)
            .limit(limit)
            .build()
            .unwrap()
    }

    #[test]
    fn test_stateful_pages_until_no_token() {
        let source = Arc::new(Scripted::new(
            profile(ExecutionStrategy::StatefulCursor, Windowing::ClientSide),
            5,
        ));
        let pager = Pager::new(source.clone(), query(0, 0), 2).unwrap();
        assert_eq!(ids(EntityStream::new(pager)), vec![0, 1, 2, 3, 4]);
        assert_eq!(source.calls(), 3);
    }

    #[test]
    fn test_stateless_short_page_exhausts() {
        let source = Arc::new(Scripted::new(
            profile(ExecutionStrategy::Stateless, Windowing::Native),
            4,
        ));
        let pager = Pager::new(source.clone(), query(0, 0), 2).unwrap();
        assert_eq!(ids(EntityStream::new(pager)), vec![0, 1, 2, 3]);
        // Full page, full page, then an empty short page
        assert_eq!(source.calls(), 3);
    }

    #[test]
    fn test_native_window_offsets() {
        let source = Arc::new(Scripted::new(
            profile(ExecutionStrategy::Stateless, Windowing::Native),
            20,
        ));
        let pager = Pager::new(source.clone(), query(3, 5), 2).unwrap();
        assert_eq!(ids(EntityStream::new(pager)), vec![3, 4, 5, 6, 7]);

        let windows = source.windows.lock().unwrap();
        let offsets: Vec<u64> = windows.iter().map(|w| w.offset).collect();
        let sizes: Vec<u64> = windows.iter().map(|w| w.page_size).collect();
        assert_eq!(offsets, vec![3, 5, 7]);
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn test_limit_only_discards_skip() {
        let source = Arc::new(Scripted::new(
            profile(ExecutionStrategy::StatefulCursor, Windowing::NativeLimitOnly),
            20,
        ));
        let pager = Pager::new(source.clone(), query(3, 4), 2).unwrap();
        assert_eq!(ids(EntityStream::new(pager)), vec![3, 4, 5, 6]);

        let windows = source.windows.lock().unwrap();
        assert!(windows.iter().all(|w| w.limit == 7 && w.offset == 0));
    }

    #[test]
    fn test_client_side_skip_spanning_pages() {
        let source = Arc::new(Scripted::new(
            profile(ExecutionStrategy::StatefulCursor, Windowing::ClientSide),
            10,
        ));
        let pager = Pager::new(source, query(5, 0), 2).unwrap();
        assert_eq!(ids(EntityStream::new(pager)), vec![5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_no_fetch_after_exhaustion() {
        let source = Arc::new(Scripted::new(
            profile(ExecutionStrategy::StatefulCursor, Windowing::ClientSide),
            3,
        ));
        let mut pager = Pager::new(source.clone(), query(0, 0), 10).unwrap();
        assert_eq!(pager.state(), PagerState::Fresh);

        assert_eq!(pager.next_page().unwrap().unwrap().len(), 3);
        assert_eq!(pager.state(), PagerState::Exhausted);
        assert!(pager.cursor().is_exhausted());

        assert!(pager.next_page().unwrap().is_none());
        assert_eq!(source.calls(), 1);
    }

    #[test]
    fn test_has_more_between_pages() {
        let source = Arc::new(Scripted::new(
            profile(ExecutionStrategy::StatefulCursor, Windowing::ClientSide),
            3,
        ));
        let mut pager = Pager::new(source, query(0, 0), 2).unwrap();
        pager.next_page().unwrap();
        assert_eq!(pager.state(), PagerState::HasMore);
        assert!(pager.cursor().token().is_some());
    }

    #[test]
    fn test_error_yielded_once() {
        let mut scripted = Scripted::new(
            profile(ExecutionStrategy::StatefulCursor, Windowing::ClientSide),
            5,
        );
        scripted.fail_after = Some(1);
        let source = Arc::new(scripted);

        let mut stream = EntityStream::new(Pager::new(source, query(0, 0), 2).unwrap());
        assert!(stream.next().unwrap().is_ok());
        assert!(stream.next().unwrap().is_ok());

        let err = stream.next().unwrap().unwrap_err();
        assert_eq!(err.code(), "QUERY_TRANSPORT_FAILED");
        assert!(stream.next().is_none());
        assert!(stream.pager().is_exhausted());
    }

    #[test]
    fn test_single_key_backend_rejects_two_sorts() {
        let mut p = profile(ExecutionStrategy::Stateless, Windowing::Native);
        p.sort = SortSupport::SingleKey;
        let source = Arc::new(Scripted::new(p, 1));

        let q = select()
            .from("person")
            .order_by("a")
            .asc()
            .order_by("b")
            .asc()
            .build()
            .unwrap();
        let err = Pager::new(source, q, 10).err().unwrap();
        assert_eq!(err.code(), "QUERY_UNSUPPORTED");
    }

    #[test]
    fn test_huge_skip_saturates() {
        let source = Arc::new(Scripted::new(
            profile(ExecutionStrategy::StatefulCursor, Windowing::NativeLimitOnly),
            5,
        ));
        let pager = Pager::new(source.clone(), query(u64::MAX, 1), 2).unwrap();
        assert!(ids(EntityStream::new(pager)).is_empty());
        assert_eq!(source.windows.lock().unwrap()[0].limit, u64::MAX);

        let source = Arc::new(Scripted::new(
            profile(ExecutionStrategy::Stateless, Windowing::Native),
            5,
        ));
        let mut pager = Pager::new(source, query(u64::MAX, 1), 2).unwrap();
        assert!(pager.next_page().unwrap().is_none());
    }

    #[test]
    fn test_rows_before_bad_row_are_delivered() {
        let mut scripted = Scripted::new(
            profile(ExecutionStrategy::StatefulCursor, Windowing::ClientSide),
            5,
        );
        scripted.bad_row = Some(1);
        let source = Arc::new(scripted);

        let stream = EntityStream::new(Pager::new(source.clone(), query(0, 0), 3).unwrap());
        let items: Vec<bool> = stream.map(|item| item.is_ok()).collect();
        assert_eq!(items, vec![true, false]);
        assert_eq!(source.calls(), 1);
    }

    #[test]
    fn test_bad_row_on_last_page_still_surfaces() {
        let mut scripted = Scripted::new(
            profile(ExecutionStrategy::StatefulCursor, Windowing::ClientSide),
            3,
        );
        scripted.bad_row = Some(2);
        let source = Arc::new(scripted);

        let mut stream = EntityStream::new(Pager::new(source, query(0, 0), 10).unwrap());
        assert!(stream.next().unwrap().is_ok());
        assert!(stream.next().unwrap().is_ok());
        assert_eq!(stream.next().unwrap().unwrap_err().code(), "QUERY_CONVERSION_FAILED");
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_bad_row_past_limit_is_not_reported() {
        let mut scripted = Scripted::new(
            profile(ExecutionStrategy::StatefulCursor, Windowing::ClientSide),
            5,
        );
        scripted.bad_row = Some(2);
        let source = Arc::new(scripted);

        let pager = Pager::new(source, query(0, 2), 10).unwrap();
        assert_eq!(ids(EntityStream::new(pager)), vec![0, 1]);
    }

    #[test]
    fn test_stateless_zero_page_size_keeps_paging() {
        let source = Arc::new(Scripted::new(
            profile(ExecutionStrategy::Stateless, Windowing::Native),
            (STATELESS_PAGE_SIZE + 5) as i64,
        ));
        let pager = Pager::new(source.clone(), query(0, 0), 0).unwrap();
        assert_eq!(ids(EntityStream::new(pager)).len() as u64, STATELESS_PAGE_SIZE + 5);

        let windows = source.windows.lock().unwrap();
        assert!(windows.iter().all(|w| w.page_size == STATELESS_PAGE_SIZE));
        assert_eq!(windows.len(), 2);
    }
}
